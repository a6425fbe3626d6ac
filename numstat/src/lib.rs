pub mod aggregator;
pub mod config;
pub mod extract;
pub mod input;
pub mod orchestrator;
pub mod percentile;
pub mod render;
pub mod runner;

pub use aggregator::{AggregateSummary, Aggregator, AggregatorState};
pub use config::RunConfig;
pub use orchestrator::{run_batch, run_repeat, CommandLine, RunSummary};
pub use percentile::{PercentileReport, SampleSet};
pub use render::{RenderMode, ReportRenderer};
pub use runner::{CommandRunner, ExecutionTask, Launcher, ProcessLauncher, RunnerReport};

pub const APP_NAME: &str = "numstat";

/// `numstat v<version>, build <commit>`. The commit is taken from
/// `NUMSTAT_GIT_COMMIT` at build time.
pub fn version_line() -> String {
    format!(
        "{APP_NAME} v{}, build {}",
        env!("CARGO_PKG_VERSION"),
        option_env!("NUMSTAT_GIT_COMMIT").unwrap_or("unknown")
    )
}
