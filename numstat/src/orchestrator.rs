use numstat_common::{ExecutionOutcome, NumstatError, Result};
use std::io::{BufRead, Write};
use tokio::sync::mpsc;

use crate::aggregator::{AggregateSummary, Aggregator};
use crate::config::RunConfig;
use crate::extract::{parse_line, SampleExtractor};
use crate::render::{RenderMode, ReportRenderer};
use crate::runner::{CommandRunner, ExecutionTask, Launcher, RunnerReport};

/// The command to repeat, as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
    pub forward_stdin: bool,
}

impl CommandLine {
    /// Split `argv` into program and arguments. `None` if `argv` is empty.
    pub fn from_argv(argv: &[String], forward_stdin: bool) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self { program: program.clone(), args: args.to_vec(), forward_stdin })
    }

    fn task(&self, index: usize) -> ExecutionTask {
        ExecutionTask {
            index,
            program: self.program.clone(),
            args: self.args.clone(),
            forward_stdin: self.forward_stdin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub aggregate: AggregateSummary,
    /// Present in repeat mode only.
    pub runner: Option<RunnerReport>,
}

impl RunSummary {
    /// 0 when at least one sample was collected, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.aggregate.samples > 0 {
            0
        } else {
            1
        }
    }
}

/// Run `command` `config.count` times and report on the collected samples.
///
/// Configuration is checked before anything is launched. Failed invocations
/// are written to `errors` and do not stop the run.
pub async fn run_repeat<L, W, E>(
    config: &RunConfig,
    command: &CommandLine,
    launcher: L,
    out: W,
    render_mode: RenderMode,
    errors: E,
) -> Result<RunSummary>
where
    L: Launcher,
    W: Write,
    E: Write,
{
    config.validate()?;
    if command.program.is_empty() {
        return Err(NumstatError::Config("missing command".to_string()));
    }

    tracing::info!(
        program = %command.program,
        count = config.count,
        parallelism = config.parallelism,
        algorithm = config.algorithm.as_name(),
        mode = ?config.mode,
        "starting run"
    );

    let (tx, mut rx) = mpsc::channel::<ExecutionOutcome>(config.parallelism);
    let runner = CommandRunner::new(config.parallelism, launcher, SampleExtractor::new(config.mode));
    let template = command.clone();
    let producer = tokio::spawn(runner.run(config.count, move |index| template.task(index), tx));

    let renderer = ReportRenderer::new(out, render_mode, config.precision);
    let mut aggregator = Aggregator::new(config.algorithm, renderer, errors);
    let consumed = aggregator.consume(&mut rx).await;
    // Closing the receiver unblocks producers if the aggregator bailed early.
    drop(rx);

    let runner_report = producer
        .await
        .map_err(|e| NumstatError::Io(format!("runner task failed: {e}")))?;
    consumed?;
    let aggregate = aggregator.finish()?;

    tracing::info!(
        samples = aggregate.samples,
        parse_failures = aggregate.parse_failures,
        process_failures = aggregate.process_failures,
        "run finished"
    );
    Ok(RunSummary { aggregate, runner: Some(runner_report) })
}

/// Read one number per line from `input` and write a single final report.
/// Malformed lines, blank ones included, are reported and skipped.
pub fn run_batch<R, W, E>(config: &RunConfig, input: R, out: W, errors: E) -> Result<RunSummary>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    config.validate()?;

    let renderer = ReportRenderer::new(out, RenderMode::Batch, config.precision);
    let mut aggregator = Aggregator::new(config.algorithm, renderer, errors);

    for (idx, line) in input.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let outcome = match parse_line(line_no, &line) {
            Ok(value) => ExecutionOutcome::Sample(value),
            Err(e) => ExecutionOutcome::from_error(line_no, e),
        };
        aggregator.accept(outcome)?;
    }

    let aggregate = aggregator.finish()?;
    Ok(RunSummary { aggregate, runner: None })
}
