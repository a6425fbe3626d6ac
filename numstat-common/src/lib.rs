use thiserror::Error;

/// Percentile ranks every report enumerates, in ascending order.
pub const RANKS: [u32; 9] = [50, 66, 75, 80, 90, 95, 98, 99, 100];

/// Error types for numstat operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NumstatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("number conversion error: {context}: {detail}")]
    Parse { context: String, detail: String },

    #[error("process error: task #{task}: {detail}")]
    Process { task: usize, detail: String },

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for NumstatError {
    fn from(err: std::io::Error) -> Self {
        NumstatError::Io(err.to_string())
    }
}

/// Result type for numstat operations
pub type Result<T> = std::result::Result<T, NumstatError>;

/// Percentile algorithm used to build a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// Picks an existing sample at `floor(l * n / 100) - 1`.
    Simple,
    /// Blends the two samples adjacent to the fractional rank `n / 100 * (l - 1)`.
    #[default]
    LinearInterpolation,
}

impl Algorithm {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "simple" => Some(Algorithm::Simple),
            "linear-interpolation" => Some(Algorithm::LinearInterpolation),
            _ => None,
        }
    }

    pub fn as_name(&self) -> &'static str {
        match self {
            Algorithm::Simple => "simple",
            Algorithm::LinearInterpolation => "linear-interpolation",
        }
    }
}

/// How one command invocation is turned into a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleMode {
    /// Wall-clock seconds between spawn and exit.
    #[default]
    Timing,
    /// Number printed on the command's stdout.
    Parse,
}

/// Context attached to a failed invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFailure {
    /// Zero-based invocation index.
    pub task: usize,
    pub detail: String,
}

/// Result of one invocation, delivered once to the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Sample(f64),
    ParseFailure(TaskFailure),
    ProcessFailure(TaskFailure),
}

impl ExecutionOutcome {
    /// Map a task-local error onto the matching failure variant.
    pub fn from_error(task: usize, err: NumstatError) -> Self {
        match err {
            NumstatError::Parse { context, detail } => ExecutionOutcome::ParseFailure(TaskFailure {
                task,
                detail: format!("{context}: {detail}"),
            }),
            NumstatError::Process { detail, .. } | NumstatError::Io(detail) | NumstatError::Config(detail) => {
                ExecutionOutcome::ProcessFailure(TaskFailure { task, detail })
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, ExecutionOutcome::Sample(_))
    }
}
