use numstat_common::{NumstatError, Result, SampleMode};
use std::time::Duration;

/// What a finished invocation left behind.
#[derive(Debug, Clone, Default)]
pub struct Captured {
    /// Captured stdout; empty in timing mode.
    pub stdout: Vec<u8>,
    /// Spawn-to-exit wall-clock time.
    pub elapsed: Duration,
}

/// Turns one invocation's [`Captured`] output into a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleExtractor {
    mode: SampleMode,
}

impl SampleExtractor {
    pub fn new(mode: SampleMode) -> Self {
        Self { mode }
    }

    pub fn extract(&self, task: usize, captured: &Captured) -> Result<f64> {
        match self.mode {
            SampleMode::Timing => Ok(captured.elapsed.as_secs_f64()),
            SampleMode::Parse => parse_output(task, &captured.stdout),
        }
    }
}

/// Parse a command's stdout, accepting a decimal comma (`"3,14"`).
pub fn parse_output(task: usize, stdout: &[u8]) -> Result<f64> {
    let text = String::from_utf8_lossy(stdout).replace(',', ".");
    parse_number(&text, || format!("task #{task} stdout"))
}

/// Parse one line of batch input. `line_no` is 1-based.
pub fn parse_line(line_no: usize, line: &str) -> Result<f64> {
    parse_number(line, || format!("line {line_no}"))
}

fn parse_number(text: &str, context: impl FnOnce() -> String) -> Result<f64> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(_) => Err(NumstatError::Parse {
            context: context(),
            detail: format!("non-finite value {trimmed:?}"),
        }),
        Err(e) => Err(NumstatError::Parse {
            context: context(),
            detail: format!("{e} ({trimmed:?})"),
        }),
    }
}
