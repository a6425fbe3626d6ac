use numstat_common::{Algorithm, NumstatError, Result, SampleMode};

/// Significant digits used for report values unless overridden.
pub const DEFAULT_PRECISION: usize = 16;

/// Upper bound on `precision`; 17 digits round-trip any `f64`.
pub const MAX_PRECISION: usize = 17;

pub const DEFAULT_PARALLELISM: usize = 1;

/// Settings for one run, in either mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Invocations to launch. Ignored in batch mode.
    pub count: usize,
    /// Maximum invocations in flight at once.
    pub parallelism: usize,
    pub algorithm: Algorithm,
    pub precision: usize,
    pub mode: SampleMode,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            count: 1,
            parallelism: DEFAULT_PARALLELISM,
            algorithm: Algorithm::default(),
            precision: DEFAULT_PRECISION,
            mode: SampleMode::default(),
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(NumstatError::Config("count must be at least 1".to_string()));
        }
        if self.parallelism == 0 {
            return Err(NumstatError::Config("parallelism must be at least 1".to_string()));
        }
        if !(1..=MAX_PRECISION).contains(&self.precision) {
            return Err(NumstatError::Config(format!(
                "precision must be between 1 and {MAX_PRECISION}, got {}",
                self.precision
            )));
        }
        Ok(())
    }
}
