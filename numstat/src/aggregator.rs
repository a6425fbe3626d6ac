use numstat_common::{Algorithm, ExecutionOutcome};
use std::io::{self, Write};
use tokio::sync::mpsc;

use crate::percentile::{PercentileReport, SampleSet};
use crate::render::{RenderMode, ReportRenderer};

/// Lifecycle of an [`Aggregator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorState {
    /// No sample yet.
    Empty,
    /// Exactly one sample; nothing to report yet.
    Accumulating,
    /// Two or more samples; a live display is refreshed on every arrival.
    Reporting,
    /// Producers are done; the final report is being written.
    Draining,
    Done,
}

/// Counts returned once the aggregator is finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateSummary {
    pub samples: usize,
    pub parse_failures: usize,
    pub process_failures: usize,
    /// Reports written to the output sink.
    pub reports: usize,
}

/// Sole owner of the sample set. Consumes outcomes one at a time, reports
/// failures to the error sink, and hands fresh reports to the renderer.
pub struct Aggregator<W: Write, E: Write> {
    samples: SampleSet,
    algorithm: Algorithm,
    renderer: ReportRenderer<W>,
    errors: E,
    state: AggregatorState,
    summary: AggregateSummary,
}

impl<W: Write, E: Write> Aggregator<W, E> {
    pub fn new(algorithm: Algorithm, renderer: ReportRenderer<W>, errors: E) -> Self {
        Self {
            samples: SampleSet::new(),
            algorithm,
            renderer,
            errors,
            state: AggregatorState::Empty,
            summary: AggregateSummary::default(),
        }
    }

    pub fn state(&self) -> AggregatorState {
        self.state
    }

    pub fn samples(&self) -> &SampleSet {
        &self.samples
    }

    /// Report over the current samples, if there are any.
    pub fn snapshot(&self) -> Option<PercentileReport> {
        if self.samples.is_empty() {
            return None;
        }
        Some(PercentileReport::compute(&self.samples, self.algorithm))
    }

    /// Process one outcome. Errors come only from writing to the sinks.
    pub fn accept(&mut self, outcome: ExecutionOutcome) -> io::Result<()> {
        match outcome {
            ExecutionOutcome::Sample(value) => {
                self.samples.insert(value);
                self.summary.samples += 1;
                if self.samples.len() >= 2 {
                    self.state = AggregatorState::Reporting;
                    if self.renderer.mode() == RenderMode::Live {
                        self.write_report()?;
                    }
                } else {
                    self.state = AggregatorState::Accumulating;
                }
            }
            ExecutionOutcome::ParseFailure(failure) => {
                self.summary.parse_failures += 1;
                writeln!(self.errors, "number conversion error: {}", failure.detail)?;
            }
            ExecutionOutcome::ProcessFailure(failure) => {
                self.summary.process_failures += 1;
                writeln!(self.errors, "process error: task #{}: {}", failure.task, failure.detail)?;
            }
        }
        Ok(())
    }

    /// Drain `rx` until every sender is gone.
    pub async fn consume(&mut self, rx: &mut mpsc::Receiver<ExecutionOutcome>) -> io::Result<()> {
        while let Some(outcome) = rx.recv().await {
            self.accept(outcome)?;
        }
        self.state = AggregatorState::Draining;
        Ok(())
    }

    /// Write the final report if none is on screen yet and stop.
    pub fn finish(&mut self) -> io::Result<AggregateSummary> {
        self.state = AggregatorState::Draining;
        if self.summary.reports == 0 && !self.samples.is_empty() {
            self.write_report()?;
        }
        self.errors.flush()?;
        self.state = AggregatorState::Done;
        tracing::debug!(summary = ?self.summary, "aggregator done");
        Ok(self.summary)
    }

    fn write_report(&mut self) -> io::Result<()> {
        let report = PercentileReport::compute(&self.samples, self.algorithm);
        self.renderer.render(&report)?;
        self.summary.reports += 1;
        Ok(())
    }
}
