use crossterm::{
    cursor::MoveUp,
    queue,
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};

use crate::percentile::PercentileReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Overwrite the previous report in place after every update.
    Live,
    /// Write a single report once all samples are in.
    Batch,
}

/// Writes percentile reports to a sink, tracking how many lines the last
/// report occupied so a live display can erase exactly that many.
pub struct ReportRenderer<W: Write> {
    out: W,
    mode: RenderMode,
    precision: usize,
    last_lines: usize,
}

impl<W: Write> ReportRenderer<W> {
    pub fn new(out: W, mode: RenderMode, precision: usize) -> Self {
        Self { out, mode, precision, last_lines: 0 }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Lines written by the most recent [`render`](Self::render).
    pub fn last_lines(&self) -> usize {
        self.last_lines
    }

    /// Write `report`, erasing the previous one first in live mode.
    /// Returns the number of lines written.
    pub fn render(&mut self, report: &PercentileReport) -> io::Result<usize> {
        if self.mode == RenderMode::Live {
            for _ in 0..self.last_lines {
                queue!(self.out, MoveUp(1), Clear(ClearType::CurrentLine))?;
            }
        }

        let lines = report.to_lines(self.precision);
        for line in &lines {
            self.out.write_all(line.as_bytes())?;
        }
        self.out.flush()?;

        self.last_lines = lines.len();
        Ok(self.last_lines)
    }
}
