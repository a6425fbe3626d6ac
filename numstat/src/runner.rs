use async_trait::async_trait;
use numstat_common::{ExecutionOutcome, NumstatError, Result, SampleMode};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::extract::{Captured, SampleExtractor};

/// One scheduled invocation. Built by the task factory, consumed by the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionTask {
    /// Zero-based invocation index, used in error reports.
    pub index: usize,
    pub program: String,
    pub args: Vec<String>,
    /// Hand this process's stdin to the child. Concurrent children share the
    /// same descriptor, so which child reads which bytes is unspecified.
    pub forward_stdin: bool,
}

/// Starts an [`ExecutionTask`] and waits for it to exit.
#[async_trait]
pub trait Launcher: Send + Sync + 'static {
    async fn launch(&self, task: &ExecutionTask) -> Result<Captured>;
}

/// Production launcher backed by `tokio::process`.
#[derive(Debug, Clone, Copy)]
pub struct ProcessLauncher {
    capture_stdout: bool,
}

impl ProcessLauncher {
    /// Stdout is captured only when samples are parsed from it.
    pub fn new(mode: SampleMode) -> Self {
        Self { capture_stdout: mode == SampleMode::Parse }
    }
}

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn launch(&self, task: &ExecutionTask) -> Result<Captured> {
        let process_error = |detail: String| NumstatError::Process { task: task.index, detail };

        let mut cmd = Command::new(&task.program);
        cmd.args(&task.args)
            .stdin(if task.forward_stdin { Stdio::inherit() } else { Stdio::null() })
            .stdout(if self.capture_stdout { Stdio::piped() } else { Stdio::null() })
            .stderr(Stdio::inherit());

        let start = Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| process_error(format!("failed to spawn {:?}: {e}", task.program)))?;

        let mut stdout = Vec::new();
        if let Some(mut pipe) = child.stdout.take() {
            pipe.read_to_end(&mut stdout)
                .await
                .map_err(|e| process_error(format!("failed to read stdout: {e}")))?;
        }
        let status = child
            .wait()
            .await
            .map_err(|e| process_error(format!("failed to wait for child: {e}")))?;
        let elapsed = start.elapsed();

        if !status.success() {
            return Err(process_error(format!("{:?} exited with {status}", task.program)));
        }
        Ok(Captured { stdout, elapsed })
    }
}

/// How the runner's tasks ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunnerReport {
    /// Tasks whose outcome reached the consumer.
    pub completed: usize,
    /// Tasks that panicked or found the consumer gone.
    pub aborted: usize,
}

/// Launches a fixed number of invocations, at most `parallelism` at a time,
/// and sends every outcome to a single consumer.
pub struct CommandRunner<L: Launcher> {
    parallelism: usize,
    launcher: Arc<L>,
    extractor: SampleExtractor,
}

impl<L: Launcher> CommandRunner<L> {
    /// `parallelism` is clamped to at least 1.
    pub fn new(parallelism: usize, launcher: L, extractor: SampleExtractor) -> Self {
        Self {
            parallelism: parallelism.max(1),
            launcher: Arc::new(launcher),
            extractor,
        }
    }

    /// Run `count` tasks built by `factory`. Returns once every task has
    /// finished; `tx` is dropped on return, which closes the channel.
    pub async fn run<F>(self, count: usize, factory: F, tx: mpsc::Sender<ExecutionOutcome>) -> RunnerReport
    where
        F: Fn(usize) -> ExecutionTask + Send,
    {
        let gate = Arc::new(Semaphore::new(self.parallelism));
        let mut set: JoinSet<bool> = JoinSet::new();
        let mut report = RunnerReport::default();

        for index in 0..count {
            // The gate is never closed, so acquire only fails if that changes.
            let Ok(permit) = Arc::clone(&gate).acquire_owned().await else {
                tracing::warn!(task = index, "admission gate closed; stopping submission");
                break;
            };

            while let Some(joined) = set.try_join_next() {
                tally(&mut report, joined);
            }

            let task = factory(index);
            let launcher = Arc::clone(&self.launcher);
            let extractor = self.extractor;
            let tx = tx.clone();

            set.spawn(async move {
                tracing::debug!(task = task.index, program = %task.program, "launching");
                let outcome = match launcher.launch(&task).await {
                    Ok(captured) => match extractor.extract(task.index, &captured) {
                        Ok(value) => ExecutionOutcome::Sample(value),
                        Err(e) => ExecutionOutcome::from_error(task.index, e),
                    },
                    Err(e) => ExecutionOutcome::from_error(task.index, e),
                };
                tracing::debug!(task = task.index, failed = outcome.is_failure(), "finished");
                // The slot stays taken until the consumer has room for the outcome.
                let delivered = tx.send(outcome).await.is_ok();
                drop(permit);
                delivered
            });
        }
        drop(tx);

        while let Some(joined) = set.join_next().await {
            tally(&mut report, joined);
        }
        report
    }
}

fn tally(report: &mut RunnerReport, joined: std::result::Result<bool, tokio::task::JoinError>) {
    match joined {
        Ok(true) => report.completed += 1,
        Ok(false) => {
            tracing::warn!("outcome dropped: consumer is gone");
            report.aborted += 1;
        }
        Err(e) => {
            tracing::warn!(error = %e, "task aborted");
            report.aborted += 1;
        }
    }
}
