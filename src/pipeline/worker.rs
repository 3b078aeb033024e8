//! Worker: takes chunks off the shared queue and runs the external program on each, one at a time.

use log::{debug, warn};
use std::process::Output;
use std::sync::Arc;
use std::time::Instant;

use crate::chunk::Chunk;
use crate::engine::command::Invocation;
use crate::engine::progress::{ProgressBar, update_progress_bar};
use crate::error::RunError;
use crate::pipeline::queue::DispatchQueue;
use crate::{ChunkFailure, WorkerStats};

/// Stats plus the chunks this worker could not run.
#[derive(Debug, Default)]
pub struct WorkerOutcome {
    pub stats: WorkerStats,
    pub failures: Vec<ChunkFailure>,
}

pub struct Worker {
    id: usize,
    queue: DispatchQueue,
    invocation: Arc<Invocation>,
    progress: Option<ProgressBar>,
    outcome: WorkerOutcome,
}

impl Worker {
    pub fn new(id: usize, queue: DispatchQueue, invocation: Arc<Invocation>) -> Self {
        Worker {
            id,
            queue,
            invocation,
            progress: None,
            outcome: WorkerOutcome {
                stats: WorkerStats {
                    id,
                    ..Default::default()
                },
                failures: Vec::new(),
            },
        }
    }

    pub fn with_progress(mut self, progress: Option<ProgressBar>) -> Self {
        self.progress = progress;
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Drain the queue. A failed chunk is logged and recorded; the loop moves on to the next one.
    pub fn run(mut self) -> WorkerOutcome {
        while let Some(chunk) = self.queue.take() {
            let start = Instant::now();
            let result = self.process(&chunk);
            let elapsed_ms = start.elapsed().as_millis() as u64;

            chunk.record_runtime(elapsed_ms);
            self.outcome.stats.busy_ms += elapsed_ms;
            self.outcome.stats.processed += 1;

            match result {
                Ok(()) => debug!(
                    "worker {}: finished chunk {} ({}) in {} ms",
                    self.id,
                    chunk.ordinal(),
                    chunk.id(),
                    elapsed_ms
                ),
                Err(e) => {
                    warn!("worker {}: {}", self.id, e);
                    self.outcome.failures.push(ChunkFailure {
                        ordinal: chunk.ordinal(),
                        id: chunk.id().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
            if let Some(bar) = &self.progress {
                update_progress_bar(bar, 1);
            }
        }
        debug!(
            "worker {}: queue exhausted after {} chunks",
            self.id, self.outcome.stats.processed
        );
        self.outcome
    }

    /// Create the output artifact, build the command line and block until the child exits.
    fn process(&self, chunk: &Chunk) -> Result<(), RunError> {
        let invocation_err = |source| RunError::ProcessInvocation {
            ordinal: chunk.ordinal(),
            program: self.invocation.program.clone(),
            source,
        };
        chunk
            .create_output(self.invocation.output_kind)
            .map_err(invocation_err)?;
        let mut cmd = self.invocation.command_for(chunk).map_err(invocation_err)?;
        debug!(
            "worker {}: starting chunk {}: {}",
            self.id,
            chunk.ordinal(),
            self.invocation
                .display_for(&chunk.in_path(), &chunk.out_path())
        );
        let output = cmd.output().map_err(invocation_err)?;
        self.log_child_output(chunk, &output);
        Ok(())
    }

    /// Log the child's captured stdout/stderr as one stream. Exit status is reported, not enforced.
    fn log_child_output(&self, chunk: &Chunk, output: &Output) {
        let combined: Vec<u8> = output
            .stdout
            .iter()
            .chain(output.stderr.iter())
            .copied()
            .collect();
        if !combined.is_empty() {
            debug!(
                "chunk {} output:\n{}",
                chunk.ordinal(),
                String::from_utf8_lossy(&combined).trim_end()
            );
        }
        if !output.status.success() {
            warn!(
                "chunk {} ({}): {} exited with {}",
                chunk.ordinal(),
                chunk.id(),
                self.invocation.program.display(),
                output.status
            );
        }
    }
}
