//! WorkerPool: fixed set of worker threads draining one dispatch queue, joined at a barrier.

use log::{debug, error};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::engine::command::Invocation;
use crate::engine::progress::ProgressBar;
use crate::pipeline::queue::DispatchQueue;
use crate::pipeline::worker::{Worker, WorkerOutcome};
use crate::utils::logger::WORKER_THREAD_PREFIX;
use crate::{ChunkFailure, WorkerStats};

/// Aggregate result of one pool run.
#[derive(Debug, Default)]
pub struct PoolOutcome {
    /// One entry per worker, ordered by worker id.
    pub workers: Vec<WorkerStats>,
    /// Invocation failures across all workers, ordered by chunk ordinal.
    pub failures: Vec<ChunkFailure>,
}

impl PoolOutcome {
    pub fn processed(&self) -> usize {
        self.workers.iter().map(|w| w.processed).sum()
    }
}

pub struct WorkerPool {
    threads: usize,
    invocation: Arc<Invocation>,
    progress: Option<ProgressBar>,
}

impl WorkerPool {
    pub fn new(threads: usize, invocation: Invocation) -> Self {
        WorkerPool {
            threads: threads.max(1),
            invocation: Arc::new(invocation),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Option<ProgressBar>) -> Self {
        self.progress = progress;
        self
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Start every worker on `queue` and block until all have exited their loops.
    pub fn run(&self, queue: DispatchQueue) -> PoolOutcome {
        debug!(
            "Starting {} workers on {} chunks",
            self.threads,
            queue.remaining()
        );
        let handles: Vec<(usize, JoinHandle<WorkerOutcome>)> = (0..self.threads)
            .filter_map(|id| {
                let worker = Worker::new(id, queue.clone(), Arc::clone(&self.invocation))
                    .with_progress(self.progress.clone());
                thread::Builder::new()
                    .name(format!("{WORKER_THREAD_PREFIX}{id}"))
                    .spawn(move || worker.run())
                    .map(|h| (id, h))
                    .map_err(|e| error!("could not start worker {}: {}", id, e))
                    .ok()
            })
            .collect();

        let mut outcomes: Vec<WorkerOutcome> = Vec::with_capacity(self.threads);
        let started: Vec<usize> = handles.iter().map(|(id, _)| *id).collect();
        for (id, handle) in handles {
            match handle.join() {
                Ok(outcome) => outcomes.push(outcome),
                Err(_) => {
                    error!("worker {} panicked", id);
                    outcomes.push(WorkerOutcome {
                        stats: WorkerStats {
                            id,
                            ..Default::default()
                        },
                        failures: Vec::new(),
                    });
                }
            }
        }

        // No thread could be spawned: drain on the calling thread so the run still completes.
        if started.is_empty() {
            error!("no worker threads started; running chunks on the calling thread");
            let worker = Worker::new(0, queue, Arc::clone(&self.invocation))
                .with_progress(self.progress.clone());
            outcomes.push(worker.run());
        }

        let mut failures: Vec<ChunkFailure> = outcomes
            .iter_mut()
            .flat_map(|o| o.failures.drain(..))
            .collect();
        failures.sort_by_key(|f| f.ordinal);
        let mut workers: Vec<WorkerStats> = outcomes.into_iter().map(|o| o.stats).collect();
        workers.sort_by_key(|w| w.id);
        PoolOutcome { workers, failures }
    }
}
