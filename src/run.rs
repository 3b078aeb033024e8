//! Run orchestration: split → dispatch → barrier → merge → stats → cleanup.

use log::{debug, error, info, warn};
use std::sync::Arc;

use crate::chunk::Chunk;
use crate::engine::command::Invocation;
use crate::engine::progress::{chunk_progress, finish_progress_bar};
use crate::error::RunError;
use crate::pipeline::{DispatchQueue, Merger, Splitter, WorkerPool};
use crate::stats::write_stats;
use crate::utils::fd_limit::warn_if_over_fd_limit;
use crate::utils::tempfiles::cleanup_staging;
use crate::{ChunkFailure, RunConfig, RunReport};

/// Run the whole job described by `config`.
///
/// Fails only on pre-dispatch errors (unreadable source, zero chunks, bad pattern, staging,
/// invalid config). Per-chunk failures and merge/stats failures are logged and reported in the
/// returned [`RunReport`].
pub fn run(config: &RunConfig) -> Result<RunReport, RunError> {
    config.validate()?;
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        config
    );
    warn_if_over_fd_limit(config.workers);

    let splitter = Splitter::from_config(config);
    let chunks = splitter.split(&config.input)?;
    info!(
        "Split {} into {} chunks; running on {} workers",
        config.input.path().display(),
        chunks.len(),
        config.workers
    );

    let report = process_chunks(config, &chunks);

    if config.keep_staging {
        info!("Staging directories kept in {}", splitter.staging_root().display());
    } else {
        let failed = cleanup_staging(&chunks, splitter.staging_root());
        if failed > 0 {
            warn!("{} staging directories could not be removed", failed);
        }
    }
    log_failure_summary(&report);
    Ok(report)
}

/// Dispatch already-split `chunks` through the pool, then merge and write stats.
/// Does not clean up staging directories.
pub fn process_chunks(config: &RunConfig, chunks: &[Arc<Chunk>]) -> RunReport {
    let queue = DispatchQueue::from_chunks(chunks);
    let bar = chunk_progress(config.verbose, chunks.len());
    let pool = WorkerPool::new(config.workers, Invocation::from(config)).with_progress(bar.clone());
    let outcome = pool.run(queue);
    if let Some(bar) = &bar {
        finish_progress_bar(bar, outcome.processed());
    }

    let mut failures = outcome.failures;
    let merged = match Merger::from_config(config).merge(chunks, &config.output) {
        Ok(missing) => {
            add_failures(&mut failures, missing);
            info!("Merged output written to {}", config.output.display());
            Some(config.output.clone())
        }
        Err(e) => {
            error!("{}", e);
            None
        }
    };

    let stats = config.stats.as_ref().and_then(|path| {
        match write_stats(path, &outcome.workers, chunks) {
            Ok(()) => Some(path.clone()),
            Err(e) => {
                error!("{}", e);
                None
            }
        }
    });

    RunReport {
        chunk_count: chunks.len(),
        workers: outcome.workers,
        failures,
        merged,
        stats,
    }
}

/// Add `more` to `failures`, one entry per chunk, kept in split order.
fn add_failures(failures: &mut Vec<ChunkFailure>, more: Vec<ChunkFailure>) {
    for f in more {
        if !failures.iter().any(|known| known.ordinal == f.ordinal) {
            failures.push(f);
        }
    }
    failures.sort_by_key(|f| f.ordinal);
}

/// Make per-chunk failures visible at the end of the run.
fn log_failure_summary(report: &RunReport) {
    if report.failures.is_empty() {
        return;
    }
    warn!(
        "{} of {} chunks may be missing from the merged output:",
        report.failures.len(),
        report.chunk_count
    );
    for f in &report.failures {
        warn!("  chunk {} ({}): {}", f.ordinal, f.id, f.reason);
    }
}
