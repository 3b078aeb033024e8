//! Stats reporter: per-worker and per-chunk tables as delimited text.

use log::debug;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use crate::WorkerStats;
use crate::chunk::Chunk;
use crate::error::RunError;
use crate::utils::config::StatsFormat;

/// Worker table, a blank line, then the chunk table (split order).
pub fn format_stats(workers: &[WorkerStats], chunks: &[Arc<Chunk>]) -> String {
    let d = StatsFormat::DELIMITER;
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "{}", StatsFormat::WORKER_HEADER);
    for w in workers {
        let _ = writeln!(out, "{}{d}{}{d}{}{d}{}", w.id, w.busy_ms, w.processed, w.avg_ms());
    }
    out.push('\n');
    let _ = writeln!(out, "{}", StatsFormat::CHUNK_HEADER);
    for c in chunks {
        let _ = writeln!(out, "{}{d}{}{d}{}", c.id(), c.len(), c.runtime_ms());
    }
    out
}

/// Format and write the stats file.
pub fn write_stats(path: &Path, workers: &[WorkerStats], chunks: &[Arc<Chunk>]) -> Result<(), RunError> {
    let text = format_stats(workers, chunks);
    debug!("Stats:\n{}", text);
    std::fs::write(path, text).map_err(|source| RunError::StatsWrite {
        path: path.to_path_buf(),
        source,
    })
}
