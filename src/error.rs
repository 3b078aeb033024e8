//! Error taxonomy for a run.
//!
//! Pre-dispatch errors (`SourceRead`, `EmptyResult`, `InvalidPattern`, `Staging`, `Config`) stop the run.
//! `ProcessInvocation` is per-chunk and never aborts siblings. `MergeWrite`, `MergeStrategy` and
//! `StatsWrite` end only their own output phase.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("cannot read input source {path}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no chunks produced from {0} (empty input or boundary pattern matched no lines)")]
    EmptyResult(PathBuf),

    #[error("invalid boundary pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("cannot stage chunk {ordinal} in {dir}: {source}")]
    Staging {
        ordinal: usize,
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("chunk {ordinal}: failed to run {program}: {source}")]
    ProcessInvocation {
        ordinal: usize,
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write merged output to {path}: {source}")]
    MergeWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{strategy} merge failed: {reason}")]
    MergeStrategy {
        strategy: &'static str,
        reason: String,
    },

    #[error("cannot write stats to {path}: {source}")]
    StatsWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RunError {
    /// True for errors that stop the run before any worker starts.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RunError::SourceRead { .. }
                | RunError::EmptyResult(_)
                | RunError::InvalidPattern(_)
                | RunError::Staging { .. }
                | RunError::Config(_)
        )
    }
}
