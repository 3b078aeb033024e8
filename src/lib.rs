//! Splitrun: parallelize a line-oriented command-line tool without modifying it.
//!
//! Input is split into ordered chunks, each staged in its own directory; a fixed pool of worker
//! threads runs the external program on one chunk at a time; once every worker has finished the
//! outputs are merged back in original split order.

pub mod chunk;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod run;
pub mod stats;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use chunk::Chunk;
pub use error::RunError;
pub use run::{process_chunks, run};

/// Result alias used by the public splitrun API
pub type Result<T> = std::result::Result<T, RunError>;
