//! Pipeline components: split, dispatch queue, workers, pool, merge.

pub mod merge;
pub mod pool;
pub mod queue;
pub mod split;
pub mod worker;

pub use merge::Merger;
pub use pool::{PoolOutcome, WorkerPool};
pub use queue::DispatchQueue;
pub use split::{ChunkList, Splitter, compile_boundary};
pub use worker::{Worker, WorkerOutcome};
