//! Dispatch queue shared by the workers.
//!
//! Filled once, single-threaded, then closed before any worker starts. `take` is an atomic
//! take-or-exhausted: a closed, drained channel reports exhaustion, so there is no
//! check-then-poll race between workers.

use crossbeam_channel::{Receiver, unbounded};
use std::sync::Arc;

use crate::chunk::Chunk;

#[derive(Clone, Debug)]
pub struct DispatchQueue {
    rx: Receiver<Arc<Chunk>>,
}

impl DispatchQueue {
    /// Queue every chunk in `chunks` and close the queue for insertion.
    /// Dequeue order carries no meaning for merge; the split-order list stays the ordering source.
    pub fn from_chunks(chunks: &[Arc<Chunk>]) -> Self {
        let (tx, rx) = unbounded();
        for chunk in chunks {
            // rx is alive in this scope, so send cannot fail.
            let _ = tx.send(Arc::clone(chunk));
        }
        // Dropping the only sender closes the channel so `take` signals exhaustion once drained.
        drop(tx);
        DispatchQueue { rx }
    }

    /// Next chunk, or None when the queue is exhausted.
    pub fn take(&self) -> Option<Arc<Chunk>> {
        self.rx.recv().ok()
    }

    /// Chunks not yet taken.
    pub fn remaining(&self) -> usize {
        self.rx.len()
    }
}
