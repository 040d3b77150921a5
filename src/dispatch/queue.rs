//! Thunk queue shared between the worker thread and the UI thread

use parking_lot::Mutex;
use std::collections::VecDeque;

/// A zero-argument deferred call.
pub type Thunk = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct Pending {
    thunks: VecDeque<Thunk>,
    closed: bool,
}

/// Unbounded FIFO of pending thunks.
///
/// Producers push from any thread; the UI thread pops. The lock is only held
/// for the push or pop itself, never while a thunk runs. Once closed, the
/// queue rejects new thunks so nobody can wait on a call that will never run.
#[derive(Default)]
pub struct ThunkQueue {
    pending: Mutex<Pending>,
}

impl ThunkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a thunk, handing it back if the queue has been closed.
    pub fn enqueue(&self, thunk: Thunk) -> Result<(), Thunk> {
        let mut pending = self.pending.lock();
        if pending.closed {
            return Err(thunk);
        }
        pending.thunks.push_back(thunk);
        Ok(())
    }

    pub fn dequeue(&self) -> Option<Thunk> {
        self.pending.lock().thunks.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().thunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().thunks.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.pending.lock().closed
    }

    /// Reject further thunks and drop the pending ones without running them.
    ///
    /// Returns how many were discarded.
    pub fn close(&self) -> usize {
        let discarded: Vec<Thunk> = {
            let mut pending = self.pending.lock();
            pending.closed = true;
            pending.thunks.drain(..).collect()
        };
        // Dropped outside the lock: captured state may touch the queue on drop.
        discarded.len()
    }
}
