//! Marshaling calls onto the UI thread
//!
//! A [`Dispatcher`] is created on the thread that will own the widgets and
//! run the event loop. Clones can be handed to any other thread; they all
//! feed the same [`ThunkQueue`], which the UI thread drains whenever its
//! [`Wake`] signal fires.

use super::queue::{Thunk, ThunkQueue};
use crate::error::{panic_message, GuiError, Result};
use crate::thread::ThreadRole;
use log::{error, trace, warn};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

/// Signal that tells the UI thread's event loop to drain the queue.
pub trait Wake: Send + Sync {
    fn wake(&self);
}

impl Wake for calloop::ping::Ping {
    fn wake(&self) {
        self.ping();
    }
}

/// For callers that drain the queue by hand.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoWake;

impl Wake for NoWake {
    fn wake(&self) {}
}

struct Shared {
    queue: ThunkQueue,
    ui_thread: ThreadId,
    worker_thread: OnceLock<ThreadId>,
    waker: Box<dyn Wake>,
}

/// Handle to the UI thread's dispatch queue.
#[derive(Clone)]
pub struct Dispatcher {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("ui_thread", &self.shared.ui_thread)
            .field("worker_thread", &self.shared.worker_thread.get())
            .field("pending", &self.shared.queue.len())
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher whose UI thread is the calling thread.
    pub fn new<W: Wake + 'static>(waker: W) -> Self {
        Self {
            shared: Arc::new(Shared {
                queue: ThunkQueue::new(),
                ui_thread: thread::current().id(),
                worker_thread: OnceLock::new(),
                waker: Box::new(waker),
            }),
        }
    }

    pub fn ui_thread(&self) -> ThreadId {
        self.shared.ui_thread
    }

    pub fn worker_thread(&self) -> Option<ThreadId> {
        self.shared.worker_thread.get().copied()
    }

    /// Record the worker thread's identity. Only the first call succeeds.
    pub fn register_worker_thread(&self, id: ThreadId) -> Result<()> {
        self.shared
            .worker_thread
            .set(id)
            .map_err(|_| GuiError::WorkerAlreadyStarted)
    }

    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.shared.ui_thread
    }

    pub fn is_worker_thread(&self) -> bool {
        self.worker_thread() == Some(thread::current().id())
    }

    pub fn current_role(&self) -> ThreadRole {
        if self.is_ui_thread() {
            ThreadRole::Ui
        } else if self.is_worker_thread() {
            ThreadRole::Worker
        } else {
            ThreadRole::Other
        }
    }

    /// Fail with [`GuiError::WrongThread`] unless called on the UI thread.
    pub fn ensure_ui_thread(&self, operation: &str) -> Result<()> {
        let actual = thread::current().id();
        if actual == self.shared.ui_thread {
            return Ok(());
        }
        error!(
            "{} called from {:?} ({:?}) instead of the UI thread",
            operation,
            thread::current().name().unwrap_or("<unnamed>"),
            actual
        );
        Err(GuiError::WrongThread {
            operation: operation.to_string(),
            expected: self.shared.ui_thread,
            actual,
        })
    }

    /// Queue `f` for the UI thread and return immediately.
    ///
    /// Returns false if the UI thread has shut the queue down; `f` is dropped.
    pub fn submit_async<F>(&self, f: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        match self.shared.queue.enqueue(Box::new(f)) {
            Ok(()) => {
                trace!("Queued async call ({} pending)", self.shared.queue.len());
                self.shared.waker.wake();
                true
            }
            Err(_rejected) => {
                warn!("Dropping async call: dispatch queue is closed");
                false
            }
        }
    }

    /// Run `f` on the UI thread and wait for its result.
    ///
    /// On the UI thread itself `f` runs inline, since waiting on our own queue
    /// would never return.
    pub fn submit_sync<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_ui_thread() {
            return panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
                let message = panic_message(payload.as_ref());
                error!("Inline UI call panicked: {}", message);
                GuiError::ThunkPanicked(message)
            });
        }

        let (done_tx, done_rx) = crossbeam_channel::bounded::<Result<R>>(1);
        let queued = self.submit_async(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
                let message = panic_message(payload.as_ref());
                error!("Synchronous UI call panicked: {}", message);
                GuiError::ThunkPanicked(message)
            });
            // The waiting side never gives up, so this only fails if it died.
            let _ = done_tx.send(outcome);
        });
        if !queued {
            return Err(GuiError::Disconnected);
        }
        // A discarded thunk drops `done_tx`, which unblocks us with an error.
        done_rx.recv().map_err(|_| GuiError::Disconnected)?
    }

    /// Run the oldest pending thunk. Returns whether one was run.
    pub fn drain_one(&self) -> Result<bool> {
        self.ensure_ui_thread("Dispatcher::drain_one")?;
        Ok(self.run_next())
    }

    /// Run pending thunks in FIFO order until the queue is empty.
    ///
    /// Thunks queued by thunks are run in the same pass.
    pub fn drain_all(&self) -> Result<usize> {
        self.ensure_ui_thread("Dispatcher::drain_all")?;
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        if ran > 0 {
            trace!("Drained {} queued call(s)", ran);
        }
        Ok(ran)
    }

    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.queue.is_closed()
    }

    /// Stop accepting calls and discard the ones still waiting.
    ///
    /// Blocked `submit_sync` callers get [`GuiError::Disconnected`].
    pub fn close(&self) -> Result<usize> {
        self.ensure_ui_thread("Dispatcher::close")?;
        let discarded = self.shared.queue.close();
        if discarded > 0 {
            warn!("Discarded {} queued call(s) at shutdown", discarded);
        }
        Ok(discarded)
    }

    fn run_next(&self) -> bool {
        let Some(thunk) = self.shared.queue.dequeue() else {
            return false;
        };
        run_isolated(thunk);
        true
    }
}

fn run_isolated(thunk: Thunk) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(thunk)) {
        error!(
            "Queued UI call panicked: {}",
            panic_message(payload.as_ref())
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CountingWake(Arc<AtomicUsize>);

    impl Wake for CountingWake {
        fn wake(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn async_submit_wakes_and_runs_in_order() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new(CountingWake(Arc::clone(&wakes)));
        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..4 {
            let seen = Arc::clone(&seen);
            assert!(dispatcher.submit_async(move || seen.lock().unwrap().push(i)));
        }
        assert_eq!(wakes.load(Ordering::SeqCst), 4);
        assert_eq!(dispatcher.pending(), 4);

        assert!(dispatcher.drain_one().unwrap());
        assert_eq!(*seen.lock().unwrap(), vec![0]);
        assert_eq!(dispatcher.drain_all().unwrap(), 3);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3]);
        assert!(!dispatcher.drain_one().unwrap());
    }

    #[test]
    fn sync_on_ui_thread_runs_inline() {
        let dispatcher = Dispatcher::new(NoWake);
        let value = dispatcher.submit_sync(|| 7 * 6).unwrap();
        assert_eq!(value, 42);
        assert_eq!(dispatcher.pending(), 0);
    }

    #[test]
    fn nested_sync_inside_drained_thunk_does_not_deadlock() {
        let dispatcher = Dispatcher::new(NoWake);
        let inner = dispatcher.clone();
        let result = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&result);
        dispatcher.submit_async(move || {
            *slot.lock().unwrap() = Some(inner.submit_sync(|| "nested").unwrap());
        });
        dispatcher.drain_all().unwrap();
        assert_eq!(*result.lock().unwrap(), Some("nested"));
    }

    #[test]
    fn inline_panic_is_reported() {
        let dispatcher = Dispatcher::new(NoWake);
        let outcome: Result<()> = dispatcher.submit_sync(|| panic!("boom"));
        match outcome {
            Err(GuiError::ThunkPanicked(msg)) => assert_eq!(msg, "boom"),
            other => panic!("unexpected outcome: {:?}", other.err()),
        }
    }

    #[test]
    fn drain_off_ui_thread_fails() {
        let dispatcher = Dispatcher::new(NoWake);
        let remote = dispatcher.clone();
        let outcome = thread::spawn(move || remote.drain_all()).join().unwrap();
        assert!(matches!(outcome, Err(GuiError::WrongThread { .. })));
    }

    #[test]
    fn worker_identity_is_set_once() {
        let dispatcher = Dispatcher::new(NoWake);
        assert_eq!(dispatcher.current_role(), ThreadRole::Ui);
        let id = thread::spawn(|| thread::current().id()).join().unwrap();
        dispatcher.register_worker_thread(id).unwrap();
        assert!(matches!(
            dispatcher.register_worker_thread(thread::current().id()),
            Err(GuiError::WorkerAlreadyStarted)
        ));
        assert_eq!(dispatcher.worker_thread(), Some(id));
    }

    #[test]
    fn closed_queue_rejects_sync_calls() {
        let dispatcher = Dispatcher::new(NoWake);
        dispatcher.close().unwrap();
        let remote = dispatcher.clone();
        let outcome = thread::spawn(move || remote.submit_sync(|| 1)).join().unwrap();
        assert!(matches!(outcome, Err(GuiError::Disconnected)));
        assert!(!dispatcher.submit_async(|| {}));
    }
}
