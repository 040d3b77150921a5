//! Worker ("student") thread lifecycle
//!
//! The user program runs on a single worker thread while the UI thread owns
//! the event loop. The worker moves through `NotStarted -> Running -> Finished`
//! and keeps its exit code for later retrieval.

use crate::dispatch::Dispatcher;
use crate::error::{panic_message, GuiError, Result};
use log::{debug, error, info};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

/// Which of the threads known to a [`Dispatcher`] the caller is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadRole {
    Ui,
    Worker,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    NotStarted,
    Running,
    Finished,
}

/// Exit code reported when the worker's entry function panics.
pub const PANIC_EXIT_CODE: i32 = 1;

struct Status {
    state: WorkerState,
    result: Option<i32>,
}

pub struct WorkerThread {
    name: String,
    status: Arc<Mutex<Status>>,
    id: Option<ThreadId>,
    handle: Option<JoinHandle<()>>,
}

impl WorkerThread {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Arc::new(Mutex::new(Status {
                state: WorkerState::NotStarted,
                result: None,
            })),
            id: None,
            handle: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> WorkerState {
        self.status.lock().state
    }

    /// The entry function's return value, once it has finished.
    pub fn result(&self) -> Option<i32> {
        self.status.lock().result
    }

    pub fn id(&self) -> Option<ThreadId> {
        self.id
    }

    /// Spawn the worker and register it with `dispatcher`.
    ///
    /// `entry` only starts running once the dispatcher knows the worker's
    /// identity. `on_finish` runs on the worker thread with the exit code
    /// after the state has moved to `Finished`.
    pub fn start<F, G>(&mut self, dispatcher: &Dispatcher, entry: F, on_finish: G) -> Result<()>
    where
        F: FnOnce() -> i32 + Send + 'static,
        G: FnOnce(i32) + Send + 'static,
    {
        {
            let mut status = self.status.lock();
            if status.state != WorkerState::NotStarted || dispatcher.worker_thread().is_some() {
                return Err(GuiError::WorkerAlreadyStarted);
            }
            status.state = WorkerState::Running;
        }

        let (go_tx, go_rx) = crossbeam_channel::bounded::<()>(1);
        let status = Arc::clone(&self.status);
        let name = self.name.clone();
        let spawned = thread::Builder::new().name(self.name.clone()).spawn(move || {
            if go_rx.recv().is_err() {
                debug!("Worker '{}' cancelled before entry", name);
                return;
            }
            info!("Worker '{}' entering main", name);
            let code = match panic::catch_unwind(AssertUnwindSafe(entry)) {
                Ok(code) => code,
                Err(payload) => {
                    error!(
                        "Worker '{}' panicked: {}",
                        name,
                        panic_message(payload.as_ref())
                    );
                    PANIC_EXIT_CODE
                }
            };
            {
                let mut status = status.lock();
                status.state = WorkerState::Finished;
                status.result = Some(code);
            }
            info!("Worker '{}' finished with exit code {}", name, code);
            on_finish(code);
        });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.status.lock().state = WorkerState::NotStarted;
                return Err(GuiError::Io(e));
            }
        };

        if let Err(e) = dispatcher.register_worker_thread(handle.thread().id()) {
            drop(go_tx);
            let _ = handle.join();
            self.status.lock().state = WorkerState::NotStarted;
            return Err(e);
        }
        // The receiver only disappears if the thread died before reading it.
        let _ = go_tx.send(());
        self.id = Some(handle.thread().id());
        self.handle = Some(handle);
        Ok(())
    }

    /// Wait for the worker to exit and return its exit code.
    pub fn join(&mut self) -> Option<i32> {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Worker '{}' could not be joined cleanly", self.name);
            }
        }
        self.result()
    }
}
