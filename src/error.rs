//! Error types for spl-gui

use std::thread::ThreadId;
use thiserror::Error;

/// Errors surfaced by the dispatch layer, the application loop and config handling.
#[derive(Error, Debug)]
pub enum GuiError {
    /// A UI-thread-only operation was attempted from another thread.
    #[error("{operation} must run on the UI thread ({expected:?}), but was called from {actual:?}")]
    WrongThread {
        operation: String,
        expected: ThreadId,
        actual: ThreadId,
    },

    /// The worker thread can only be started once.
    #[error("worker thread already started")]
    WorkerAlreadyStarted,

    /// A dispatched thunk panicked on the UI thread.
    #[error("dispatched call panicked: {0}")]
    ThunkPanicked(String),

    /// The UI thread discarded the queue before the call could run.
    #[error("UI thread is no longer draining the dispatch queue")]
    Disconnected,

    #[error("event loop error: {0}")]
    EventLoop(#[from] calloop::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("could not serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("font error: {0}")]
    Font(String),
}

pub type Result<T, E = GuiError> = std::result::Result<T, E>;

/// Extract a readable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
