//! Cross-thread dispatch onto the UI thread
//!
//! This module defines the queue of deferred calls, the coordinator that
//! feeds and drains it, and the wrapper that pins values to the UI thread.

pub mod dispatcher;
pub mod queue;
pub mod ui_bound;

pub use dispatcher::{Dispatcher, NoWake, Wake};
pub use queue::{Thunk, ThunkQueue};
pub use ui_bound::{UiBound, UiHandle};
