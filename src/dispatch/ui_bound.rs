//! Values that live on the UI thread but can be referenced from anywhere

use super::Dispatcher;
use crate::error::Result;
use log::warn;
use std::mem::ManuallyDrop;
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// A value pinned to the thread that created it.
///
/// `UiBound` can be moved into thunks and shared between threads, but the
/// wrapped value is only ever touched on the owning thread: [`UiBound::with`]
/// panics anywhere else. Backend widgets are typically `!Send` (`RefCell`,
/// raw toolkit handles), so this is how a worker-side handle refers to them.
pub struct UiBound<T> {
    value: ManuallyDrop<T>,
    owner: ThreadId,
}

// SAFETY: the value is only created, borrowed and dropped on `owner`;
// other threads can move or share the wrapper but never reach the value.
unsafe impl<T> Send for UiBound<T> {}
unsafe impl<T> Sync for UiBound<T> {}

impl<T> UiBound<T> {
    /// Bind `value` to the calling thread.
    pub fn new(value: T) -> Self {
        Self {
            value: ManuallyDrop::new(value),
            owner: thread::current().id(),
        }
    }

    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    pub fn is_owner(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Borrow the value. Panics off the owning thread.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        assert!(
            self.is_owner(),
            "UI-thread value accessed from {:?}; marshal the call through the Dispatcher",
            thread::current().id()
        );
        f(&self.value)
    }
}

impl<T> Drop for UiBound<T> {
    fn drop(&mut self) {
        if self.is_owner() {
            // SAFETY: dropped exactly once, on the owning thread.
            unsafe { ManuallyDrop::drop(&mut self.value) };
        } else {
            warn!(
                "Leaking UI-thread value dropped on {:?} (owner {:?})",
                thread::current().id(),
                self.owner
            );
        }
    }
}

/// Shared handle to a value created on, and owned by, the UI thread.
///
/// Calls made through the handle are marshaled with
/// [`Dispatcher::submit_sync`]. When the last handle is dropped elsewhere,
/// the value is sent back to the UI thread to be dropped there.
pub struct UiHandle<T: 'static> {
    dispatcher: Dispatcher,
    value: ManuallyDrop<UiBound<T>>,
}

impl<T: 'static> UiHandle<T> {
    /// Build the value on the UI thread with `make`.
    pub fn create<F>(dispatcher: &Dispatcher, make: F) -> Result<Arc<Self>>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let value = dispatcher.submit_sync(move || UiBound::new(make()))?;
        Ok(Arc::new(Self {
            dispatcher: dispatcher.clone(),
            value: ManuallyDrop::new(value),
        }))
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run `f` against the value on the UI thread and wait for the result.
    pub fn call<F, R>(self: &Arc<Self>, f: F) -> Result<R>
    where
        F: FnOnce(&T) -> R + Send + 'static,
        R: Send + 'static,
    {
        let this = Arc::clone(self);
        self.dispatcher.submit_sync(move || this.value.with(f))
    }

    /// Borrow the value directly. Panics off the UI thread.
    pub fn with_local<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.value.with(f)
    }
}

impl<T: 'static> Drop for UiHandle<T> {
    fn drop(&mut self) {
        // SAFETY: `value` is never touched again after this point.
        let value = unsafe { ManuallyDrop::take(&mut self.value) };
        if value.is_owner() {
            drop(value);
        } else {
            self.dispatcher.submit_async(move || drop(value));
        }
    }
}
