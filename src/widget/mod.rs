//! Widget wrappers
//!
//! Each wrapper is a thread-safe handle whose operations are forwarded, on the
//! UI thread, to a toolkit backend. Widgets share behavior through small
//! capability traits rather than a class hierarchy.

pub mod color_chooser;
pub mod events;
pub mod headless;
pub mod text_area;

pub use color_chooser::{ColorChooser, ColorDialogBackend};
pub use events::{EventClass, EventKind, GuiEvent, Listener};
pub use text_area::{TextArea, TextEditBackend, TextFormat, WeakTextArea};

use crate::error::Result;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque identifier of the toolkit object behind a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(pub u64);

/// Anything the user can interact with.
pub trait Interactor {
    /// Unique per widget for the life of the process.
    fn id(&self) -> u64;

    fn type_name(&self) -> &'static str;

    /// String attached to events fired by this widget.
    fn action_command(&self) -> Result<String>;

    fn set_action_command(&self, command: &str) -> Result<()>;
}

/// Widgets with a text value.
pub trait HasText {
    fn text(&self) -> Result<String>;
    fn set_text(&self, text: &str) -> Result<()>;
}

/// Widgets backed by a toolkit object.
pub trait HasNativeHandle {
    fn native_handle(&self) -> Result<NativeHandle>;
}

static NEXT_WIDGET_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_widget_id() -> u64 {
    NEXT_WIDGET_ID.fetch_add(1, Ordering::Relaxed)
}
