pub mod app;
pub mod color;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod font;
pub mod thread;
pub mod widget;

// Re-exports for user programs
pub use crate::app::{init_logging, Application, ExitHandle, Gui};
pub use crate::config::GuiConfig;
pub use crate::dispatch::{Dispatcher, NoWake, Wake};
pub use crate::error::{GuiError, Result};
pub use crate::thread::{ThreadRole, WorkerState};
pub use crate::widget::{ColorChooser, HasNativeHandle, HasText, Interactor, TextArea};
