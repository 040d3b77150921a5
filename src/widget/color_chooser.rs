//! Modal color picker

use crate::color;
use crate::dispatch::{Dispatcher, UiHandle};
use crate::error::Result;
use log::{info, warn};
use std::cell::RefCell;
use std::sync::Arc;

/// The toolkit's modal color dialog.
pub trait ColorDialogBackend {
    /// Show the dialog and block until the user picks a color or cancels.
    fn choose(&mut self, title: &str, initial: u32) -> Option<u32>;
}

/// Thread-safe handle to a color dialog on the UI thread.
#[derive(Clone)]
pub struct ColorChooser {
    handle: Arc<UiHandle<RefCell<Box<dyn ColorDialogBackend>>>>,
}

impl ColorChooser {
    pub fn new<B, F>(dispatcher: &Dispatcher, make_backend: F) -> Result<Self>
    where
        B: ColorDialogBackend + 'static,
        F: FnOnce() -> B + Send + 'static,
    {
        let handle = UiHandle::create(dispatcher, move || {
            RefCell::new(Box::new(make_backend()) as Box<dyn ColorDialogBackend>)
        })?;
        Ok(Self { handle })
    }

    /// Ask the user for a color, starting from `initial`.
    ///
    /// `initial` may be a color name or hex string; empty means white. Returns
    /// the chosen color as `#rrggbb`, or `""` if the dialog was cancelled.
    pub fn show_dialog(&self, title: &str, initial: &str) -> Result<String> {
        let start = if initial.trim().is_empty() {
            color::WHITE
        } else {
            color::parse(initial).unwrap_or_else(|| {
                warn!("Unreadable initial color '{}', starting from white", initial);
                color::WHITE
            })
        };
        self.show_dialog_rgb(title, start)
    }

    /// As [`ColorChooser::show_dialog`], with a packed `0xRRGGBB` start color.
    pub fn show_dialog_rgb(&self, title: &str, initial: u32) -> Result<String> {
        let title = title.to_string();
        let chosen = self
            .handle
            .call(move |dialog| dialog.borrow_mut().choose(&title, initial & 0xFFFFFF))?;
        match chosen {
            Some(rgb) => {
                let picked = color::rgb_to_string(rgb);
                info!("Color chosen: {}", picked);
                Ok(picked)
            }
            None => {
                info!("Color dialog cancelled");
                Ok(String::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::NoWake;
    use crate::widget::headless::ScriptedColorDialog;
    use std::thread;

    #[test]
    fn returns_hex_or_empty_on_cancel() {
        let dispatcher = Dispatcher::new(NoWake);
        let chooser =
            ColorChooser::new(&dispatcher, || ScriptedColorDialog::new([Some(0x336699), None]))
                .unwrap();
        assert_eq!(chooser.show_dialog("Pick", "red").unwrap(), "#336699");
        assert_eq!(chooser.show_dialog("Pick", "").unwrap(), "");
    }

    #[test]
    fn initial_color_is_converted() {
        let dispatcher = Dispatcher::new(NoWake);
        let dialog = ScriptedColorDialog::new([None, None, None]);
        let requests = dialog.requests();
        let chooser = ColorChooser::new(&dispatcher, move || dialog).unwrap();

        chooser.show_dialog("a", "").unwrap();
        chooser.show_dialog("b", "blue").unwrap();
        chooser.show_dialog("c", "no such color").unwrap();
        let seen: Vec<u32> = requests.lock().iter().map(|(_, c)| *c).collect();
        assert_eq!(seen, vec![0xFFFFFF, 0x0000FF, 0xFFFFFF]);
    }

    #[test]
    fn worker_call_waits_for_ui_thread() {
        let dispatcher = Dispatcher::new(NoWake);
        let chooser =
            ColorChooser::new(&dispatcher, || ScriptedColorDialog::new([Some(0xFF0000)])).unwrap();
        let worker = thread::spawn(move || chooser.show_dialog_rgb("Pick", 0x000000));

        while dispatcher.pending() == 0 {
            thread::yield_now();
        }
        assert!(dispatcher.drain_one().unwrap());
        assert_eq!(worker.join().unwrap().unwrap(), "#ff0000");
    }
}
