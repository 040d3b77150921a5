//! Multi-line text area
//!
//! [`TextArea`] forwards every operation to a [`TextEditBackend`] living on
//! the UI thread. Handles are cheap to clone and can be used from the worker
//! thread; each call blocks until the UI thread has applied it.
//!
//! Listeners are handed the widget they belong to, so they never need to
//! capture a handle to it. A listener that does capture one keeps the
//! widget alive until the listener is removed.

use super::events::{
    self, EventKind, EventListeners, GuiEvent, Listener, KEY_EVENTS, MOUSE_EVENTS,
    TEXT_CHANGE_EVENT,
};
use super::{next_widget_id, HasNativeHandle, HasText, Interactor, NativeHandle};
use crate::color;
use crate::dispatch::{Dispatcher, UiHandle};
use crate::error::Result;
use crate::font::{CellSize, FontMetrics, FontSpec};
use log::{debug, warn};
use std::cell::{Cell, RefCell};
use std::sync::{Arc, Weak};

/// Character formatting for appended text. `None` keeps the widget default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextFormat {
    pub color: Option<u32>,
    pub font: Option<FontSpec>,
}

/// The toolkit's native text-edit widget.
///
/// Positions are character offsets into the plain text.
pub trait TextEditBackend {
    fn native_handle(&self) -> NativeHandle;

    fn plain_text(&self) -> String;
    fn set_plain_text(&mut self, text: &str);
    /// Insert at the end of the document.
    fn append(&mut self, text: &str, format: &TextFormat);
    fn clear(&mut self);
    /// The document as rich-text markup.
    fn html(&self) -> String;
    /// Replace the document with rich-text markup.
    fn set_html(&mut self, html: &str);

    fn placeholder(&self) -> String;
    fn set_placeholder(&mut self, text: &str);

    fn is_read_only(&self) -> bool;
    fn set_read_only(&mut self, read_only: bool);
    fn is_enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool);
    fn line_wrap(&self) -> bool;
    fn set_line_wrap(&mut self, wrap: bool);

    fn cursor_position(&self) -> usize;
    /// Move the cursor, clamped to the text, collapsing any selection.
    fn set_cursor_position(&mut self, position: usize);
    /// Selection as `(start, end)`; `start == end` when nothing is selected.
    fn selection(&self) -> (usize, usize);
    fn set_selection(&mut self, start: usize, end: usize);
    fn ensure_cursor_visible(&mut self);

    fn vertical_scroll(&self) -> u32;
    fn vertical_scroll_maximum(&self) -> u32;
    fn set_vertical_scroll(&mut self, value: u32);

    fn size(&self) -> (f32, f32);
    fn set_size(&mut self, width: f32, height: f32);
    fn preferred_size(&self) -> Option<(f32, f32)>;
    fn set_preferred_size(&mut self, width: f32, height: f32);

    fn font_metrics(&self) -> &dyn FontMetrics;

    /// Default handling of a key press. Returns whether the text changed.
    fn handle_key(&mut self, key: char) -> bool;
}

struct TextAreaState {
    backend: RefCell<Box<dyn TextEditBackend>>,
    listeners: RefCell<EventListeners>,
    context_menu_enabled: Cell<bool>,
    action_command: RefCell<String>,
}

impl TextAreaState {
    /// Fire `kind` to its listener, if any. Nothing is borrowed while it runs.
    fn fire(&self, kind: EventKind, source_id: u64) -> GuiEvent {
        let command = self.action_command.borrow().clone();
        let event = GuiEvent::new(kind, source_id, command);
        let listener = self.listeners.borrow().lookup(event.name());
        if let Some(listener) = listener {
            events::invoke(&listener, &event);
        }
        event
    }

    fn has_listener(&self, name: &str) -> bool {
        self.listeners.borrow().has(name)
    }
}

#[derive(Clone)]
pub struct TextArea {
    id: u64,
    handle: Arc<UiHandle<TextAreaState>>,
}

impl std::fmt::Debug for TextArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextArea").field("id", &self.id).finish()
    }
}

/// A handle that does not keep its text area alive.
#[derive(Clone)]
pub struct WeakTextArea {
    id: u64,
    handle: Weak<UiHandle<TextAreaState>>,
}

impl WeakTextArea {
    pub fn upgrade(&self) -> Option<TextArea> {
        self.handle.upgrade().map(|handle| TextArea {
            id: self.id,
            handle,
        })
    }
}

impl TextArea {
    /// Create the backend on the UI thread and wrap it.
    pub fn new<B, F>(dispatcher: &Dispatcher, make_backend: F) -> Result<Self>
    where
        B: TextEditBackend + 'static,
        F: FnOnce() -> B + Send + 'static,
    {
        let handle = UiHandle::create(dispatcher, move || TextAreaState {
            backend: RefCell::new(Box::new(make_backend()) as Box<dyn TextEditBackend>),
            listeners: RefCell::new(EventListeners::new()),
            context_menu_enabled: Cell::new(true),
            action_command: RefCell::new(String::new()),
        })?;
        let area = Self {
            id: next_widget_id(),
            handle,
        };
        debug!("Created text area {}", area.id);
        Ok(area)
    }

    pub fn with_text<B, F>(dispatcher: &Dispatcher, make_backend: F, text: &str) -> Result<Self>
    where
        B: TextEditBackend + 'static,
        F: FnOnce() -> B + Send + 'static,
    {
        let area = Self::new(dispatcher, make_backend)?;
        area.set_text(text)?;
        Ok(area)
    }

    pub fn with_rows_columns<B, F>(
        dispatcher: &Dispatcher,
        make_backend: F,
        rows: u32,
        columns: u32,
    ) -> Result<Self>
    where
        B: TextEditBackend + 'static,
        F: FnOnce() -> B + Send + 'static,
    {
        let area = Self::new(dispatcher, make_backend)?;
        area.set_rows_columns(rows, columns)?;
        Ok(area)
    }

    fn read<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&dyn TextEditBackend) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.handle.call(move |state| f(&**state.backend.borrow()))
    }

    fn write<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut dyn TextEditBackend) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.handle.call(move |state| f(&mut **state.backend.borrow_mut()))
    }

    /// Apply a text mutation, then notify text-change listeners.
    fn edit<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut dyn TextEditBackend) + Send + 'static,
    {
        let id = self.id;
        self.handle.call(move |state| {
            f(&mut **state.backend.borrow_mut());
            state.fire(EventKind::TextChanged, id);
        })
    }

    fn set_listeners<F>(&self, names: &'static [&'static str], mut listener: F) -> Result<()>
    where
        F: FnMut(&TextArea, &GuiEvent) + Send + 'static,
    {
        let widget = self.downgrade();
        let listener: Listener = Box::new(move |event: &GuiEvent| {
            if let Some(area) = widget.upgrade() {
                listener(&area, event);
            }
        });
        self.handle
            .call(move |state| state.listeners.borrow_mut().set_many(names, listener))
    }

    pub fn downgrade(&self) -> WeakTextArea {
        WeakTextArea {
            id: self.id,
            handle: Arc::downgrade(&self.handle),
        }
    }

    fn remove_listeners(&self, names: &'static [&'static str]) -> Result<()> {
        self.handle
            .call(move |state| state.listeners.borrow_mut().remove_many(names))
    }

    pub fn append_text(&self, text: &str) -> Result<()> {
        let text = text.to_string();
        self.edit(move |b| {
            b.append(&text, &TextFormat::default());
            move_to_end(b);
        })
    }

    /// Append `text` with an optional color and font.
    ///
    /// Empty strings leave the default; unreadable values are ignored with a warning.
    pub fn append_formatted_text(&self, text: &str, color: &str, font: &str) -> Result<()> {
        let format = TextFormat {
            color: parse_or_warn(color, "color", color::parse),
            font: parse_or_warn(font, "font", FontSpec::parse),
        };
        let text = text.to_string();
        self.edit(move |b| {
            move_to_end(b);
            b.append(&text, &format);
            move_to_end(b);
        })
    }

    pub fn clear_text(&self) -> Result<()> {
        self.edit(|b| b.clear())
    }

    pub fn html(&self) -> Result<String> {
        self.read(|b| b.html())
    }

    pub fn set_html(&self, html: &str) -> Result<()> {
        let html = html.to_string();
        self.edit(move |b| b.set_html(&html))
    }

    /// Append markup by rewriting the whole document.
    pub fn append_html(&self, html: &str) -> Result<()> {
        let html = html.to_string();
        self.edit(move |b| {
            let document = b.html() + &html;
            b.set_html(&document);
            move_to_end(b);
        })
    }

    pub fn placeholder(&self) -> Result<String> {
        self.read(|b| b.placeholder())
    }

    pub fn set_placeholder(&self, text: &str) -> Result<()> {
        let text = text.to_string();
        self.write(move |b| b.set_placeholder(&text))
    }

    pub fn is_editable(&self) -> Result<bool> {
        self.read(|b| !b.is_read_only())
    }

    pub fn set_editable(&self, editable: bool) -> Result<()> {
        self.write(move |b| b.set_read_only(!editable))
    }

    pub fn is_enabled(&self) -> Result<bool> {
        self.read(|b| b.is_enabled())
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.write(move |b| b.set_enabled(enabled))
    }

    pub fn is_line_wrap(&self) -> Result<bool> {
        self.read(|b| b.line_wrap())
    }

    pub fn set_line_wrap(&self, wrap: bool) -> Result<()> {
        self.write(move |b| b.set_line_wrap(wrap))
    }

    pub fn cursor_position(&self) -> Result<usize> {
        self.read(|b| b.cursor_position())
    }

    pub fn set_cursor_position(&self, index: usize) -> Result<()> {
        self.write(move |b| {
            b.set_cursor_position(index);
            b.ensure_cursor_visible();
        })
    }

    pub fn move_cursor_to_start(&self) -> Result<()> {
        self.set_cursor_position(0)
    }

    pub fn move_cursor_to_end(&self) -> Result<()> {
        self.write(move_to_end)
    }

    pub fn select(&self, start: usize, end: usize) -> Result<()> {
        self.write(move |b| b.set_selection(start, end))
    }

    /// The selected text, or `""` when nothing is selected.
    pub fn selected_text(&self) -> Result<String> {
        self.read(|b| {
            let (start, end) = b.selection();
            if end > start {
                b.plain_text().chars().skip(start).take(end - start).collect()
            } else {
                String::new()
            }
        })
    }

    pub fn scroll_to_top(&self) -> Result<()> {
        self.write(|b| b.set_vertical_scroll(0))
    }

    pub fn scroll_to_bottom(&self) -> Result<()> {
        self.write(|b| {
            let max = b.vertical_scroll_maximum();
            b.set_vertical_scroll(max);
        })
    }

    /// Size of one character cell in the current font.
    pub fn row_column_size(&self) -> Result<CellSize> {
        self.read(|b| CellSize::from_metrics(b.font_metrics()))
    }

    pub fn rows(&self) -> Result<u32> {
        self.read(|b| {
            let cell = CellSize::from_metrics(b.font_metrics());
            CellSize::cells_in(b.size().1, cell.height)
        })
    }

    pub fn columns(&self) -> Result<u32> {
        self.read(|b| {
            let cell = CellSize::from_metrics(b.font_metrics());
            CellSize::cells_in(b.size().0, cell.width)
        })
    }

    pub fn set_rows(&self, rows: u32) -> Result<()> {
        self.write(move |b| {
            let cell = CellSize::from_metrics(b.font_metrics());
            let (width, _) = b.size();
            resize(b, width, cell.height * rows as f32);
        })
    }

    pub fn set_columns(&self, columns: u32) -> Result<()> {
        self.write(move |b| {
            let cell = CellSize::from_metrics(b.font_metrics());
            let (_, height) = b.size();
            resize(b, cell.width * columns as f32, height);
        })
    }

    pub fn set_rows_columns(&self, rows: u32, columns: u32) -> Result<()> {
        self.write(move |b| {
            let cell = CellSize::from_metrics(b.font_metrics());
            resize(b, cell.width * columns as f32, cell.height * rows as f32);
        })
    }

    pub fn size(&self) -> Result<(f32, f32)> {
        self.read(|b| b.size())
    }

    pub fn preferred_size(&self) -> Result<Option<(f32, f32)>> {
        self.read(|b| b.preferred_size())
    }

    pub fn is_context_menu_enabled(&self) -> Result<bool> {
        self.handle.call(|state| state.context_menu_enabled.get())
    }

    pub fn set_context_menu_enabled(&self, enabled: bool) -> Result<()> {
        self.handle
            .call(move |state| state.context_menu_enabled.set(enabled))
    }

    pub fn set_text_change_listener<F>(&self, listener: F) -> Result<()>
    where
        F: FnMut(&TextArea, &GuiEvent) + Send + 'static,
    {
        self.set_listeners(&[TEXT_CHANGE_EVENT], listener)
    }

    pub fn remove_text_change_listener(&self) -> Result<()> {
        self.remove_listeners(&[TEXT_CHANGE_EVENT])
    }

    pub fn set_key_listener<F>(&self, listener: F) -> Result<()>
    where
        F: FnMut(&TextArea, &GuiEvent) + Send + 'static,
    {
        self.set_listeners(KEY_EVENTS, listener)
    }

    pub fn remove_key_listener(&self) -> Result<()> {
        self.remove_listeners(KEY_EVENTS)
    }

    pub fn set_mouse_listener<F>(&self, listener: F) -> Result<()>
    where
        F: FnMut(&TextArea, &GuiEvent) + Send + 'static,
    {
        self.set_listeners(MOUSE_EVENTS, listener)
    }

    pub fn remove_mouse_listener(&self) -> Result<()> {
        self.remove_listeners(MOUSE_EVENTS)
    }

    pub fn has_listener(&self, name: &str) -> Result<bool> {
        let name = name.to_string();
        self.handle.call(move |state| state.has_listener(&name))
    }

    /// Deliver native input to the widget.
    ///
    /// Listeners see the event first; unless one consumes it, the backend's
    /// default handling runs. Returns whether the default handling ran.
    pub fn deliver(&self, kind: EventKind) -> Result<bool> {
        let id = self.id;
        self.handle.call(move |state| {
            if matches!(
                kind,
                EventKind::MousePressed { .. } | EventKind::MouseReleased { .. }
            ) && !state.has_listener(kind.listener_name())
            {
                return true;
            }
            let event = state.fire(kind, id);
            if event.is_consumed() {
                return false;
            }
            if let EventKind::KeyPressed { key } = kind {
                let changed = {
                    let mut backend = state.backend.borrow_mut();
                    backend.is_enabled() && !backend.is_read_only() && backend.handle_key(key)
                };
                if changed {
                    state.fire(EventKind::TextChanged, id);
                }
            }
            true
        })
    }

    /// Feed `text` to the widget as if typed, one key press/release per char.
    pub fn simulate_typing(&self, text: &str) -> Result<()> {
        for key in text.chars() {
            self.deliver(EventKind::KeyPressed { key })?;
            self.deliver(EventKind::KeyTyped { key })?;
            self.deliver(EventKind::KeyReleased { key })?;
        }
        Ok(())
    }
}

fn move_to_end(b: &mut dyn TextEditBackend) {
    let end = b.plain_text().chars().count();
    b.set_cursor_position(end);
    b.ensure_cursor_visible();
}

fn resize(b: &mut dyn TextEditBackend, width: f32, height: f32) {
    b.set_preferred_size(width, height);
    b.set_size(width, height);
}

fn parse_or_warn<T>(value: &str, what: &str, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
    if value.trim().is_empty() {
        return None;
    }
    let parsed = parse(value);
    if parsed.is_none() {
        warn!("Ignoring unreadable {} '{}'", what, value);
    }
    parsed
}

impl Interactor for TextArea {
    fn id(&self) -> u64 {
        self.id
    }

    fn type_name(&self) -> &'static str {
        "TextArea"
    }

    fn action_command(&self) -> Result<String> {
        self.handle
            .call(|state| state.action_command.borrow().clone())
    }

    fn set_action_command(&self, command: &str) -> Result<()> {
        let command = command.to_string();
        self.handle
            .call(move |state| *state.action_command.borrow_mut() = command)
    }
}

impl HasText for TextArea {
    fn text(&self) -> Result<String> {
        self.read(|b| b.plain_text())
    }

    fn set_text(&self, text: &str) -> Result<()> {
        let text = text.to_string();
        self.edit(move |b| b.set_plain_text(&text))
    }
}

impl HasNativeHandle for TextArea {
    fn native_handle(&self) -> Result<NativeHandle> {
        self.read(|b| b.native_handle())
    }
}
