//! In-memory toolkit backend
//!
//! Stands in for the native widgets when no display is available: the demo
//! binary and the tests drive the full widget API against these.

use super::color_chooser::ColorDialogBackend;
use super::text_area::{TextEditBackend, TextFormat};
use super::NativeHandle;
use crate::font::FontMetrics;
use log::debug;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_NATIVE_HANDLE: AtomicU64 = AtomicU64::new(0x1000);

const BACKSPACE: char = '\u{8}';
const DELETE: char = '\u{7f}';

pub struct HeadlessTextEdit {
    handle: NativeHandle,
    text: String,
    /// Markup last set with `set_html`; dropped by any plain-text edit.
    markup: Option<String>,
    placeholder: String,
    read_only: bool,
    enabled: bool,
    line_wrap: bool,
    cursor: usize,
    anchor: usize,
    scroll: u32,
    size: (f32, f32),
    preferred: Option<(f32, f32)>,
    metrics: Box<dyn FontMetrics>,
}

impl HeadlessTextEdit {
    pub fn new(metrics: impl FontMetrics + 'static) -> Self {
        Self {
            handle: NativeHandle(NEXT_NATIVE_HANDLE.fetch_add(1, Ordering::Relaxed)),
            text: String::new(),
            markup: None,
            placeholder: String::new(),
            read_only: false,
            enabled: true,
            line_wrap: true,
            cursor: 0,
            anchor: 0,
            scroll: 0,
            size: (0.0, 0.0),
            preferred: None,
            metrics: Box::new(metrics),
        }
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_index(&self, position: usize) -> usize {
        self.text
            .char_indices()
            .nth(position)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    fn selection_range(&self) -> (usize, usize) {
        (self.cursor.min(self.anchor), self.cursor.max(self.anchor))
    }

    fn remove_chars(&mut self, start: usize, end: usize) {
        let (from, to) = (self.byte_index(start), self.byte_index(end));
        self.text.replace_range(from..to, "");
        self.markup = None;
        self.cursor = start;
        self.anchor = start;
    }

    fn insert_char(&mut self, c: char) {
        let (start, end) = self.selection_range();
        if end > start {
            self.remove_chars(start, end);
        }
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.markup = None;
        self.cursor += 1;
        self.anchor = self.cursor;
    }

    fn row_height(&self) -> f32 {
        self.metrics.line_spacing().max(1.0)
    }

    /// Visual line the character at `position` sits on, honoring wrapping.
    fn visual_line_of(&self, position: usize) -> usize {
        let mut visual = 0;
        let mut consumed = 0;
        for line in self.text.split('\n') {
            let len = line.chars().count();
            if position <= consumed + len {
                let prefix: String = line.chars().take(position - consumed).collect();
                return visual + self.wrapped_lines(&prefix).saturating_sub(1);
            }
            visual += self.wrapped_lines(line);
            consumed += len + 1;
        }
        visual.saturating_sub(1)
    }

    fn wrapped_lines(&self, line: &str) -> usize {
        let width = self.size.0;
        if !self.line_wrap || width <= 0.0 {
            return 1;
        }
        let needed = self.metrics.text_width(line);
        ((needed / width).ceil() as usize).max(1)
    }

    fn content_height(&self) -> f32 {
        let lines: usize = self.text.split('\n').map(|l| self.wrapped_lines(l)).sum();
        lines as f32 * self.row_height()
    }
}

impl TextEditBackend for HeadlessTextEdit {
    fn native_handle(&self) -> NativeHandle {
        self.handle
    }

    fn plain_text(&self) -> String {
        self.text.clone()
    }

    fn set_plain_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.markup = None;
        self.cursor = self.cursor.min(self.char_count());
        self.anchor = self.cursor;
        self.scroll = self.scroll.min(self.vertical_scroll_maximum());
    }

    fn append(&mut self, text: &str, format: &TextFormat) {
        if *format != TextFormat::default() {
            debug!("Headless text edit ignores formatting {:?}", format);
        }
        self.text.push_str(text);
        self.markup = None;
    }

    fn clear(&mut self) {
        self.text.clear();
        self.markup = None;
        self.cursor = 0;
        self.anchor = 0;
        self.scroll = 0;
    }

    fn html(&self) -> String {
        match &self.markup {
            Some(markup) => markup.clone(),
            None => escape_markup(&self.text),
        }
    }

    fn set_html(&mut self, html: &str) {
        self.set_plain_text(&strip_markup(html));
        self.markup = Some(html.to_string());
    }

    fn placeholder(&self) -> String {
        self.placeholder.clone()
    }

    fn set_placeholder(&mut self, text: &str) {
        self.placeholder = text.to_string();
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn line_wrap(&self) -> bool {
        self.line_wrap
    }

    fn set_line_wrap(&mut self, wrap: bool) {
        self.line_wrap = wrap;
    }

    fn cursor_position(&self) -> usize {
        self.cursor
    }

    fn set_cursor_position(&mut self, position: usize) {
        self.cursor = position.min(self.char_count());
        self.anchor = self.cursor;
    }

    fn selection(&self) -> (usize, usize) {
        self.selection_range()
    }

    fn set_selection(&mut self, start: usize, end: usize) {
        let count = self.char_count();
        self.anchor = start.min(count);
        self.cursor = end.min(count);
    }

    fn ensure_cursor_visible(&mut self) {
        let row = self.row_height();
        let top = self.visual_line_of(self.cursor) as f32 * row;
        let height = self.size.1;
        if top < self.scroll as f32 {
            self.scroll = top as u32;
        } else if top + row > self.scroll as f32 + height {
            self.scroll = (top + row - height).max(0.0) as u32;
        }
        self.scroll = self.scroll.min(self.vertical_scroll_maximum());
    }

    fn vertical_scroll(&self) -> u32 {
        self.scroll
    }

    fn vertical_scroll_maximum(&self) -> u32 {
        (self.content_height() - self.size.1).max(0.0) as u32
    }

    fn set_vertical_scroll(&mut self, value: u32) {
        self.scroll = value.min(self.vertical_scroll_maximum());
    }

    fn size(&self) -> (f32, f32) {
        self.size
    }

    fn set_size(&mut self, width: f32, height: f32) {
        self.size = (width.max(0.0), height.max(0.0));
    }

    fn preferred_size(&self) -> Option<(f32, f32)> {
        self.preferred
    }

    fn set_preferred_size(&mut self, width: f32, height: f32) {
        self.preferred = Some((width, height));
    }

    fn font_metrics(&self) -> &dyn FontMetrics {
        self.metrics.as_ref()
    }

    fn handle_key(&mut self, key: char) -> bool {
        let (start, end) = self.selection_range();
        match key {
            BACKSPACE | DELETE if end > start => {
                self.remove_chars(start, end);
                true
            }
            BACKSPACE if self.cursor > 0 => {
                self.remove_chars(self.cursor - 1, self.cursor);
                true
            }
            DELETE if self.cursor < self.char_count() => {
                self.remove_chars(self.cursor, self.cursor + 1);
                true
            }
            '\r' | '\n' => {
                self.insert_char('\n');
                true
            }
            c if c.is_control() => false,
            c => {
                self.insert_char(c);
                true
            }
        }
    }
}

/// A color dialog that answers from a script instead of asking anyone.
///
/// Each call pops the next answer; `None` or an exhausted script is a cancel.
pub struct ScriptedColorDialog {
    answers: VecDeque<Option<u32>>,
    requests: Arc<Mutex<Vec<(String, u32)>>>,
}

impl ScriptedColorDialog {
    pub fn new(answers: impl IntoIterator<Item = Option<u32>>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Record of `(title, initial color)` for each time the dialog was shown.
    pub fn requests(&self) -> Arc<Mutex<Vec<(String, u32)>>> {
        Arc::clone(&self.requests)
    }
}

impl ColorDialogBackend for ScriptedColorDialog {
    fn choose(&mut self, title: &str, initial: u32) -> Option<u32> {
        self.requests.lock().push((title.to_string(), initial));
        self.answers.pop_front().flatten()
    }
}

fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Plain text of `html`: tags removed, the basic entities decoded.
fn strip_markup(html: &str) -> String {
    let mut plain = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => plain.push(c),
            _ => {}
        }
    }
    plain
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FixedMetrics;

    fn edit() -> HeadlessTextEdit {
        HeadlessTextEdit::new(FixedMetrics {
            advance: 10.0,
            line_spacing: 10.0,
        })
    }

    #[test]
    fn typing_replaces_selection() {
        let mut e = edit();
        e.set_plain_text("hello world");
        e.set_selection(6, 11);
        assert!(e.handle_key('X'));
        assert_eq!(e.plain_text(), "hello X");
        assert_eq!(e.cursor_position(), 7);
    }

    #[test]
    fn markup_survives_until_plain_edit() {
        let mut e = edit();
        e.set_html("<p>1 &lt; 2</p>");
        assert_eq!(e.plain_text(), "1 < 2");
        assert_eq!(e.html(), "<p>1 &lt; 2</p>");

        e.set_cursor_position(5);
        assert!(e.handle_key('!'));
        assert_eq!(e.html(), "1 &lt; 2!");
    }

    #[test]
    fn backspace_and_delete() {
        let mut e = edit();
        e.set_plain_text("héllo");
        e.set_cursor_position(2);
        assert!(e.handle_key(BACKSPACE));
        assert_eq!(e.plain_text(), "hllo");
        assert!(e.handle_key(DELETE));
        assert_eq!(e.plain_text(), "hlo");
        e.set_cursor_position(0);
        assert!(!e.handle_key(BACKSPACE));
        assert!(!e.handle_key('\u{1b}'));
    }

    #[test]
    fn scrolling_is_clamped_to_content() {
        let mut e = edit();
        e.set_size(100.0, 30.0);
        e.set_plain_text("1\n2\n3\n4\n5\n6");
        // Six rows of 10px in a 30px viewport.
        assert_eq!(e.vertical_scroll_maximum(), 30);
        e.set_vertical_scroll(500);
        assert_eq!(e.vertical_scroll(), 30);

        e.set_cursor_position(0);
        e.ensure_cursor_visible();
        assert_eq!(e.vertical_scroll(), 0);
    }

    #[test]
    fn wrapping_adds_visual_lines() {
        let mut e = edit();
        e.set_size(50.0, 10.0);
        e.set_plain_text("abcdefghij");
        assert_eq!(e.vertical_scroll_maximum(), 10);
        e.set_line_wrap(false);
        assert_eq!(e.vertical_scroll_maximum(), 0);
    }

    #[test]
    fn scripted_dialog_records_requests() {
        let mut dialog = ScriptedColorDialog::new([Some(0x00FF00), None]);
        let log = dialog.requests();
        assert_eq!(dialog.choose("first", 0xFFFFFF), Some(0x00FF00));
        assert_eq!(dialog.choose("second", 0x000000), None);
        assert_eq!(dialog.choose("third", 0x000000), None);
        assert_eq!(log.lock().len(), 3);
        assert_eq!(log.lock()[0], ("first".to_string(), 0xFFFFFF));
    }
}
