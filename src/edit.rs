// ── Document accessor ─────────────────────────────────────────────────────────
//
// The document being edited: whole text, selection, caret line, positions.
// Every method is one host call.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{error::Result, host::Host};

/// Caret position, in the same units as the macro `lineno` and `column`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPos {
    pub lineno: i32,
    pub column: i32,
}

/// Text position under the mouse pointer plus the pointer's screen
/// coordinates (as Win32 `GetCursorPos` reports them).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MousePos {
    pub lineno: i32,
    pub column: i32,
    pub x: i32,
    pub y: i32,
}

/// The active document.
pub struct Edit<'h, H: Host + ?Sized> {
    host: &'h H,
}

impl<'h, H: Host + ?Sized> Edit<'h, H> {
    pub(crate) fn new(host: &'h H) -> Self {
        Self { host }
    }

    pub fn total_text(&self) -> Result<String> {
        self.host.total_text()
    }

    pub fn set_total_text(&self, text: &str) -> Result<()> {
        self.host.set_total_text(text)
    }

    /// Text of a simple or line selection.  Box selections are not covered.
    pub fn selected_text(&self) -> Result<String> {
        self.host.selected_text()
    }

    pub fn set_selected_text(&self, text: &str) -> Result<()> {
        self.host.set_selected_text(text)
    }

    /// Text of the line holding the caret.
    pub fn line_text(&self) -> Result<String> {
        self.host.line_text()
    }

    pub fn set_line_text(&self, text: &str) -> Result<()> {
        self.host.set_line_text(text)
    }

    pub fn cursor_pos(&self) -> Result<CursorPos> {
        let (lineno, column) = self.host.cursor_pos()?;
        Ok(CursorPos { lineno, column })
    }

    pub fn mouse_pos(&self) -> Result<MousePos> {
        let (lineno, column, x, y) = self.host.mouse_pos()?;
        Ok(MousePos { lineno, column, x, y })
    }

    /// Full path of the document, or `None` while it is untitled.
    pub fn file_path(&self) -> Result<Option<PathBuf>> {
        self.host.file_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::{Call, MemoryHost};

    #[test]
    fn total_text_round_trip_through_host() {
        let host = MemoryHost::new().with_text("before");
        let edit = Edit::new(&host);
        assert_eq!(edit.total_text().expect("get"), "before");
        edit.set_total_text("after").expect("set");
        assert_eq!(host.text(), "after");
    }

    #[test]
    fn selection_replace() {
        let host = MemoryHost::new().with_text("hello world");
        host.select(6, 11);
        let edit = Edit::new(&host);
        assert_eq!(edit.selected_text().expect("get"), "world");
        edit.set_selected_text("there").expect("set");
        assert_eq!(host.text(), "hello there");
    }

    #[test]
    fn no_selection_reads_empty() {
        let host = MemoryHost::new().with_text("abc");
        assert_eq!(Edit::new(&host).selected_text().expect("get"), "");
    }

    #[test]
    fn line_text_follows_caret() {
        let host = MemoryHost::new().with_text("a\nb\nc");
        host.move_caret(1, 0);
        let edit = Edit::new(&host);
        assert_eq!(edit.line_text().expect("get"), "b");
        edit.set_line_text("B").expect("set");
        assert_eq!(host.text(), "a\nB\nc");
    }

    #[test]
    fn positions_are_boxed_unchanged() {
        let host = MemoryHost::new().with_text("x\ny");
        host.move_caret(1, 1);
        host.move_mouse(4, 2, 640, 480);
        let edit = Edit::new(&host);
        assert_eq!(edit.cursor_pos().expect("cursor"), CursorPos { lineno: 2, column: 1 });
        assert_eq!(
            edit.mouse_pos().expect("mouse"),
            MousePos { lineno: 4, column: 2, x: 640, y: 480 }
        );
        assert_eq!(host.calls(), vec![Call::CursorPos, Call::MousePos]);
    }

    #[test]
    fn untitled_document_has_no_path() {
        let host = MemoryHost::new();
        assert_eq!(Edit::new(&host).file_path().expect("path"), None);
        let host = MemoryHost::new().with_file_path(r"C:\notes\todo.txt");
        assert_eq!(
            Edit::new(&host).file_path().expect("path"),
            Some(PathBuf::from(r"C:\notes\todo.txt"))
        );
    }
}
