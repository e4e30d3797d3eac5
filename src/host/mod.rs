// ── Host primitive API ────────────────────────────────────────────────────────
//
// `Host` is the one seam between the facades and the editor.  Each method is
// a single host primitive; the facades reshape results but never add logic.
// No `unsafe` lives here; Win32 FFI is confined to `native` and never leaks
// outward.

use std::path::{Path, PathBuf};

use crate::{error::Result, macros::MacroValue, text::Encoding, version::HmVersion};

pub mod memory;

#[cfg(windows)]
pub mod native;

/// The unshaped result of a macro evaluation, as the host reports it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawEval {
    /// Host result code; values below 1 mean failure.
    pub result: i32,
    /// Text the macro produced (may be empty).
    pub message: String,
    /// Host-supplied error description, meaningful only on failure.
    pub error_message: String,
}

/// Primitive functions provided by the embedding editor.
///
/// Implementations are single-threaded and take `&self`; any state they keep
/// lives behind interior mutability.
pub trait Host {
    // ── File ──────────────────────────────────────────────────────────────────

    /// Ask the host to detect the encoding of the file at `path`.
    fn encoding_from_file(&self, path: &Path) -> Result<Encoding>;

    /// Describe a Hidemaru `encode` value.
    fn encoding_from_hm_encode(&self, hm_encode: i32) -> Result<Encoding>;

    /// Read the whole file decoded with `hm_encode`.  `None` means the host
    /// reported failure.
    fn read_all_text(&self, path: &Path, hm_encode: i32) -> Result<Option<String>>;

    // ── Edit ──────────────────────────────────────────────────────────────────

    fn total_text(&self) -> Result<String>;
    fn set_total_text(&self, text: &str) -> Result<()>;

    fn selected_text(&self) -> Result<String>;
    fn set_selected_text(&self, text: &str) -> Result<()>;

    fn line_text(&self) -> Result<String>;
    fn set_line_text(&self, text: &str) -> Result<()>;

    /// `(lineno, column)` of the caret.
    fn cursor_pos(&self) -> Result<(i32, i32)>;

    /// `(lineno, column, x, y)` for the mouse pointer.
    fn mouse_pos(&self) -> Result<(i32, i32, i32, i32)>;

    /// Full path of the active document, `None` for an untitled buffer.
    fn file_path(&self) -> Result<Option<PathBuf>>;

    // ── Macro ─────────────────────────────────────────────────────────────────

    fn get_var(&self, name: &str) -> Result<MacroValue>;
    fn set_var(&self, name: &str, value: &MacroValue) -> Result<()>;
    fn eval_macro(&self, expression: &str) -> Result<RawEval>;
    fn is_macro_executing(&self) -> Result<bool>;

    /// Run the macro file at `path` as a new macro.  Only possible while no
    /// macro is executing; otherwise the result code is -1.
    fn exec_macro_file(&self, path: &Path) -> Result<RawEval>;

    // ── Output pane ───────────────────────────────────────────────────────────

    fn output(&self, text: &str) -> Result<i32>;
    fn push(&self) -> Result<i32>;
    fn pop(&self) -> Result<i32>;
    fn send_message(&self, command_id: i32) -> Result<isize>;
    fn set_base_dir(&self, dir: &Path) -> Result<i32>;

    // ── Misc ──────────────────────────────────────────────────────────────────

    /// Write a line to the host's debug channel.
    fn debug_info(&self, text: &str) -> Result<()>;

    fn version(&self) -> Result<HmVersion>;
}
