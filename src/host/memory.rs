// ── In-memory host ────────────────────────────────────────────────────────────
//
// A headless stand-in for the editor: a text buffer with a caret and a
// selection, a variable table, an output pane, and a log of every primitive
// call.  Files are read from the real filesystem as UTF-8.  Pure safe Rust.

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, VecDeque},
    fs,
    path::{Path, PathBuf},
};

use crate::{
    error::{HmError, Result},
    host::{Host, RawEval},
    macros::{script, MacroValue},
    text::Encoding,
    version::HmVersion,
};

/// One recorded primitive call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    EncodingFromFile(PathBuf),
    EncodingFromHmEncode(i32),
    ReadAllText(PathBuf, i32),
    TotalText,
    SetTotalText(String),
    SelectedText,
    SetSelectedText(String),
    LineText,
    SetLineText(String),
    CursorPos,
    MousePos,
    FilePath,
    GetVar(String),
    SetVar(String),
    EvalMacro(String),
    IsMacroExecuting,
    ExecMacroFile(PathBuf),
    Output(String),
    Push,
    Pop,
    SendMessage(i32),
    SetBaseDir(PathBuf),
    DebugInfo(String),
    Version,
}

/// `hm_encode` reported for every file; UTF-8.
const FILE_ENCODE: i32 = 6;

/// Editor state held by [`MemoryHost`].
#[derive(Debug, Default)]
struct Buffer {
    text: String,
    /// Byte range of the selection, if any.
    selection: Option<(usize, usize)>,
    /// Zero-based line of the caret.
    caret_line: usize,
    caret_column: usize,
    mouse: (i32, i32, i32, i32),
    file_path: Option<PathBuf>,
}

impl Buffer {
    /// Byte range of line `n` (zero-based), excluding its line break.
    fn line_range(&self, n: usize) -> Option<(usize, usize)> {
        let mut start = 0;
        for (i, line) in self.text.split_inclusive('\n').enumerate() {
            let body = line.trim_end_matches('\n').trim_end_matches('\r');
            if i == n {
                return Some((start, start + body.len()));
            }
            start += line.len();
        }
        // An empty buffer or a trailing newline leaves one empty last line.
        let lines = self.text.split_inclusive('\n').count();
        (n == lines && (self.text.is_empty() || self.text.ends_with('\n')))
            .then_some((self.text.len(), self.text.len()))
    }
}

/// A headless host for tests and offline scripting.
#[derive(Debug)]
pub struct MemoryHost {
    buffer: RefCell<Buffer>,
    vars: RefCell<HashMap<String, MacroValue>>,
    eval_script: RefCell<VecDeque<RawEval>>,
    executing: Cell<bool>,
    pane: RefCell<Vec<String>>,
    pane_stack: RefCell<Vec<Vec<String>>>,
    base_dir: RefCell<Option<PathBuf>>,
    debug: RefCell<Vec<String>>,
    fail_debug: Cell<bool>,
    version: HmVersion,
    calls: RefCell<Vec<Call>>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            buffer: RefCell::default(),
            vars: RefCell::default(),
            eval_script: RefCell::default(),
            executing: Cell::new(true),
            pane: RefCell::default(),
            pane_stack: RefCell::default(),
            base_dir: RefCell::default(),
            debug: RefCell::default(),
            fail_debug: Cell::new(false),
            version: HmVersion(912.99),
            calls: RefCell::default(),
        }
    }

    pub fn with_version(mut self, version: HmVersion) -> Self {
        self.version = version;
        self
    }

    /// Load a document; the caret goes to the start, any selection is cleared.
    pub fn with_text(self, text: &str) -> Self {
        {
            let mut b = self.buffer.borrow_mut();
            b.text = text.to_owned();
            b.selection = None;
            b.caret_line = 0;
            b.caret_column = 0;
        }
        self
    }

    pub fn with_file_path(self, path: impl Into<PathBuf>) -> Self {
        self.buffer.borrow_mut().file_path = Some(path.into());
        self
    }

    /// Select the byte range `start..end` of the document.
    pub fn select(&self, start: usize, end: usize) {
        self.buffer.borrow_mut().selection = Some((start.min(end), start.max(end)));
    }

    /// Place the caret on zero-based `line`, `column`.
    pub fn move_caret(&self, line: usize, column: usize) {
        let mut b = self.buffer.borrow_mut();
        b.caret_line = line;
        b.caret_column = column;
    }

    pub fn move_mouse(&self, lineno: i32, column: i32, x: i32, y: i32) {
        self.buffer.borrow_mut().mouse = (lineno, column, x, y);
    }

    pub fn set_executing(&self, executing: bool) {
        self.executing.set(executing);
    }

    /// Queue the result for the next `eval_macro` or `exec_macro_file`.
    /// Unscripted evaluations succeed with result 1.
    pub fn script_eval(&self, raw: RawEval) {
        self.eval_script.borrow_mut().push_back(raw);
    }

    /// Make `debug_info` fail, to exercise error paths.
    pub fn fail_debug_info(&self, fail: bool) {
        self.fail_debug.set(fail);
    }

    // ── Inspection ────────────────────────────────────────────────────────────

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn text(&self) -> String {
        self.buffer.borrow().text.clone()
    }

    pub fn pane_lines(&self) -> Vec<String> {
        self.pane.borrow().clone()
    }

    pub fn base_dir(&self) -> Option<PathBuf> {
        self.base_dir.borrow().clone()
    }

    pub fn debug_log(&self) -> Vec<String> {
        self.debug.borrow().clone()
    }

    /// Every expression passed to `eval_macro`, in order.
    pub fn evaluated(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::EvalMacro(e) => Some(e.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn next_eval(&self) -> RawEval {
        self.eval_script.borrow_mut().pop_front().unwrap_or(RawEval {
            result: 1,
            ..RawEval::default()
        })
    }
}

impl Host for MemoryHost {
    fn encoding_from_file(&self, path: &Path) -> Result<Encoding> {
        self.record(Call::EncodingFromFile(path.to_owned()));
        fs::metadata(path)?;
        Ok(Encoding::from_hm_encode(FILE_ENCODE))
    }

    fn encoding_from_hm_encode(&self, hm_encode: i32) -> Result<Encoding> {
        self.record(Call::EncodingFromHmEncode(hm_encode));
        Ok(Encoding::from_hm_encode(hm_encode))
    }

    fn read_all_text(&self, path: &Path, hm_encode: i32) -> Result<Option<String>> {
        self.record(Call::ReadAllText(path.to_owned(), hm_encode));
        // Only UTF-8 is decoded here; anything else reads as a host failure.
        if hm_encode != FILE_ENCODE {
            return Ok(None);
        }
        Ok(fs::read(path).ok().and_then(|b| String::from_utf8(b).ok()))
    }

    fn total_text(&self) -> Result<String> {
        self.record(Call::TotalText);
        Ok(self.text())
    }

    fn set_total_text(&self, text: &str) -> Result<()> {
        self.record(Call::SetTotalText(text.to_owned()));
        let mut b = self.buffer.borrow_mut();
        b.text = text.to_owned();
        b.selection = None;
        Ok(())
    }

    fn selected_text(&self) -> Result<String> {
        self.record(Call::SelectedText);
        let b = self.buffer.borrow();
        Ok(b.selection
            .and_then(|(s, e)| b.text.get(s..e))
            .unwrap_or_default()
            .to_owned())
    }

    /// Replaces the selection and clears it.  Without a selection, or when
    /// the selected range does not fall on character boundaries, nothing is
    /// replaced; the native host guards the insert with `if (selecting)` the
    /// same way.
    fn set_selected_text(&self, text: &str) -> Result<()> {
        self.record(Call::SetSelectedText(text.to_owned()));
        let mut b = self.buffer.borrow_mut();
        if let Some((s, e)) = b.selection.take() {
            if b.text.is_char_boundary(s) && b.text.is_char_boundary(e) && e <= b.text.len() {
                b.text.replace_range(s..e, text);
            }
        }
        Ok(())
    }

    fn line_text(&self) -> Result<String> {
        self.record(Call::LineText);
        let b = self.buffer.borrow();
        Ok(b.line_range(b.caret_line)
            .map(|(s, e)| b.text[s..e].to_owned())
            .unwrap_or_default())
    }

    fn set_line_text(&self, text: &str) -> Result<()> {
        self.record(Call::SetLineText(text.to_owned()));
        let mut b = self.buffer.borrow_mut();
        let line = b.caret_line;
        match b.line_range(line) {
            Some((s, e)) => {
                b.text.replace_range(s..e, text);
                Ok(())
            }
            None => Err(HmError::Host(format!("no line {}", line + 1))),
        }
    }

    fn cursor_pos(&self) -> Result<(i32, i32)> {
        self.record(Call::CursorPos);
        let b = self.buffer.borrow();
        // Host line numbers are one-based, columns zero-based.
        let lineno = i32::try_from(b.caret_line)
            .ok()
            .and_then(|l| l.checked_add(1))
            .ok_or_else(|| HmError::Host(format!("caret line {} out of range", b.caret_line)))?;
        let column = i32::try_from(b.caret_column)
            .map_err(|_| HmError::Host(format!("caret column {} out of range", b.caret_column)))?;
        Ok((lineno, column))
    }

    fn mouse_pos(&self) -> Result<(i32, i32, i32, i32)> {
        self.record(Call::MousePos);
        Ok(self.buffer.borrow().mouse)
    }

    fn file_path(&self) -> Result<Option<PathBuf>> {
        self.record(Call::FilePath);
        Ok(self.buffer.borrow().file_path.clone())
    }

    fn get_var(&self, name: &str) -> Result<MacroValue> {
        self.record(Call::GetVar(name.to_owned()));
        if let Some(v) = self.vars.borrow().get(name) {
            return Ok(v.clone());
        }
        // Unset variables read as zero / empty, like the macro language.
        match name.chars().next() {
            Some('#') => Ok(MacroValue::Num(0)),
            Some('$') => Ok(MacroValue::Str(String::new())),
            _ => Err(HmError::Host(format!("unknown symbol: {name}"))),
        }
    }

    fn set_var(&self, name: &str, value: &MacroValue) -> Result<()> {
        self.record(Call::SetVar(name.to_owned()));
        // Same sigil/kind rule the editor applies to the generated assignment.
        if script::assignment(name, value).is_none() {
            return Err(HmError::Host(format!("type mismatch assigning {name}")));
        }
        self.vars.borrow_mut().insert(name.to_owned(), value.clone());
        Ok(())
    }

    fn eval_macro(&self, expression: &str) -> Result<RawEval> {
        self.record(Call::EvalMacro(expression.to_owned()));
        Ok(self.next_eval())
    }

    fn is_macro_executing(&self) -> Result<bool> {
        self.record(Call::IsMacroExecuting);
        Ok(self.executing.get())
    }

    fn exec_macro_file(&self, path: &Path) -> Result<RawEval> {
        self.record(Call::ExecMacroFile(path.to_owned()));
        if self.executing.get() {
            return Ok(RawEval {
                result: -1,
                message: String::new(),
                error_message: "a macro is already executing".into(),
            });
        }
        Ok(self.next_eval())
    }

    fn output(&self, text: &str) -> Result<i32> {
        self.record(Call::Output(text.to_owned()));
        self.pane.borrow_mut().push(text.to_owned());
        Ok(1)
    }

    fn push(&self) -> Result<i32> {
        self.record(Call::Push);
        let saved = self.pane.borrow().clone();
        self.pane_stack.borrow_mut().push(saved);
        Ok(1)
    }

    fn pop(&self) -> Result<i32> {
        self.record(Call::Pop);
        match self.pane_stack.borrow_mut().pop() {
            Some(saved) => {
                *self.pane.borrow_mut() = saved;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn send_message(&self, command_id: i32) -> Result<isize> {
        self.record(Call::SendMessage(command_id));
        if command_id == crate::output_pane::CMD_CLEAR {
            self.pane.borrow_mut().clear();
        }
        Ok(0)
    }

    fn set_base_dir(&self, dir: &Path) -> Result<i32> {
        self.record(Call::SetBaseDir(dir.to_owned()));
        *self.base_dir.borrow_mut() = Some(dir.to_owned());
        Ok(1)
    }

    fn debug_info(&self, text: &str) -> Result<()> {
        self.record(Call::DebugInfo(text.to_owned()));
        if self.fail_debug.get() {
            return Err(HmError::Host("debug channel closed".into()));
        }
        self.debug.borrow_mut().push(text.to_owned());
        Ok(())
    }

    fn version(&self) -> Result<HmVersion> {
        self.record(Call::Version);
        Ok(self.version)
    }
}
