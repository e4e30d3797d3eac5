// ── Native host ───────────────────────────────────────────────────────────────
//
// This is the only module where `unsafe` is permitted.  Every `unsafe` block
// MUST carry a `// SAFETY:` comment.
//
// ── Binding model ─────────────────────────────────────────────────────────────
//
// The crate runs inside hidemaru.exe (loaded as part of a macro DLL).  The
// editor exports `Hidemaru_*` functions from its own executable, so binding
// means `LoadLibraryW` on the current process image and `GetProcAddress` for
// each export.  The output pane lives in `HmOutputPane.dll` next to the exe.
//
// Drop order inside `NativeHost` (Rust drops fields in declaration order):
//   1. function-pointer tables (plain data)
//   2. `pane_lib`, then `exe_lib`; `FreeLibrary` runs last ✓
//
// Setters and macro variables go through macro evaluation; see
// `macros::script` for the generated source.

#![allow(unsafe_code)]

mod exports;
mod messages;

use std::{
    cell::RefCell,
    ffi::c_void,
    os::windows::ffi::OsStrExt,
    path::{Path, PathBuf},
};

use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{GetLastError, GlobalFree, HGLOBAL, HMODULE, HWND, LPARAM, POINT, WPARAM},
        Storage::FileSystem::{
            GetFileVersionInfoSizeW, GetFileVersionInfoW, VerQueryValueW, VS_FIXEDFILEINFO,
        },
        System::{
            Diagnostics::Debug::OutputDebugStringW,
            LibraryLoader::GetModuleFileNameW,
            Memory::{GlobalLock, GlobalUnlock},
        },
        UI::WindowsAndMessaging::{GetCursorPos, SendMessageW, WM_COMMAND},
    },
};

use exports::{need, HostExports, Library, PaneExports};
use messages::{
    FILE_PATH_BUF_LEN, HIDEMARUINFO_GETFILEFULLPATH, REMOTE_EXEC_RET_LEN, WM_HIDEMARUINFO,
    WM_ISMACROEXECUTING, WM_REMOTE_EXECMACRO_FILE, WM_REMOTE_EXECMACRO_MEMORY,
};

use crate::{
    config::Config,
    error::{HmError, Result},
    host::{Host, RawEval},
    macros::{script, MacroValue},
    text::Encoding,
    version::{HmVersion, FILE_API_SINCE, MIN_SUPPORTED, SET_BASE_DIR_SINCE},
};

const OUTPUT_PANE_DLL: &str = "HmOutputPane.dll";

/// Names of the mailbox exports below, as macros call them.
pub const PUSH_NUM_EXPORT: &str = "hmscript_push_num";
pub const PUSH_STR_EXPORT: &str = "hmscript_push_str";

// ── Variable mailbox ──────────────────────────────────────────────────────────
//
// Reading a macro variable means evaluating a macro that passes the value to
// one of these exports through `dllfuncw`.  The host calls back on the
// thread that is evaluating, so a thread-local slot is enough.

thread_local! {
    static MAILBOX: RefCell<Option<MacroValue>> = const { RefCell::new(None) };
}

/// Receive a numeric macro value.  Called by the host via `dllfuncw`.
#[no_mangle]
pub extern "system" fn hmscript_push_num(value: isize) -> isize {
    MAILBOX.with(|m| *m.borrow_mut() = Some(MacroValue::Num(value as i64)));
    1
}

/// Receive a string macro value.  Called by the host via `dllfuncw`.
///
/// # Safety
///
/// `value` must be null or point to a null-terminated UTF-16 string.
#[no_mangle]
pub unsafe extern "system" fn hmscript_push_str(value: *const u16) -> isize {
    // SAFETY: the caller guarantees a null-terminated UTF-16 string.
    let text = unsafe { wstr_to_string(value) }.unwrap_or_default();
    MAILBOX.with(|m| *m.borrow_mut() = Some(MacroValue::Str(text)));
    1
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// `s` as a null-terminated UTF-16 buffer.
fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

pub(super) fn wide_path(path: &Path) -> Vec<u16> {
    path.as_os_str().encode_wide().chain(std::iter::once(0)).collect()
}

/// Convert a null-terminated UTF-16 buffer to a `String`.
fn string_from_buf(buf: &[u16]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}

/// Copy a null-terminated UTF-16 string.
///
/// # Safety
///
/// `p` must be null or point to a null-terminated UTF-16 string.
unsafe fn wstr_to_string(p: *const u16) -> Option<String> {
    if p.is_null() {
        return None;
    }
    let mut len = 0;
    // SAFETY: the string is null-terminated, so every index up to and
    // including the terminator is in bounds.
    unsafe {
        while *p.add(len) != 0 {
            len += 1;
        }
        Some(String::from_utf16_lossy(std::slice::from_raw_parts(p, len)))
    }
}

/// Copy the text out of a host-allocated `HGLOBAL`, then free it.
///
/// # Safety
///
/// `hmem` must be null or a movable global block holding a null-terminated
/// UTF-16 string, ownership of which passes to us.
unsafe fn take_global_text(hmem: HGLOBAL) -> Option<String> {
    if hmem.0.is_null() {
        return None;
    }
    // SAFETY: hmem is a live global block handed to us by the host; it is
    // unlocked before being freed, and freed exactly once.
    unsafe {
        let p = GlobalLock(hmem) as *const u16;
        let text = wstr_to_string(p);
        if !p.is_null() {
            let _ = GlobalUnlock(hmem);
        }
        let _ = GlobalFree(hmem);
        text
    }
}

fn last_error(function: &'static str) -> HmError {
    // SAFETY: GetLastError reads thread-local state set by the just-failed
    // call; no Win32 calls between them.
    let code = unsafe { GetLastError().0 };
    HmError::Win32 { function, code }
}

/// Full path of the current process image.
fn current_exe_path() -> Result<PathBuf> {
    let mut buf = vec![0u16; 32_768];
    // SAFETY: a null module handle means the current process; buf is writable
    // for its whole length.
    let len = unsafe { GetModuleFileNameW(HMODULE::default(), &mut buf) } as usize;
    if len == 0 {
        return Err(last_error("GetModuleFileNameW"));
    }
    Ok(PathBuf::from(String::from_utf16_lossy(&buf[..len])))
}

/// Read the fixed file version of `path`.
fn query_file_version(path: &Path) -> Result<HmVersion> {
    let wpath = wide_path(path);
    // SAFETY: wpath is null-terminated UTF-16 and outlives the call.
    let size = unsafe { GetFileVersionInfoSizeW(PCWSTR(wpath.as_ptr()), None) };
    if size == 0 {
        return Err(last_error("GetFileVersionInfoSizeW"));
    }

    let mut block = vec![0u8; size as usize];
    // SAFETY: block is exactly `size` writable bytes, as the API requires.
    unsafe {
        GetFileVersionInfoW(PCWSTR(wpath.as_ptr()), 0, size, block.as_mut_ptr().cast())
    }
    .map_err(HmError::from)?;

    let mut info: *mut c_void = std::ptr::null_mut();
    let mut len = 0u32;
    // SAFETY: block holds a version resource filled in above; `\` selects the
    // root VS_FIXEDFILEINFO, which VerQueryValueW points into `block`.
    let ok = unsafe { VerQueryValueW(block.as_ptr().cast(), w!("\\"), &mut info, &mut len) };
    if !ok.as_bool() || info.is_null() || (len as usize) < std::mem::size_of::<VS_FIXEDFILEINFO>() {
        return Err(HmError::Host(format!("{} has no version resource", path.display())));
    }
    // SAFETY: info points at a VS_FIXEDFILEINFO inside `block`, which is alive.
    let fixed = unsafe { &*(info as *const VS_FIXEDFILEINFO) };
    Ok(HmVersion::from_packed(fixed.dwFileVersionMS, fixed.dwFileVersionLS))
}

// ── NativeHost ────────────────────────────────────────────────────────────────

/// The Hidemaru process this code is loaded into.
pub struct NativeHost {
    exports: HostExports,
    pane: Option<PaneExports>,
    version: HmVersion,
    pane_dll_path: PathBuf,
    // Libraries last: see drop order above.
    _pane_lib: Option<Library>,
    _exe_lib: Library,
}

impl NativeHost {
    /// Bind to the running editor.
    ///
    /// Fails if the host is older than `config.min_version` or the executable
    /// cannot be loaded.  A missing output pane DLL is not an error; the pane
    /// methods then report `Unsupported`.
    pub fn bind(config: &Config) -> Result<Self> {
        let exe_path = current_exe_path()?;
        let version_path = config.hidemaru_exe.as_deref().unwrap_or(&exe_path);
        let version = query_file_version(version_path)?;
        let floor = if config.min_version > MIN_SUPPORTED { config.min_version } else { MIN_SUPPORTED };
        if version < floor {
            return Err(HmError::Unsupported {
                function: "Hidemaru_GetTotalTextUnicode",
                required: floor.as_f64(),
            });
        }

        let exe_lib = Library::load(&exe_path)?;
        let exports = HostExports::bind(&exe_lib, version >= FILE_API_SINCE);
        log::debug!("bound to {} (version {version})", exe_path.display());

        let pane_dll_path = config.output_pane_dll.clone().unwrap_or_else(|| {
            exe_path
                .parent()
                .map(|dir| dir.join(OUTPUT_PANE_DLL))
                .unwrap_or_else(|| PathBuf::from(OUTPUT_PANE_DLL))
        });
        let (pane_lib, pane) = match Library::load(&pane_dll_path) {
            Ok(lib) => {
                let pane = PaneExports::bind(&lib);
                (Some(lib), Some(pane))
            }
            Err(e) => {
                log::warn!("output pane unavailable ({}): {e}", pane_dll_path.display());
                (None, None)
            }
        };

        Ok(Self {
            exports,
            pane,
            version,
            pane_dll_path,
            _pane_lib: pane_lib,
            _exe_lib: exe_lib,
        })
    }

    /// Main window of the editor instance that loaded us.
    pub fn window_handle(&self) -> Result<HWND> {
        let f = need(self.exports.get_current_window_handle, "Hidemaru_GetCurrentWindowHandle", 866.0)?;
        // SAFETY: bound export with no arguments.
        Ok(unsafe { f() })
    }

    /// Whether the editor has input queued (keys, clicks) a long-running
    /// script should yield to.
    pub fn check_queue_status(&self) -> Result<bool> {
        let f = need(self.exports.check_queue_status, "Hidemaru_CheckQueueStatus", 866.0)?;
        // SAFETY: bound export with no arguments.
        Ok(unsafe { f() }.as_bool())
    }

    fn pane(&self) -> Result<&PaneExports> {
        self.pane.as_ref().ok_or(HmError::Unsupported {
            function: "HmOutputPane.dll",
            required: MIN_SUPPORTED.as_f64(),
        })
    }

    /// Evaluate `source` and turn a failed evaluation into an error.
    fn run(&self, source: &str) -> Result<RawEval> {
        let raw = self.eval_macro(source)?;
        if raw.result < 1 {
            return Err(HmError::Host(raw.error_message));
        }
        Ok(raw)
    }

    /// Run a macro while none is executing, via `WM_REMOTE_EXECMACRO_MEMORY`.
    fn remote_exec(&self, source: &str) -> Result<RawEval> {
        self.remote_send(WM_REMOTE_EXECMACRO_MEMORY, &wide(source))
    }

    /// Send one of the `WM_REMOTE_EXECMACRO_*` messages with `arg` (null
    /// terminated UTF-16) as LPARAM and collect the return buffer.
    fn remote_send(&self, msg: u32, arg: &[u16]) -> Result<RawEval> {
        let hwnd = self.window_handle()?;
        let mut ret = vec![0u16; REMOTE_EXEC_RET_LEN + 1];
        ret[0] = REMOTE_EXEC_RET_LEN as u16;
        // SAFETY: hwnd is the editor window; both buffers are null-terminated
        // UTF-16, live for the duration of the synchronous SendMessageW, and
        // `ret` is as long as its first WCHAR says.
        let ok = unsafe {
            SendMessageW(
                hwnd,
                msg,
                WPARAM(ret.as_mut_ptr() as usize),
                LPARAM(arg.as_ptr() as isize),
            )
        };
        let message = string_from_buf(&ret);
        Ok(if ok.0 != 0 {
            RawEval { result: 1, message, error_message: String::new() }
        } else {
            RawEval { result: 0, message, error_message: "remote macro execution failed".into() }
        })
    }
}

impl Host for NativeHost {
    // ── File ──────────────────────────────────────────────────────────────────

    fn encoding_from_file(&self, path: &Path) -> Result<Encoding> {
        let f = need(self.exports.analyze_encoding, "Hidemaru_AnalyzeEncoding", FILE_API_SINCE.as_f64())?;
        let wpath = wide_path(path);
        // SAFETY: wpath is null-terminated UTF-16; the two reserved params are 0.
        let hm_encode = unsafe { f(wpath.as_ptr(), 0, 0) };
        Ok(Encoding::from_hm_encode(hm_encode))
    }

    fn encoding_from_hm_encode(&self, hm_encode: i32) -> Result<Encoding> {
        Ok(Encoding::from_hm_encode(hm_encode))
    }

    fn read_all_text(&self, path: &Path, hm_encode: i32) -> Result<Option<String>> {
        let f = need(self.exports.load_file_unicode, "Hidemaru_LoadFileUnicode", FILE_API_SINCE.as_f64())?;
        let wpath = wide_path(path);
        let mut cwch = 0u32;
        // SAFETY: wpath is null-terminated UTF-16, cwch is a valid out param;
        // the returned block is ours to free.
        let text = unsafe { take_global_text(f(wpath.as_ptr(), hm_encode, &mut cwch, 0, 0)) };
        Ok(text)
    }

    // ── Edit ──────────────────────────────────────────────────────────────────

    fn total_text(&self) -> Result<String> {
        let f = need(self.exports.get_total_text, "Hidemaru_GetTotalTextUnicode", 866.0)?;
        // SAFETY: bound export; the returned block is ours to free.
        Ok(unsafe { take_global_text(f()) }.unwrap_or_default())
    }

    fn set_total_text(&self, text: &str) -> Result<()> {
        self.run(&script::replace_total_text(text)).map(drop)
    }

    fn selected_text(&self) -> Result<String> {
        let f = need(self.exports.get_selected_text, "Hidemaru_GetSelectedTextUnicode", 866.0)?;
        // SAFETY: bound export; the returned block is ours to free.
        Ok(unsafe { take_global_text(f()) }.unwrap_or_default())
    }

    fn set_selected_text(&self, text: &str) -> Result<()> {
        self.run(&script::replace_selected_text(text)).map(drop)
    }

    fn line_text(&self) -> Result<String> {
        let (lineno, column) = self.cursor_pos()?;
        if lineno < 0 || column < 0 {
            return Ok(String::new());
        }
        let f = need(self.exports.get_line_text, "Hidemaru_GetLineTextUnicode", 866.0)?;
        // SAFETY: bound export; lineno came from the host; the returned block
        // is ours to free.
        Ok(unsafe { take_global_text(f(lineno)) }.unwrap_or_default())
    }

    fn set_line_text(&self, text: &str) -> Result<()> {
        let (lineno, column) = self.cursor_pos()?;
        self.run(&script::replace_line_text(text, lineno, column)).map(drop)
    }

    fn cursor_pos(&self) -> Result<(i32, i32)> {
        let f = need(self.exports.get_cursor_pos, "Hidemaru_GetCursorPosUnicode", 866.0)?;
        let (mut lineno, mut column) = (-1, -1);
        // SAFETY: both out params are valid, writable i32s.
        let ok = unsafe { f(&mut lineno, &mut column) };
        Ok(if ok.as_bool() { (lineno, column) } else { (-1, -1) })
    }

    fn mouse_pos(&self) -> Result<(i32, i32, i32, i32)> {
        const UNKNOWN: (i32, i32, i32, i32) = (-1, -1, -1, -1);
        let f = need(
            self.exports.get_cursor_pos_from_mouse_pos,
            "Hidemaru_GetCursorPosUnicodeFromMousePos",
            873.0,
        )?;

        let mut pt = POINT::default();
        // SAFETY: pt is a valid, writable POINT.
        if unsafe { GetCursorPos(&mut pt) }.is_err() {
            return Ok(UNKNOWN);
        }
        let (mut lineno, mut column) = (-1, -1);
        // SAFETY: a null POINT asks the host to use the current mouse
        // position; the out params are valid, writable i32s.
        let ok = unsafe { f(std::ptr::null_mut(), &mut lineno, &mut column) };
        if !ok.as_bool() {
            return Ok(UNKNOWN);
        }
        Ok((lineno, column, pt.x, pt.y))
    }

    fn file_path(&self) -> Result<Option<PathBuf>> {
        let hwnd = self.window_handle()?;
        if hwnd.0.is_null() {
            return Ok(None);
        }
        let mut buf = vec![0u16; FILE_PATH_BUF_LEN];
        // SAFETY: hwnd is the editor window; buf is FILE_PATH_BUF_LEN WCHARs,
        // enough for the path the host writes.
        unsafe {
            let _ = SendMessageW(
                hwnd,
                WM_HIDEMARUINFO,
                WPARAM(HIDEMARUINFO_GETFILEFULLPATH),
                LPARAM(buf.as_mut_ptr() as isize),
            );
        }
        let path = string_from_buf(&buf);
        Ok((!path.is_empty()).then(|| PathBuf::from(path)))
    }

    // ── Macro ─────────────────────────────────────────────────────────────────

    fn get_var(&self, name: &str) -> Result<MacroValue> {
        let f = need(self.exports.get_dll_func_called_type, "Hidemaru_GetDllFuncCalledType", 866.0)?;
        // SAFETY: bound export; -1 asks for the id of the calling DLL.
        let dll_id = unsafe { f(-1) };
        if dll_id == 0 {
            return Err(HmError::Host("not called from a macro DLL function".into()));
        }
        let source = script::hand_var_to_dll(name, dll_id, PUSH_NUM_EXPORT, PUSH_STR_EXPORT)
            .ok_or_else(|| HmError::Host(format!("unknown symbol: {name}")))?;

        MAILBOX.with(|m| m.borrow_mut().take());
        self.run(&source)?;
        MAILBOX
            .with(|m| m.borrow_mut().take())
            .ok_or_else(|| HmError::Host(format!("{name} was not delivered")))
    }

    fn set_var(&self, name: &str, value: &MacroValue) -> Result<()> {
        let source = script::assignment(name, value)
            .ok_or_else(|| HmError::Host(format!("type mismatch assigning {name}")))?;
        self.run(&source).map(drop)
    }

    fn eval_macro(&self, expression: &str) -> Result<RawEval> {
        if !self.is_macro_executing()? {
            return self.remote_exec(expression);
        }
        let f = need(self.exports.eval_macro, "Hidemaru_EvalMacro", 866.0)?;
        let source = wide(expression);
        // SAFETY: source is null-terminated UTF-16 that outlives the call.
        let result = unsafe { f(source.as_ptr()) }.0;
        Ok(if result != 0 {
            RawEval { result, message: String::new(), error_message: String::new() }
        } else {
            RawEval { result: 0, message: String::new(), error_message: "macro evaluation failed".into() }
        })
    }

    fn is_macro_executing(&self) -> Result<bool> {
        let hwnd = self.window_handle()?;
        if hwnd.0.is_null() {
            return Ok(false);
        }
        // SAFETY: hwnd is the editor window; the message takes no parameters.
        let r = unsafe { SendMessageW(hwnd, WM_ISMACROEXECUTING, WPARAM(0), LPARAM(0)) };
        Ok(r.0 != 0)
    }

    fn exec_macro_file(&self, path: &Path) -> Result<RawEval> {
        if self.is_macro_executing()? {
            return Ok(RawEval {
                result: -1,
                message: String::new(),
                error_message: "a macro is already executing".into(),
            });
        }
        self.remote_send(WM_REMOTE_EXECMACRO_FILE, &wide_path(path))
    }

    // ── Output pane ───────────────────────────────────────────────────────────

    fn output(&self, text: &str) -> Result<i32> {
        let f = need(self.pane()?.output_w, "OutputW", MIN_SUPPORTED.as_f64())?;
        let hwnd = self.window_handle()?;
        let wtext = wide(text);
        // SAFETY: hwnd is the editor window; wtext is null-terminated UTF-16.
        Ok(unsafe { f(hwnd, wtext.as_ptr()) }.0)
    }

    fn push(&self) -> Result<i32> {
        let f = need(self.pane()?.push, "Push", MIN_SUPPORTED.as_f64())?;
        let hwnd = self.window_handle()?;
        // SAFETY: hwnd is the editor window.
        Ok(unsafe { f(hwnd) }.0)
    }

    fn pop(&self) -> Result<i32> {
        let f = need(self.pane()?.pop, "Pop", MIN_SUPPORTED.as_f64())?;
        let hwnd = self.window_handle()?;
        // SAFETY: hwnd is the editor window.
        Ok(unsafe { f(hwnd) }.0)
    }

    fn send_message(&self, command_id: i32) -> Result<isize> {
        let f = need(self.pane()?.get_window_handle, "GetWindowHandle", MIN_SUPPORTED.as_f64())?;
        let hwnd = self.window_handle()?;
        // SAFETY: hwnd is the editor window.
        let pane_hwnd = unsafe { f(hwnd) };
        // SAFETY: pane_hwnd is the pane window (or null, which SendMessageW
        // rejects); WM_COMMAND carries the id in WPARAM only.
        let r = unsafe { SendMessageW(pane_hwnd, WM_COMMAND, WPARAM(command_id as usize), LPARAM(0)) };
        Ok(r.0)
    }

    fn set_base_dir(&self, dir: &Path) -> Result<i32> {
        if self.version < SET_BASE_DIR_SINCE {
            return Err(HmError::Unsupported {
                function: "SetBaseDir",
                required: SET_BASE_DIR_SINCE.as_f64(),
            });
        }
        let source = script::pane_set_base_dir(
            &self.pane_dll_path.to_string_lossy(),
            &dir.to_string_lossy(),
        );
        self.run(&source).map(|raw| raw.result)
    }

    // ── Misc ──────────────────────────────────────────────────────────────────

    fn debug_info(&self, text: &str) -> Result<()> {
        let wtext = wide(text);
        // SAFETY: wtext is null-terminated UTF-16 that outlives the call.
        unsafe { OutputDebugStringW(PCWSTR(wtext.as_ptr())) };
        Ok(())
    }

    fn version(&self) -> Result<HmVersion> {
        Ok(self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_from_buf_stops_at_nul() {
        let buf: Vec<u16> = "C:\\a.txt\0junk".encode_utf16().collect();
        assert_eq!(string_from_buf(&buf), "C:\\a.txt");
    }

    #[test]
    fn mailbox_receives_pushed_values() {
        hmscript_push_num(42);
        assert_eq!(MAILBOX.with(|m| m.borrow_mut().take()), Some(MacroValue::Num(42)));

        let w = wide("héllo");
        // SAFETY: w is null-terminated UTF-16.
        unsafe { hmscript_push_str(w.as_ptr()) };
        assert_eq!(MAILBOX.with(|m| m.borrow_mut().take()), Some(MacroValue::from("héllo")));
    }

    #[test]
    fn null_global_is_none() {
        // SAFETY: a null handle is explicitly allowed.
        assert_eq!(unsafe { take_global_text(HGLOBAL(std::ptr::null_mut())) }, None);
    }
}
