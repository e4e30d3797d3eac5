// ── Exported host functions ───────────────────────────────────────────────────
//
// Function-pointer types for the `Hidemaru_*` exports of hidemaru.exe and the
// exports of HmOutputPane.dll, and the code that looks them up.  Every
// pointer is optional: older hosts simply lack some exports.

#![allow(unsafe_code)]

use std::path::Path;

use windows::{
    core::{s, PCWSTR},
    Win32::{
        Foundation::{BOOL, HGLOBAL, HMODULE, HWND, POINT},
        System::LibraryLoader::{FreeLibrary, GetProcAddress, LoadLibraryW},
    },
};

use crate::error::{HmError, Result};

use super::wide_path;

// ── hidemaru.exe ──────────────────────────────────────────────────────────────

pub(super) type FnGetTotalTextUnicode = unsafe extern "system" fn() -> HGLOBAL;
pub(super) type FnGetSelectedTextUnicode = unsafe extern "system" fn() -> HGLOBAL;
pub(super) type FnGetLineTextUnicode = unsafe extern "system" fn(lineno: i32) -> HGLOBAL;
pub(super) type FnGetCursorPosUnicode =
    unsafe extern "system" fn(lineno: *mut i32, column: *mut i32) -> BOOL;
pub(super) type FnGetCursorPosUnicodeFromMousePos =
    unsafe extern "system" fn(point: *mut POINT, lineno: *mut i32, column: *mut i32) -> BOOL;
pub(super) type FnEvalMacro = unsafe extern "system" fn(source: *const u16) -> BOOL;
pub(super) type FnCheckQueueStatus = unsafe extern "system" fn() -> BOOL;
pub(super) type FnGetCurrentWindowHandle = unsafe extern "system" fn() -> HWND;
pub(super) type FnGetDllFuncCalledType = unsafe extern "system" fn(n: i32) -> i32;
pub(super) type FnAnalyzeEncoding =
    unsafe extern "system" fn(file_name: *const u16, l1: isize, l2: isize) -> i32;
pub(super) type FnLoadFileUnicode = unsafe extern "system" fn(
    file_name: *const u16,
    encode: i32,
    cwch_out: *mut u32,
    l1: isize,
    l2: isize,
) -> HGLOBAL;

// ── HmOutputPane.dll ──────────────────────────────────────────────────────────

pub(super) type FnPaneOutputW = unsafe extern "system" fn(hwnd: HWND, text: *const u16) -> BOOL;
pub(super) type FnPanePush = unsafe extern "system" fn(hwnd: HWND) -> BOOL;
pub(super) type FnPanePop = unsafe extern "system" fn(hwnd: HWND) -> BOOL;
pub(super) type FnPaneGetWindowHandle = unsafe extern "system" fn(hwnd: HWND) -> HWND;

// ── Library ───────────────────────────────────────────────────────────────────

/// RAII handle to a loaded module.  `FreeLibrary` is called on `Drop`.
pub(super) struct Library(HMODULE);

impl Library {
    pub(super) fn load(path: &Path) -> Result<Self> {
        let wpath = wide_path(path);
        // SAFETY: wpath is a valid null-terminated UTF-16 string that outlives
        // the call.  Loading our own host exe only bumps its reference count.
        let module = unsafe { LoadLibraryW(PCWSTR(wpath.as_ptr())) }.map_err(HmError::from)?;
        Ok(Self(module))
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        // SAFETY: self.0 came from a successful LoadLibraryW and has not been
        // freed.  NativeHost drops its function pointers together with this.
        unsafe {
            let _ = FreeLibrary(self.0);
        }
    }
}

/// Look up an export and reinterpret it as the function type of the
/// destination field.
macro_rules! bind {
    ($lib:expr, $name:literal) => {
        // SAFETY: the module handle is live; the name is a null-terminated
        // ANSI literal.  The destination type matches the documented
        // signature of the export.
        unsafe { GetProcAddress($lib.0, s!($name)) }.map(|f| unsafe { std::mem::transmute(f) })
    };
}

/// Exports of hidemaru.exe.
#[derive(Clone, Copy)]
pub(super) struct HostExports {
    pub(super) get_total_text: Option<FnGetTotalTextUnicode>,
    pub(super) get_selected_text: Option<FnGetSelectedTextUnicode>,
    pub(super) get_line_text: Option<FnGetLineTextUnicode>,
    pub(super) get_cursor_pos: Option<FnGetCursorPosUnicode>,
    pub(super) get_cursor_pos_from_mouse_pos: Option<FnGetCursorPosUnicodeFromMousePos>,
    pub(super) eval_macro: Option<FnEvalMacro>,
    pub(super) check_queue_status: Option<FnCheckQueueStatus>,
    pub(super) get_current_window_handle: Option<FnGetCurrentWindowHandle>,
    pub(super) get_dll_func_called_type: Option<FnGetDllFuncCalledType>,
    pub(super) analyze_encoding: Option<FnAnalyzeEncoding>,
    pub(super) load_file_unicode: Option<FnLoadFileUnicode>,
}

impl HostExports {
    /// `file_api` selects the exports that only exist on 8.90 and later.
    pub(super) fn bind(lib: &Library, file_api: bool) -> Self {
        let mut exports = Self {
            get_total_text: bind!(lib, "Hidemaru_GetTotalTextUnicode"),
            get_selected_text: bind!(lib, "Hidemaru_GetSelectedTextUnicode"),
            get_line_text: bind!(lib, "Hidemaru_GetLineTextUnicode"),
            get_cursor_pos: bind!(lib, "Hidemaru_GetCursorPosUnicode"),
            get_cursor_pos_from_mouse_pos: bind!(lib, "Hidemaru_GetCursorPosUnicodeFromMousePos"),
            eval_macro: bind!(lib, "Hidemaru_EvalMacro"),
            check_queue_status: bind!(lib, "Hidemaru_CheckQueueStatus"),
            get_current_window_handle: bind!(lib, "Hidemaru_GetCurrentWindowHandle"),
            get_dll_func_called_type: bind!(lib, "Hidemaru_GetDllFuncCalledType"),
            analyze_encoding: None,
            load_file_unicode: None,
        };
        if file_api {
            exports.analyze_encoding = bind!(lib, "Hidemaru_AnalyzeEncoding");
            exports.load_file_unicode = bind!(lib, "Hidemaru_LoadFileUnicode");
        }
        exports
    }
}

/// Exports of HmOutputPane.dll.
#[derive(Clone, Copy)]
pub(super) struct PaneExports {
    pub(super) output_w: Option<FnPaneOutputW>,
    pub(super) push: Option<FnPanePush>,
    pub(super) pop: Option<FnPanePop>,
    pub(super) get_window_handle: Option<FnPaneGetWindowHandle>,
}

impl PaneExports {
    pub(super) fn bind(lib: &Library) -> Self {
        Self {
            output_w: bind!(lib, "OutputW"),
            push: bind!(lib, "Push"),
            pop: bind!(lib, "Pop"),
            get_window_handle: bind!(lib, "GetWindowHandle"),
        }
    }
}

/// Unwrap an optional export or report which one is missing.
pub(super) fn need<F: Copy>(f: Option<F>, function: &'static str, required: f64) -> Result<F> {
    f.ok_or(HmError::Unsupported { function, required })
}
