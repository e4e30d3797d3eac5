// ── Hidemaru window message constants ─────────────────────────────────────────
//
// Sent via SendMessageW(hwnd_hidemaru, WM_*, wparam, lparam).
// Only the subset this crate uses is listed here.

use windows::Win32::UI::WindowsAndMessaging::WM_USER;

/// Query editor information.  WPARAM = `HIDEMARUINFO_*`; LPARAM = out buffer.
pub(super) const WM_HIDEMARUINFO: u32 = WM_USER + 181;
/// `WM_HIDEMARUINFO` selector: full path of the open file (UTF-16).
pub(super) const HIDEMARUINFO_GETFILEFULLPATH: usize = 4;

/// Non-zero while a macro is executing.
pub(super) const WM_ISMACROEXECUTING: u32 = WM_USER + 167;

/// Run a macro file while no macro is executing.
/// WPARAM = return buffer (first WCHAR = buffer length); LPARAM = file path.
pub(super) const WM_REMOTE_EXECMACRO_FILE: u32 = WM_USER + 271;

/// Run macro source text while no macro is executing.
/// WPARAM = return buffer (first WCHAR = buffer length); LPARAM = source.
pub(super) const WM_REMOTE_EXECMACRO_MEMORY: u32 = WM_USER + 272;
/// Size in WCHARs of the `WM_REMOTE_EXECMACRO_*` return buffers.
pub(super) const REMOTE_EXEC_RET_LEN: usize = 0x0f0f;

/// Buffer length in WCHARs for `HIDEMARUINFO_GETFILEFULLPATH`.
pub(super) const FILE_PATH_BUF_LEN: usize = 512;
