// ── Central error type ────────────────────────────────────────────────────────
//
// All fallible operations in hmscript return `error::Result<T>`.  Errors raised
// by host primitives pass through the facades unchanged; the facades add only
// `FileNotFound` (checked before any host call) and `InvalidVarName`.

use std::path::PathBuf;

/// Every error that hmscript can produce.
#[derive(Debug, thiserror::Error)]
pub enum HmError {
    /// A Win32 API call returned a failure code.
    #[error("{function} failed (error {code:#010x})")]
    Win32 {
        /// The name of the failing function, for display purposes.
        function: &'static str,
        /// The raw Win32 error code (`GetLastError()` value) or HRESULT.
        code: u32,
    },

    /// A standard I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The path handed to a file operation does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The host reported failure while reading a file's text.
    #[error("host could not read {}", .0.display())]
    ReadFailed(PathBuf),

    /// A macro variable name lacks the `#` or `$` sigil.
    #[error("macro variable cannot be assigned: {0}")]
    InvalidVarName(String),

    /// The host does not export `function`, typically because it predates
    /// version `required`.
    #[error("{function} is unavailable (requires Hidemaru {required:.2} or later)")]
    Unsupported {
        function: &'static str,
        required: f64,
    },

    /// Any other failure reported by the host.
    #[error("host error: {0}")]
    Host(String),

    /// The configuration file could not be parsed or written.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

// Convert a windows-crate error (HRESULT) directly into an HmError so that
// `?` can be used on `windows::core::Result<T>` throughout the native host.
#[cfg(windows)]
impl From<windows::core::Error> for HmError {
    fn from(e: windows::core::Error) -> Self {
        // HRESULT.0 is i32; reinterpret bits as u32 for display purposes.
        Self::Win32 {
            function: "windows",
            code: e.code().0 as u32,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win32_display_is_hex() {
        let e = HmError::Win32 { function: "LoadLibraryW", code: 126 };
        assert_eq!(e.to_string(), "LoadLibraryW failed (error 0x0000007e)");
    }

    #[test]
    fn unsupported_names_the_version() {
        let e = HmError::Unsupported { function: "Hidemaru_AnalyzeEncoding", required: 890.0 };
        assert_eq!(
            e.to_string(),
            "Hidemaru_AnalyzeEncoding is unavailable (requires Hidemaru 890.00 or later)"
        );
    }

    #[test]
    fn io_error_converts_with_question_mark() {
        fn open() -> Result<()> {
            Err::<(), _>(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))?;
            Ok(())
        }
        assert!(matches!(open(), Err(HmError::Io(_))));
    }
}
