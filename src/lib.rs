// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except:
//   • `host::native` – Win32 FFI and the Hidemaru exports
// Each unsafe block in that module MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]

//! Object-style access to the Hidemaru editor from code running inside it.
//!
//! [`Hidemaru`] hands out one facade per area: [`File`](file::File),
//! [`Edit`](edit::Edit), [`Macro`](macros::Macro) and
//! [`OutputPane`](output_pane::OutputPane).  Each method forwards to one
//! primitive of a [`Host`]; on Windows that is `host::native::NativeHost`,
//! elsewhere (and in tests) [`MemoryHost`](host::memory::MemoryHost).
//!
//! ```
//! use hmscript::{host::memory::MemoryHost, Hidemaru};
//!
//! let hm = Hidemaru::new(MemoryHost::new().with_text("hello"));
//! assert_eq!(hm.edit().total_text()?, "hello");
//! hm.macros().var().set("#count", 3)?;
//! assert!(hm.macros().var().set("count", 3).is_err());
//! # Ok::<(), hmscript::HmError>(())
//! ```

pub mod config;
pub mod edit;
pub mod error;
pub mod file;
pub mod hidemaru;
pub mod host;
pub mod macros;
pub mod output_pane;
pub mod text;
pub mod version;

pub use config::Config;
pub use edit::{CursorPos, MousePos};
pub use error::{HmError, Result};
pub use hidemaru::Hidemaru;
pub use host::Host;
pub use macros::{MacroError, MacroResult, MacroValue};
pub use text::Encoding;
pub use version::HmVersion;
