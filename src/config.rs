// ── Configuration ─────────────────────────────────────────────────────────────
//
// Reads and writes `%APPDATA%\hmscript\config.json`.
// No `unsafe`; pure safe Rust + serde_json.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{error::Result, version::HmVersion, version::MIN_SUPPORTED};

/// Settings for binding to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Executable whose version resource is read.  `None` = current process.
    pub hidemaru_exe: Option<PathBuf>,
    /// `HmOutputPane.dll` location.  `None` = next to the executable.
    pub output_pane_dll: Option<PathBuf>,
    /// Also send `debug_info` text to the `log` facade.
    pub echo_debug_to_log: bool,
    /// Refuse to bind to an older host.
    pub min_version: HmVersion,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hidemaru_exe: None,
            output_pane_dll: None,
            echo_debug_to_log: false,
            min_version: MIN_SUPPORTED,
        }
    }
}

// ── Path ──────────────────────────────────────────────────────────────────────

/// `%APPDATA%\hmscript\config.json`, or `None` if `APPDATA` is not set.
pub fn config_path() -> Option<PathBuf> {
    let appdata = std::env::var_os("APPDATA")?;
    let mut p = PathBuf::from(appdata);
    p.push("hmscript");
    p.push("config.json");
    Some(p)
}

impl Config {
    /// Load from the default location.
    ///
    /// A missing or unreadable file yields the defaults; the embedding script
    /// keeps running.
    pub fn load() -> Self {
        config_path()
            .and_then(|p| Self::load_from(&p).ok())
            .unwrap_or_default()
    }

    /// Load from `path`, surfacing I/O and parse errors.
    pub fn load_from(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Write to `path` as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
