// ── Host version ──────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

/// Hidemaru version in its macro form, e.g. `866.05`.
///
/// The integer part is `100 * major + 10 * minor + build`.  The fraction is
/// the beta number (`.05` for β5); release builds carry `.99`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HmVersion(pub f64);

/// Oldest host that exports the `Hidemaru_*` text functions.
pub const MIN_SUPPORTED: HmVersion = HmVersion(866.0);
/// `HmOutputPane.dll` gained `SetBaseDir` here.
pub const SET_BASE_DIR_SINCE: HmVersion = HmVersion(877.0);
/// `Hidemaru_AnalyzeEncoding` / `Hidemaru_LoadFileUnicode` appeared here.
pub const FILE_API_SINCE: HmVersion = HmVersion(890.0);

impl HmVersion {
    /// Build from the four 16-bit parts of a `VS_FIXEDFILEINFO`.
    pub fn from_file_version(major: u16, minor: u16, build: u16, private: u16) -> Self {
        Self(
            100.0 * f64::from(major)
                + 10.0 * f64::from(minor)
                + f64::from(build)
                + 0.01 * f64::from(private),
        )
    }

    /// Build from the packed `dwFileVersionMS` / `dwFileVersionLS` words.
    pub fn from_packed(ms: u32, ls: u32) -> Self {
        Self::from_file_version(
            (ms >> 16) as u16,
            (ms & 0xFFFF) as u16,
            (ls >> 16) as u16,
            (ls & 0xFFFF) as u16,
        )
    }

    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for HmVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_build_has_99_fraction() {
        // 8.6.6.99
        let v = HmVersion::from_file_version(8, 6, 6, 99);
        assert_eq!(v.to_string(), "866.99");
    }

    #[test]
    fn beta_fraction_is_two_digits() {
        let v = HmVersion::from_packed((8 << 16) | 9, (1 << 16) | 5);
        assert_eq!(v.to_string(), "891.05");
    }

    #[test]
    fn thresholds_order() {
        assert!(MIN_SUPPORTED < SET_BASE_DIR_SINCE);
        assert!(SET_BASE_DIR_SINCE < FILE_API_SINCE);
        assert!(HmVersion::from_file_version(8, 9, 0, 99) >= FILE_API_SINCE);
    }
}
