// ── Encoding descriptor ───────────────────────────────────────────────────────
//
// Pure-Rust value type; no Win32 imports.  The native host resolves a
// Hidemaru `encode` number through `Encoding::from_hm_encode`.

use serde::{Deserialize, Serialize};

/// The encoding of a file as the host sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoding {
    /// Name usable with common text codecs, e.g. `"cp932"` or `"utf_8"`.
    pub name: String,
    /// Microsoft code page number (932, 65001, …).  0 when there is none.
    pub codepage: u32,
    /// Hidemaru's own `encode` value (1, 6, …).
    pub hm_encode: i32,
}

// ── encode → (codepage, name) ─────────────────────────────────────────────────

/// Indexed by Hidemaru `encode`.  Entry 0 is the "unknown" slot.
const ENCODE_TABLE: [(u32, &str); 28] = [
    (0, "unknown"),
    (932, "cp932"),          //  1 Shift-JIS
    (1200, "utf_16_le"),     //  2
    (51932, "euc_jp"),       //  3
    (50221, "iso2022_jp"),   //  4 JIS
    (65000, "utf_7"),        //  5
    (65001, "utf_8"),        //  6
    (1201, "utf_16_be"),     //  7
    (1252, "cp1252"),        //  8 Western European
    (936, "gb2312"),         //  9 Simplified Chinese
    (950, "big5"),           // 10 Traditional Chinese
    (949, "cp949"),          // 11 Korean
    (1361, "johab"),         // 12 Korean (Johab)
    (1250, "cp1250"),        // 13 Central European
    (1257, "cp1257"),        // 14 Baltic
    (1253, "cp1253"),        // 15 Greek
    (1251, "cp1251"),        // 16 Cyrillic
    (42, "symbol"),          // 17
    (1254, "cp1254"),        // 18 Turkish
    (1255, "cp1255"),        // 19 Hebrew
    (1256, "cp1256"),        // 20 Arabic
    (874, "cp874"),          // 21 Thai
    (1258, "cp1258"),        // 22 Vietnamese
    (10001, "mac_japanese"), // 23
    (850, "cp850"),          // 24 OEM/DOS
    (0, "other"),            // 25
    (12000, "utf_32_le"),    // 26
    (12001, "utf_32_be"),    // 27
];

impl Encoding {
    /// Describe a Hidemaru `encode` value.
    ///
    /// Values the table does not know (non-positive, or newer than this
    /// crate) get code page 0 and the name `"unknown"`, but keep `hm_encode`.
    pub fn from_hm_encode(hm_encode: i32) -> Self {
        let (codepage, name) = usize::try_from(hm_encode)
            .ok()
            .and_then(|i| ENCODE_TABLE.get(i))
            .copied()
            .unwrap_or(ENCODE_TABLE[0]);
        Self {
            name: name.to_owned(),
            codepage,
            hm_encode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_jis_and_utf8() {
        let sjis = Encoding::from_hm_encode(1);
        assert_eq!(sjis.codepage, 932);
        assert_eq!(sjis.name, "cp932");

        let utf8 = Encoding::from_hm_encode(6);
        assert_eq!(utf8.codepage, 65001);
        assert_eq!(utf8.name, "utf_8");
    }

    #[test]
    fn utf32_big_endian_is_last_entry() {
        let e = Encoding::from_hm_encode(27);
        assert_eq!(e.codepage, 12001);
    }

    #[test]
    fn unknown_values_keep_their_encode() {
        for v in [-1, 0, 28, 1000] {
            let e = Encoding::from_hm_encode(v);
            assert_eq!(e.codepage, 0);
            assert_eq!(e.name, "unknown");
            assert_eq!(e.hm_encode, v);
        }
    }

    #[test]
    fn serializes_as_plain_object() {
        let json = serde_json::to_string(&Encoding::from_hm_encode(6)).expect("serialize");
        assert_eq!(json, r#"{"name":"utf_8","codepage":65001,"hm_encode":6}"#);
    }
}
