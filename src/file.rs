// ── File accessor ─────────────────────────────────────────────────────────────
//
// Encoding lookup and whole-file reads through the host.  Paths are checked
// for existence here, before the host is asked anything.

use std::path::{Path, PathBuf};

use crate::{
    error::{HmError, Result},
    host::Host,
    text::Encoding,
};

/// Fail with `FileNotFound` unless `path` exists.
pub(crate) fn require_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(HmError::FileNotFound(path.to_owned()))
    }
}

/// File operations backed by the host's encoding detection.
pub struct File<'h, H: Host + ?Sized> {
    host: &'h H,
}

impl<'h, H: Host + ?Sized> File<'h, H> {
    pub(crate) fn new(host: &'h H) -> Self {
        Self { host }
    }

    /// Open `path` for reading.
    ///
    /// With `hm_encode == None` the host detects the encoding; otherwise the
    /// given Hidemaru `encode` value is used as-is.
    pub fn open(&self, path: impl AsRef<Path>, hm_encode: Option<i32>) -> Result<StreamReader<'h, H>> {
        let path = path.as_ref();
        require_exists(path)?;
        let encoding = match hm_encode {
            None => self.host.encoding_from_file(path)?,
            Some(e) => self.host.encoding_from_hm_encode(e)?,
        };
        Ok(StreamReader {
            host: self.host,
            path: path.to_owned(),
            encoding,
        })
    }

    /// The host's idea of the encoding of `path`.
    pub fn get_encoding(&self, path: impl AsRef<Path>) -> Result<Encoding> {
        let path = path.as_ref();
        require_exists(path)?;
        self.host.encoding_from_file(path)
    }
}

// ── StreamReader ──────────────────────────────────────────────────────────────

/// A file opened through [`File::open`], bound to one encoding.
///
/// Holds no OS handle; each `read` goes to the host.  Dropping the reader
/// (or calling `close`) ends its use.
pub struct StreamReader<'h, H: Host + ?Sized> {
    host: &'h H,
    path: PathBuf,
    encoding: Encoding,
}

impl<'h, H: Host + ?Sized> StreamReader<'h, H> {
    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    pub fn file_path(&self) -> &Path {
        &self.path
    }

    /// The whole text of the file, decoded by the host.
    pub fn read(&self) -> Result<String> {
        self.host
            .read_all_text(&self.path, self.encoding.hm_encode)?
            .ok_or_else(|| HmError::ReadFailed(self.path.clone()))
    }

    pub fn close(self) {}
}

impl<H: Host + ?Sized> Drop for StreamReader<'_, H> {
    fn drop(&mut self) {
        log::trace!("closing {}", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::host::memory::{Call, MemoryHost};

    fn temp_file(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().expect("tempfile");
        f.write_all(contents).expect("write");
        f
    }

    #[test]
    fn open_missing_path_fails_before_any_host_call() {
        let host = MemoryHost::new();
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.txt");

        let err = File::new(&host).open(&missing, None).err().expect("must fail");
        assert!(matches!(err, HmError::FileNotFound(ref p) if p == &missing));

        let err = File::new(&host).open(&missing, Some(6)).err().expect("must fail");
        assert!(matches!(err, HmError::FileNotFound(_)));

        assert!(host.calls().is_empty());
    }

    #[test]
    fn get_encoding_missing_path_fails_before_any_host_call() {
        let host = MemoryHost::new();
        let err = File::new(&host)
            .get_encoding("/definitely/not/here.txt")
            .expect_err("must fail");
        assert!(matches!(err, HmError::FileNotFound(_)));
        assert!(host.calls().is_empty());
    }

    #[test]
    fn open_detects_encoding_and_reads() {
        let f = temp_file("héllo\nworld".as_bytes());
        let host = MemoryHost::new();

        let reader = File::new(&host).open(f.path(), None).expect("open");
        assert_eq!(reader.encoding().hm_encode, 6);
        assert_eq!(reader.file_path(), f.path());
        assert_eq!(reader.read().expect("read"), "héllo\nworld");
        reader.close();

        assert_eq!(
            host.calls(),
            vec![
                Call::EncodingFromFile(f.path().to_owned()),
                Call::ReadAllText(f.path().to_owned(), 6),
            ]
        );
    }

    #[test]
    fn explicit_encode_skips_detection() {
        let f = temp_file(b"abc");
        let host = MemoryHost::new();
        let reader = File::new(&host).open(f.path(), Some(1)).expect("open");
        assert_eq!(reader.encoding().codepage, 932);
        assert_eq!(host.calls(), vec![Call::EncodingFromHmEncode(1)]);
    }

    #[test]
    fn host_read_failure_is_read_failed() {
        let f = temp_file(b"abc");
        let host = MemoryHost::new();
        // The memory host only decodes UTF-8.
        let reader = File::new(&host).open(f.path(), Some(1)).expect("open");
        assert!(matches!(reader.read(), Err(HmError::ReadFailed(_))));
    }

    #[test]
    fn get_encoding_of_existing_file() {
        let f = temp_file(b"x");
        let host = MemoryHost::new();
        let enc = File::new(&host).get_encoding(f.path()).expect("encoding");
        assert_eq!(enc.name, "utf_8");
    }
}
