use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const CACHE_FILE_NAME: &str = "ip.txt";

/// The last IP address that was successfully published, kept on disk so that
/// later runs can skip updating the DNS records when nothing changed.
///
/// The file holds the address as plain text and nothing else. It is only an
/// optimization: losing it costs one extra update, never correctness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpCache {
    path: PathBuf,
}

impl IpCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `None` when nothing has been cached yet. Any other failure,
    /// including a file that isn't valid UTF-8, is an error.
    pub fn read(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(ip) => Ok(Some(ip)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Replaces the cached address. The new content goes to a sibling
    /// temporary file first and is then renamed over the old one, so an
    /// interrupted write leaves either the old or the new address behind.
    pub fn write(&self, ip: &str) -> io::Result<()> {
        let tmp = self.tmp_path();

        let written = Self::write_synced(&tmp, ip).and_then(|_| fs::rename(&tmp, &self.path));

        if written.is_err() {
            let _ = fs::remove_file(&tmp);
        }

        written
    }

    fn write_synced(path: &Path, ip: &str) -> io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(ip.as_bytes())?;

        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()
    }

    /// True when nothing is cached, or the cached address differs from
    /// `current` in any byte.
    pub fn has_changed(&self, current: &str) -> io::Result<bool> {
        Ok(self.read()?.map_or(true, |cached| cached != current))
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from(CACHE_FILE_NAME));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
