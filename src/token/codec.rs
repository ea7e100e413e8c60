//! Token encoding to and from cache files
//!
//! [`JsonCodec`] is the real on-disk format. [`MemoryCodec`] keeps encoded
//! documents in memory so the cache protocol can be tested without a disk.

use super::CachedToken;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors from encoding or decoding a token document
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed token document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encode/decode capability for the token's on-disk representation
pub trait TokenCodec {
    /// Whether anything is stored at `path`
    ///
    /// Only a definite "not found" counts as absent; any other failure is
    /// left for `decode` to report.
    fn exists(&self, path: &Path) -> bool;

    /// Decode the token stored at `path`
    fn decode(&self, path: &Path) -> Result<CachedToken, CodecError>;

    /// Replace the contents of `path` with `token`, leaving the file with `mode`
    fn encode(&self, path: &Path, token: &CachedToken, mode: u32) -> Result<(), CodecError>;
}

/// JSON codec writing through a temporary file and an atomic rename
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

impl JsonCodec {
    fn temp_path(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "token".to_string());
        let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        path.with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), seq))
    }

    fn write_temp(temp: &Path, bytes: &[u8], mode: u32) -> io::Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }

        let mut file = options.open(temp)?;
        file.write_all(bytes)?;
        file.sync_all()?;

        // The creation mode is filtered through the umask
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(temp, fs::Permissions::from_mode(mode))?;
        }
        #[cfg(not(unix))]
        let _ = mode;

        Ok(())
    }
}

impl TokenCodec for JsonCodec {
    fn exists(&self, path: &Path) -> bool {
        !matches!(fs::metadata(path), Err(e) if e.kind() == io::ErrorKind::NotFound)
    }

    fn decode(&self, path: &Path) -> Result<CachedToken, CodecError> {
        let content = fs::read(path)?;
        Ok(serde_json::from_slice(&content)?)
    }

    fn encode(&self, path: &Path, token: &CachedToken, mode: u32) -> Result<(), CodecError> {
        let content = serde_json::to_vec_pretty(token)?;
        let temp = Self::temp_path(path);

        let result = Self::write_temp(&temp, &content, mode).and_then(|()| fs::rename(&temp, path));
        if result.is_err() {
            let _ = fs::remove_file(&temp);
        }
        Ok(result?)
    }
}

#[derive(Debug, Default)]
struct MemoryFiles {
    files: HashMap<PathBuf, (Vec<u8>, u32)>,
    failures: usize,
    encodes: usize,
}

/// In-memory codec standing in for the filesystem in unit tests
///
/// Clones share the same storage.
#[derive(Debug, Default, Clone)]
pub struct MemoryCodec {
    inner: Arc<Mutex<MemoryFiles>>,
}

impl MemoryCodec {
    pub fn new() -> Self {
        Self::default()
    }

    fn files(&self) -> MutexGuard<'_, MemoryFiles> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make the next `count` encodes fail with an I/O error
    pub fn fail_next_encodes(&self, count: usize) {
        self.files().failures = count;
    }

    /// Store raw bytes at `path`, bypassing encoding
    pub fn put_raw(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.files().files.insert(path.into(), (bytes.into(), 0o600));
    }

    /// Raw bytes stored at `path`
    pub fn raw(&self, path: &Path) -> Option<Vec<u8>> {
        self.files().files.get(path).map(|(bytes, _)| bytes.clone())
    }

    /// Mode recorded by the last successful encode of `path`
    pub fn mode(&self, path: &Path) -> Option<u32> {
        self.files().files.get(path).map(|(_, mode)| *mode)
    }

    /// Number of encode calls, failed ones included
    pub fn encode_count(&self) -> usize {
        self.files().encodes
    }
}

impl TokenCodec for MemoryCodec {
    fn exists(&self, path: &Path) -> bool {
        self.files().files.contains_key(path)
    }

    fn decode(&self, path: &Path) -> Result<CachedToken, CodecError> {
        let bytes = self
            .raw(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn encode(&self, path: &Path, token: &CachedToken, mode: u32) -> Result<(), CodecError> {
        let content = serde_json::to_vec(token)?;
        let mut files = self.files();
        files.encodes += 1;
        if files.failures > 0 {
            files.failures -= 1;
            return Err(io::Error::other("no space left on device").into());
        }
        files.files.insert(path.to_path_buf(), (content, mode));
        Ok(())
    }
}
