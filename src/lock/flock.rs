//! `flock(2)` based advisory locks
//!
//! The lock is taken on `<path>.lock`, never on the cache file itself: the
//! codec replaces the cache file by rename, and a lock on the old inode would
//! no longer exclude anyone. Lock files are left in place after release.
//!
//! Shared locks open an existing lock file read-only, so readers only need
//! read access to it. A reader creates the lock file when it does not exist
//! yet.
//!
//! Platforms without `flock` fall back to lock-file existence: the writer
//! creates the lock file with `create_new` and removes it on release, and a
//! reader polls until the file is gone. A writer that dies while holding the
//! lock leaves the file behind, so readers give up after
//! [`SHARED_WAIT_TIMEOUT`] with `WouldBlock` instead of waiting forever.

use super::FileLocker;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::trace;

/// Longest a reader waits for an exclusive lock file to go away without `flock`
pub const SHARED_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval between lock file checks without `flock`
#[cfg(any(not(unix), test))]
const SHARED_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Wait until `lock_path` no longer exists, for at most `timeout`
#[cfg(any(not(unix), test))]
fn wait_for_release(lock_path: &Path, timeout: Duration) -> io::Result<()> {
    let start = std::time::Instant::now();
    while lock_path.exists() {
        if start.elapsed() >= timeout {
            return Err(io::Error::new(
                io::ErrorKind::WouldBlock,
                format!("lock file {} was not released", lock_path.display()),
            ));
        }
        std::thread::sleep(SHARED_POLL_INTERVAL);
    }
    Ok(())
}

/// Lock file guarding `path`
pub fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

/// Advisory lock provider backed by the operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct FlockLocker;

/// Held `flock` lock
///
/// Released when dropped.
#[derive(Debug)]
pub struct FlockGuard {
    lock_path: PathBuf,
    exclusive: bool,
    lock_file: Option<File>,
}

impl FlockGuard {
    /// Get the lock file path
    pub fn path(&self) -> &Path {
        &self.lock_path
    }

    /// Whether this guard holds the exclusive lock
    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }
}

impl FlockLocker {
    #[cfg(unix)]
    fn open_shared(lock_path: &Path) -> io::Result<File> {
        match File::open(lock_path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::open(lock_path),
            result => result,
        }
    }

    #[cfg(unix)]
    fn open(lock_path: &Path) -> io::Result<File> {
        use std::os::unix::fs::OpenOptionsExt;

        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(0o600)
            .open(lock_path)
    }

    #[cfg(unix)]
    fn flock(file: &File, operation: libc::c_int) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        let fd = file.as_raw_fd();
        loop {
            // SAFETY: fd is a valid descriptor owned by `file` for the whole call
            let result = unsafe { libc::flock(fd, operation) };
            if result == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    fn acquire(path: &Path, exclusive: bool) -> io::Result<FlockGuard> {
        let lock_path = lock_path_for(path);
        let lock_file = Self::try_acquire(&lock_path, exclusive)?;
        trace!(path = %lock_path.display(), exclusive, "acquired cache lock");
        Ok(FlockGuard {
            lock_path,
            exclusive,
            lock_file,
        })
    }

    #[cfg(unix)]
    fn try_acquire(lock_path: &Path, exclusive: bool) -> io::Result<Option<File>> {
        let (file, operation) = if exclusive {
            (Self::open(lock_path)?, libc::LOCK_EX | libc::LOCK_NB)
        } else {
            (Self::open_shared(lock_path)?, libc::LOCK_SH)
        };
        Self::flock(&file, operation)?;
        Ok(Some(file))
    }

    /// Without `flock`, the exclusive lock is the existence of the lock file
    /// and a shared lock waits until no writer holds it.
    #[cfg(not(unix))]
    fn try_acquire(lock_path: &Path, exclusive: bool) -> io::Result<Option<File>> {
        if exclusive {
            return match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(lock_path)
            {
                Ok(file) => Ok(Some(file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    Err(io::Error::new(io::ErrorKind::WouldBlock, "lock held"))
                }
                Err(e) => Err(e),
            };
        }
        if let Some(dir) = lock_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::metadata(dir)?;
        }
        wait_for_release(lock_path, SHARED_WAIT_TIMEOUT)?;
        Ok(None)
    }
}

impl FileLocker for FlockLocker {
    type Guard = FlockGuard;

    fn lock_shared(&self, path: &Path) -> io::Result<FlockGuard> {
        Self::acquire(path, false)
    }

    fn try_lock_exclusive(&self, path: &Path) -> io::Result<FlockGuard> {
        Self::acquire(path, true)
    }
}

impl Drop for FlockGuard {
    fn drop(&mut self) {
        // Closing the descriptor would release the lock as well
        #[cfg(unix)]
        if let Some(file) = &self.lock_file {
            let _ = FlockLocker::flock(file, libc::LOCK_UN);
        }

        #[cfg(not(unix))]
        if self.exclusive {
            let _ = std::fs::remove_file(&self.lock_path);
        }

        trace!(path = %self.lock_path.display(), exclusive = self.exclusive, "released cache lock");
    }
}
