//! Advisory locking for cache files
//!
//! Provides a trait for path-scoped shared/exclusive locks that can be
//! implemented by different backends:
//! - [`FlockLocker`]: BSD `flock(2)` on a sibling `.lock` file
//! - [`MemoryLocker`]: process-local fake for deterministic tests
//!
//! Releasing a lock is dropping its guard.

mod flock;
mod memory;

pub use flock::{lock_path_for, FlockGuard, FlockLocker, SHARED_WAIT_TIMEOUT};
pub use memory::{MemoryGuard, MemoryLocker};

use std::io;
use std::path::Path;

/// Abstract advisory lock provider
pub trait FileLocker {
    /// Held lock; the lock is released when this is dropped
    type Guard;

    /// Acquire a shared lock on `path`, blocking while an exclusive holder exists
    fn lock_shared(&self, path: &Path) -> io::Result<Self::Guard>;

    /// Try to acquire an exclusive lock on `path` without blocking
    ///
    /// Contention is reported as `io::ErrorKind::WouldBlock`.
    fn try_lock_exclusive(&self, path: &Path) -> io::Result<Self::Guard>;
}
