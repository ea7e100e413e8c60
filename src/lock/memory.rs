//! In-memory lock table with the same shared/exclusive rules as `flock`

use super::FileLocker;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Holders {
    Shared(usize),
    Exclusive,
}

#[derive(Debug, Default)]
struct Table {
    locks: HashMap<PathBuf, Holders>,
    fail_shared: Option<io::ErrorKind>,
    fail_exclusive: Option<io::ErrorKind>,
    exclusive_attempts: usize,
}

#[derive(Debug, Default)]
struct Shared {
    table: Mutex<Table>,
    released: Condvar,
}

impl Shared {
    fn table(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Block until nobody holds `path`
    fn wait_free<'a>(
        &'a self,
        mut table: MutexGuard<'a, Table>,
        path: &Path,
    ) -> MutexGuard<'a, Table> {
        while table.locks.contains_key(path) {
            table = self.released.wait(table).unwrap_or_else(|e| e.into_inner());
        }
        table
    }
}

/// Process-local lock provider for tests
///
/// Clones share one lock table, so threads holding clones contend with
/// each other exactly like processes contending on `flock`.
#[derive(Debug, Default, Clone)]
pub struct MemoryLocker {
    inner: Arc<Shared>,
}

/// Held in-memory lock, released on drop
#[derive(Debug)]
pub struct MemoryGuard {
    inner: Arc<Shared>,
    path: PathBuf,
    exclusive: bool,
}

impl MemoryGuard {
    /// Whether this guard holds the exclusive lock
    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }
}

impl MemoryLocker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `lock_shared` call fail with `kind`
    pub fn fail_shared_with(&self, kind: io::ErrorKind) {
        self.inner.table().fail_shared = Some(kind);
    }

    /// Make every `try_lock_exclusive` call fail with `kind`
    pub fn fail_exclusive_with(&self, kind: io::ErrorKind) {
        self.inner.table().fail_exclusive = Some(kind);
    }

    /// Take the exclusive lock on `path`, waiting for current holders
    ///
    /// Stands in for another process owning the cache; it is not counted in
    /// [`exclusive_attempts`](Self::exclusive_attempts).
    pub fn hold_exclusive(&self, path: &Path) -> MemoryGuard {
        let mut table = self.inner.wait_free(self.inner.table(), path);
        table.locks.insert(path.to_path_buf(), Holders::Exclusive);
        drop(table);
        self.guard(path, true)
    }

    /// Whether any lock is currently held on `path`
    pub fn is_locked(&self, path: &Path) -> bool {
        self.inner.table().locks.contains_key(path)
    }

    /// Number of `try_lock_exclusive` calls made so far
    pub fn exclusive_attempts(&self) -> usize {
        self.inner.table().exclusive_attempts
    }

    fn guard(&self, path: &Path, exclusive: bool) -> MemoryGuard {
        MemoryGuard {
            inner: Arc::clone(&self.inner),
            path: path.to_path_buf(),
            exclusive,
        }
    }
}

impl FileLocker for MemoryLocker {
    type Guard = MemoryGuard;

    fn lock_shared(&self, path: &Path) -> io::Result<MemoryGuard> {
        let mut table = self.inner.table();
        if let Some(kind) = table.fail_shared {
            return Err(io::Error::new(kind, "injected lock failure"));
        }

        while table.locks.get(path) == Some(&Holders::Exclusive) {
            table = self
                .inner
                .released
                .wait(table)
                .unwrap_or_else(|e| e.into_inner());
        }

        let holders = table.locks.entry(path.to_path_buf()).or_insert(Holders::Shared(0));
        if let Holders::Shared(count) = holders {
            *count += 1;
        }
        Ok(self.guard(path, false))
    }

    fn try_lock_exclusive(&self, path: &Path) -> io::Result<MemoryGuard> {
        let mut table = self.inner.table();
        table.exclusive_attempts += 1;
        if let Some(kind) = table.fail_exclusive {
            return Err(io::Error::new(kind, "injected lock failure"));
        }
        if table.locks.contains_key(path) {
            return Err(io::Error::new(io::ErrorKind::WouldBlock, "lock held"));
        }
        table.locks.insert(path.to_path_buf(), Holders::Exclusive);
        Ok(self.guard(path, true))
    }
}

impl Drop for MemoryGuard {
    fn drop(&mut self) {
        let mut table = self.inner.table();
        let remaining = match table.locks.get(&self.path) {
            Some(Holders::Shared(count)) if *count > 1 => Some(Holders::Shared(count - 1)),
            _ => None,
        };
        match remaining {
            Some(holders) => {
                table.locks.insert(self.path.clone(), holders);
            }
            None => {
                table.locks.remove(&self.path);
            }
        }
        drop(table);
        self.inner.released.notify_all();
    }
}
