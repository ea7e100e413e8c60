//! File-backed token cache
//!
//! One cache file per path, shared by any number of processes. Readers take a
//! shared lock, writers an exclusive one, and writers retry contention within
//! a fixed [`RetryPolicy`] budget.
//!
//! # Write States
//!
//! | State | Next |
//! |-------|------|
//! | LockAttempt | LockHeld, or LockFailed |
//! | LockFailed | LockAttempt after the delay, or give up with the lock error |
//! | LockHeld | Persisting |
//! | PersistFailed | LockAttempt after the delay, or give up with the persist error |
//! | PersistOk | Done |

mod file;
mod retry;

pub use file::{FileTokenCache, CACHE_FILE_MODE};
pub use retry::{Attempts, RetryPolicy};

use crate::error::TokenCacheResult;
use crate::token::CachedToken;
use std::path::Path;

/// Read/write capability over a token cache file
pub trait TokenCache {
    /// Read the token cached at `path`
    ///
    /// A missing file yields the zero token, not an error.
    fn read(&self, path: &Path) -> TokenCacheResult<CachedToken>;

    /// Replace the token cached at `path`
    fn write(&self, path: &Path, token: &CachedToken) -> TokenCacheResult<()>;
}
