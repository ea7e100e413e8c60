//! Lock-protected token cache on a single file

use super::{RetryPolicy, TokenCache};
use crate::error::{TokenCacheError, TokenCacheResult};
use crate::lock::{FileLocker, FlockLocker};
use crate::token::{CachedToken, JsonCodec, TokenCodec};
use std::io;
use std::path::Path;
use tracing::debug;

/// Permission bits of a written cache file (owner only)
pub const CACHE_FILE_MODE: u32 = 0o700;

/// Token cache persisting to a caller-supplied path
///
/// Holds no token state between calls: every read and write is a fresh
/// locked file operation.
#[derive(Debug, Clone, Default)]
pub struct FileTokenCache<L = FlockLocker, C = JsonCodec> {
    locker: L,
    codec: C,
    retry: RetryPolicy,
}

impl FileTokenCache {
    /// Create a cache over the real filesystem
    pub fn new() -> Self {
        Self::default()
    }
}

impl<L: FileLocker, C: TokenCodec> FileTokenCache<L, C> {
    /// Create a cache with a custom lock provider and codec
    pub fn with_parts(locker: L, codec: C) -> Self {
        Self {
            locker,
            codec,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the write retry budget
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Get the write retry budget
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Lock exclusively and persist once; the lock is released on return
    fn write_once(&self, path: &Path, token: &CachedToken) -> TokenCacheResult<()> {
        let _guard = self
            .locker
            .try_lock_exclusive(path)
            .map_err(|source| TokenCacheError::Lock {
                path: path.to_path_buf(),
                source,
            })?;

        self.codec
            .encode(path, token, CACHE_FILE_MODE)
            .map_err(|source| TokenCacheError::Persist {
                path: path.to_path_buf(),
                source,
            })
    }
}

impl<L: FileLocker, C: TokenCodec> TokenCache for FileTokenCache<L, C> {
    fn read(&self, path: &Path) -> TokenCacheResult<CachedToken> {
        let _guard = match self.locker.lock_shared(path) {
            Ok(guard) => guard,
            // No directory, so no cache file either
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Token cache directory for {} does not exist", path.display());
                return Ok(CachedToken::default());
            }
            Err(source) => {
                return Err(TokenCacheError::Lock {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        if !self.codec.exists(path) {
            debug!("No cached token at {}", path.display());
            return Ok(CachedToken::default());
        }

        let token = self
            .codec
            .decode(path)
            .map_err(|source| TokenCacheError::Decode {
                path: path.to_path_buf(),
                source,
            })?;

        debug!("Read cached token from {}", path.display());
        Ok(token)
    }

    fn write(&self, path: &Path, token: &CachedToken) -> TokenCacheResult<()> {
        let mut attempts = self.retry.start();

        loop {
            let attempt = attempts.begin();
            let err = match self.write_once(path, token) {
                Ok(()) => {
                    debug!("Cached token at {} (attempt {})", path.display(), attempt);
                    return Ok(());
                }
                Err(e) => e,
            };

            if !err.is_retryable() || !attempts.more() {
                return Err(err);
            }

            let phase = match err {
                TokenCacheError::Lock { .. } => "lock",
                _ => "persist",
            };
            debug!(
                "Token cache {} failed on attempt {} for {}, retrying",
                phase,
                attempt,
                path.display()
            );
            attempts.wait();
        }
    }
}
