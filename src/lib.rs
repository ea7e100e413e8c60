//! tokencache - cross-process safe token cache
//!
//! Persists one authentication token per file. Any number of processes may
//! read and write the same file: reads share an advisory lock, writes take it
//! exclusively and retry briefly under contention.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod lock;
pub mod token;

pub use cache::{FileTokenCache, RetryPolicy, TokenCache};
pub use error::{TokenCacheError, TokenCacheResult};
pub use token::CachedToken;
