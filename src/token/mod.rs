//! Cached token value and its on-disk codec
//!
//! The cache treats [`CachedToken`] as an opaque value: it is handed to a
//! [`TokenCodec`] on write and returned unchanged on read.

pub mod codec;

pub use codec::{CodecError, JsonCodec, MemoryCodec, TokenCodec};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Seconds before `expires_on` at which a token is already treated as expired
const EXPIRY_BUFFER_SECS: i64 = 60;

/// Cached authentication token
///
/// `Default` is the zero value returned when no cache file exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CachedToken {
    /// Bearer access token
    pub access_token: String,

    /// Refresh material, empty when the provider issued none
    pub refresh_token: String,

    /// Lifetime granted by the provider, in seconds
    pub expires_in: i64,

    /// When the access token expires
    pub expires_on: Option<DateTime<Utc>>,

    /// Earliest time the access token is valid
    pub not_before: Option<DateTime<Utc>>,

    /// Resource (audience) the token was issued for
    pub resource: String,

    /// Token type, usually "Bearer"
    pub token_type: String,
}

impl CachedToken {
    /// Create a bearer token expiring at `expires_on`
    pub fn new(access_token: impl Into<String>, expires_on: DateTime<Utc>) -> Self {
        let expires_in = (expires_on - Utc::now()).num_seconds().max(0);
        Self {
            access_token: access_token.into(),
            expires_in,
            expires_on: Some(expires_on),
            token_type: "Bearer".to_string(),
            ..Self::default()
        }
    }

    /// Attach refresh material
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = refresh_token.into();
        self
    }

    /// Set the resource the token was issued for
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    /// True for the zero value (nothing cached)
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    /// Check if the token is expired
    ///
    /// A token without an expiry, or with one too early to subtract the
    /// buffer from, is never considered usable.
    pub fn is_expired(&self) -> bool {
        self.expires_on
            .and_then(|t| t.checked_sub_signed(Duration::seconds(EXPIRY_BUFFER_SECS)))
            .map_or(true, |deadline| Utc::now() >= deadline)
    }
}
