//! Write command - store a token in the cache

use crate::cache::{FileTokenCache, TokenCache};
use crate::cli::args::WriteArgs;
use crate::config::Config;
use crate::error::{TokenCacheError, TokenCacheResult};
use crate::token::CachedToken;
use chrono::{Duration, Utc};
use console::style;

/// Execute the write command
pub fn execute(args: WriteArgs, config: &Config) -> TokenCacheResult<()> {
    let path = args.path.clone().unwrap_or_else(|| config.cache_path());
    let token = token_from_args(args)?;

    let cache = FileTokenCache::new().with_retry(config.retry_policy());
    cache.write(&path, &token)?;

    println!("{} Cached token at {}", style("[OK]").green(), path.display());
    Ok(())
}

fn token_from_args(args: WriteArgs) -> TokenCacheResult<CachedToken> {
    let token = if args.stdin {
        serde_json::from_reader::<_, CachedToken>(std::io::stdin().lock())?
    } else {
        if args.expires_in <= 0 {
            return Err(TokenCacheError::InvalidToken(
                "--expires-in must be positive".to_string(),
            ));
        }
        let expires_on = Duration::try_seconds(args.expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                TokenCacheError::InvalidToken(format!(
                    "--expires-in {} is out of range",
                    args.expires_in
                ))
            })?;
        let mut token = CachedToken::new(args.access_token.unwrap_or_default(), expires_on);
        token.expires_in = args.expires_in;
        if let Some(refresh) = args.refresh_token {
            token = token.with_refresh_token(refresh);
        }
        if let Some(resource) = args.resource {
            token = token.with_resource(resource);
        }
        if let Some(token_type) = args.token_type {
            token.token_type = token_type;
        }
        token
    };

    validate(token)
}

fn validate(token: CachedToken) -> TokenCacheResult<CachedToken> {
    if token.access_token.trim().is_empty() {
        return Err(TokenCacheError::InvalidToken(
            "access token is empty".to_string(),
        ));
    }
    Ok(token)
}
