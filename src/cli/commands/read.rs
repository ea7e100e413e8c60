//! Read command - show the cached token

use crate::cache::{FileTokenCache, TokenCache};
use crate::cli::args::ReadArgs;
use crate::config::Config;
use crate::error::TokenCacheResult;
use crate::token::CachedToken;
use console::style;
use std::path::Path;

/// Execute the read command
pub fn execute(args: ReadArgs, config: &Config) -> TokenCacheResult<()> {
    let path = args.path.unwrap_or_else(|| config.cache_path());
    let cache = FileTokenCache::new();
    let token = cache.read(&path)?;

    if args.json {
        if token.is_zero() {
            println!("null");
        } else {
            println!("{}", serde_json::to_string_pretty(&token)?);
        }
        return Ok(());
    }

    print_summary(&path, &token);
    Ok(())
}

fn print_summary(path: &Path, token: &CachedToken) {
    if token.is_zero() {
        println!("{} No cached token at {}", style("[--]").dim(), path.display());
        return;
    }

    let expiry = token
        .expires_on
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string());

    if token.is_expired() {
        println!(
            "{} Cached token at {} expired ({})",
            style("[WARN]").yellow(),
            path.display(),
            expiry
        );
    } else {
        println!(
            "{} Cached token at {} valid until {}",
            style("[OK]").green(),
            path.display(),
            expiry
        );
    }

    if !token.resource.is_empty() {
        println!("     resource: {}", token.resource);
    }
}
