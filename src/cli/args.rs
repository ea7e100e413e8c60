//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// tokencache - file-backed authentication token cache
///
/// Reads and writes a cached token safely while other processes use the
/// same cache file.
#[derive(Parser, Debug)]
#[command(name = "tokencache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "TOKENCACHE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the cached token
    Read(ReadArgs),

    /// Store a token in the cache
    Write(WriteArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the read command
#[derive(Parser, Debug)]
pub struct ReadArgs {
    /// Cache file (defaults to cache.path from config)
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// Print the full token document as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the write command
#[derive(Parser, Debug)]
pub struct WriteArgs {
    /// Cache file (defaults to cache.path from config)
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// Access token to store
    #[arg(long, required_unless_present = "stdin")]
    pub access_token: Option<String>,

    /// Refresh token to store alongside the access token
    #[arg(long, conflicts_with = "stdin")]
    pub refresh_token: Option<String>,

    /// Token lifetime in seconds from now
    #[arg(long, default_value = "3600", conflicts_with = "stdin")]
    pub expires_in: i64,

    /// Resource the token was issued for
    #[arg(long, conflicts_with = "stdin")]
    pub resource: Option<String>,

    /// Token type
    #[arg(long, conflicts_with = "stdin")]
    pub token_type: Option<String>,

    /// Read a JSON token document from stdin instead
    #[arg(long, conflicts_with = "access_token")]
    pub stdin: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}
