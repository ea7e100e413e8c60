//! CLI command implementations

pub mod config;
pub mod read;
pub mod write;

pub use config::execute as config;
pub use read::execute as read;
pub use write::execute as write;
