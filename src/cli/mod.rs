//! CLI module
//!
//! Command-line interface for fetching resources.
//!
//! # Commands
//!
//! - `get` - Fetch a single resource
//! - `paged` - Follow `Link` headers across pages
//! - `config` - Print the effective configuration
//! - `cache clear` - Empty the on-disk cache

mod commands;
mod runner;

pub use commands::{CacheAction, Cli, Commands, OutputFormat};
pub use runner::Runner;
