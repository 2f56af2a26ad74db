//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Rate-limited, cache-aware fetcher for paginated JSON APIs
#[derive(Parser, Debug)]
#[command(name = "pagefetch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for the on-disk response cache
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Cache mode (dev or prod)
    #[arg(long, global = true)]
    pub cache_mode: Option<String>,

    /// Live calls allowed per 60-second window
    #[arg(long, global = true)]
    pub reqrate: Option<u32>,

    /// Local source address for outbound connections
    #[arg(long, global = true)]
    pub attach_ip: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a single resource
    Get {
        /// Resource URL
        url: String,

        /// Consult and populate the cache
        #[arg(long)]
        cache: bool,
    },

    /// Fetch a paginated resource by following Link headers
    Paged {
        /// URL of the first page
        url: String,

        /// Stop after this many pages and return the last one (0 = all pages)
        #[arg(long, default_value = "0")]
        pages: i64,

        /// Do not ask for the cache (prod mode still caches paged requests)
        #[arg(long)]
        no_cache: bool,
    },

    /// Print the effective configuration
    Config,

    /// Manage the on-disk cache
    Cache {
        /// Cache operation
        #[command(subcommand)]
        action: CacheAction,
    },
}

/// Cache subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    /// Delete every cached response
    Clear,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON on one line
    Json,
    /// Indented JSON
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_get() {
        let cli = Cli::try_parse_from(["pagefetch", "get", "https://api.github.com/users/octo", "--cache"])
            .unwrap();
        match cli.command {
            Commands::Get { url, cache } => {
                assert_eq!(url, "https://api.github.com/users/octo");
                assert!(cache);
            }
            other => panic!("Expected Get, got {other:?}"),
        }
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_paged_defaults() {
        let cli = Cli::try_parse_from(["pagefetch", "paged", "https://x/repos"]).unwrap();
        match cli.command {
            Commands::Paged {
                pages, no_cache, ..
            } => {
                assert_eq!(pages, 0);
                assert!(!no_cache);
            }
            other => panic!("Expected Paged, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pagefetch",
            "paged",
            "https://x/repos",
            "--pages",
            "3",
            "--no-cache",
            "--cache-mode",
            "prod",
            "--reqrate",
            "10",
            "--attach-ip",
            "10.0.0.7",
            "--format",
            "pretty",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.cache_mode.as_deref(), Some("prod"));
        assert_eq!(cli.reqrate, Some(10));
        assert_eq!(cli.attach_ip.as_deref(), Some("10.0.0.7"));
        assert_eq!(cli.format, OutputFormat::Pretty);
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Paged {
                pages: 3,
                no_cache: true,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_cache_clear() {
        let cli = Cli::try_parse_from(["pagefetch", "--cache-dir", "/tmp/pf", "cache", "clear"])
            .unwrap();
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/pf")));
        assert!(matches!(
            cli.command,
            Commands::Cache {
                action: CacheAction::Clear
            }
        ));
    }

    #[test]
    fn test_reject_bad_format() {
        assert!(Cli::try_parse_from(["pagefetch", "--format", "xml", "config"]).is_err());
    }

    #[test]
    fn test_requires_subcommand() {
        assert!(Cli::try_parse_from(["pagefetch"]).is_err());
    }
}
