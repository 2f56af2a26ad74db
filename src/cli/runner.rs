//! CLI runner - executes commands

use crate::cache::FileCache;
use crate::cli::commands::{CacheAction, Cli, Commands, OutputFormat};
use crate::config::FetcherConfig;
use crate::error::{Error, Result};
use crate::fetcher::Fetcher;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;

        match &self.cli.command {
            Commands::Get { url, cache } => self.get(&config, url, *cache).await,
            Commands::Paged {
                url,
                pages,
                no_cache,
            } => self.paged(&config, url, *pages, !*no_cache).await,
            Commands::Config => self.show_config(&config),
            Commands::Cache { action } => self.cache(&config, *action).await,
        }
    }

    /// Resolve configuration: defaults, file, environment, then flags
    pub fn load_config(&self) -> Result<FetcherConfig> {
        let mut config = match &self.cli.config {
            Some(path) => FetcherConfig::from_file(path)?,
            None => FetcherConfig::default(),
        };
        config.apply_env()?;
        self.apply_flags(&mut config);
        Ok(config)
    }

    fn apply_flags(&self, config: &mut FetcherConfig) {
        if let Some(mode) = &self.cli.cache_mode {
            config.cache_mode.clone_from(mode);
        }
        if let Some(reqrate) = self.cli.reqrate {
            config.reqrate = reqrate;
        }
        if let Some(ip) = &self.cli.attach_ip {
            config.attach_ip.clone_from(ip);
        }
        if let Some(dir) = &self.cli.cache_dir {
            config.cache_dir = Some(dir.clone());
        }
    }

    async fn get(&self, config: &FetcherConfig, url: &str, cache: bool) -> Result<()> {
        let fetcher = Fetcher::new(config)?;
        let start = Instant::now();

        let value = fetcher.request(url, cache).await?;
        self.output(&value)?;

        info!(
            url,
            elapsed_ms = start.elapsed().as_millis() as u64,
            stats = ?fetcher.stats(),
            "Request complete"
        );
        Ok(())
    }

    async fn paged(&self, config: &FetcherConfig, url: &str, pages: i64, cache: bool) -> Result<()> {
        let fetcher = Fetcher::new(config)?;
        let start = Instant::now();

        let items = fetcher.request_paged(url, pages, cache).await?;
        self.output(&items)?;

        info!(
            url,
            items = items.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            stats = ?fetcher.stats(),
            "Paged request complete"
        );
        Ok(())
    }

    fn show_config(&self, config: &FetcherConfig) -> Result<()> {
        print!("{}", config.redacted().to_yaml()?);
        Ok(())
    }

    async fn cache(&self, config: &FetcherConfig, action: CacheAction) -> Result<()> {
        let dir = config
            .cache_dir
            .as_ref()
            .ok_or_else(|| Error::missing_field("cache_dir"))?;

        match action {
            CacheAction::Clear => {
                let cache = FileCache::new(dir);
                let removed = cache.clear().await?;
                debug!(dir = %dir.display(), removed, "Cache cleared");
                self.output(&serde_json::json!({ "removed": removed }))
            }
        }
    }

    fn output<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let rendered = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        };
        println!("{rendered}");
        Ok(())
    }
}
