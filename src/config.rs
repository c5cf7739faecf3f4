//! Application configuration management.
//!
//! Settings are layered with figment, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. A TOML file (`--config`, or `config.toml` in the platform config dir)
//! 3. Environment variables prefixed with `DUPKEEPER_` (e.g. `DUPKEEPER_CHUNK_SIZE`)
//! 4. Command-line flags, applied with [`Config::merge_cli`] and friends

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cache::ResultCache;
use crate::cli::{Cli, HashingArgs};
use crate::duplicates::{default_hash_threads, FinderConfig};
use crate::scanner::DEFAULT_CHUNK_SIZE;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bytes read per hashing step.
    pub chunk_size: usize,
    /// Number of hashing threads.
    pub hash_threads: usize,
    /// Cache root; the per-user temp directory when unset.
    pub cache_dir: Option<PathBuf>,
    /// Maximum age in minutes of a result shown by `show-duplicates`.
    pub show_threshold_minutes: u64,
    /// Maximum age in minutes of a result reused by `delete-duplicates`.
    pub reuse_threshold_minutes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            hash_threads: default_hash_threads(),
            cache_dir: None,
            show_threshold_minutes: 24 * 60,
            reuse_threshold_minutes: 60,
        }
    }
}

impl Config {
    /// Load from the default platform-specific path, falling back to
    /// defaults when the file is missing or invalid.
    #[must_use]
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from_path(path),
            None => {
                log::debug!("No platform config directory, using defaults");
                Self::layered(Figment::from(Serialized::defaults(Self::default())))
            }
        }
    }

    /// Load from `path`. A missing file contributes nothing.
    #[must_use]
    pub fn load_from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("Config file {} not found, skipping", path.display());
        }
        Self::layered(Figment::from(Serialized::defaults(Self::default())).merge(Toml::file(path)))
    }

    fn layered(figment: Figment) -> Self {
        let figment = figment.merge(Env::prefixed("DUPKEEPER_").split("__"));
        match figment.extract::<Self>() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Invalid configuration, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Default platform-specific configuration file.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupkeeper").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply global command-line overrides.
    pub fn merge_cli(&mut self, cli: &Cli) {
        if let Some(ref dir) = cli.cache_dir {
            self.cache_dir = Some(dir.clone());
        }
    }

    /// Apply hashing overrides from a subcommand.
    pub fn merge_hashing_args(&mut self, args: &HashingArgs) {
        if let Some(chunk_size) = args.chunk_size {
            self.chunk_size = chunk_size;
        }
        if let Some(threads) = args.threads {
            self.hash_threads = threads;
        }
    }

    /// Finder settings described by this configuration.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_chunk_size(self.chunk_size)
            .with_hash_threads(self.hash_threads)
    }

    /// Result cache at the configured (or default) root.
    #[must_use]
    pub fn result_cache(&self) -> ResultCache {
        ResultCache::new(
            self.cache_dir
                .clone()
                .unwrap_or_else(ResultCache::default_root),
        )
    }

    /// Age limit for `show-duplicates`.
    #[must_use]
    pub fn show_threshold(&self) -> Duration {
        minutes(self.show_threshold_minutes)
    }

    /// Age limit for reusing a cached result before deleting.
    #[must_use]
    pub fn reuse_threshold(&self) -> Duration {
        minutes(self.reuse_threshold_minutes)
    }
}

fn minutes(m: u64) -> Duration {
    Duration::from_secs(m.saturating_mul(60))
}
