//! Application configuration structures.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::utils::fs::load_toml;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Where state and the mirror live, relative to the work directory
    #[serde(default)]
    pub paths: PathsConfig,

    /// Task frontier behavior
    #[serde(default)]
    pub frontier: FrontierConfig,

    /// External downloader invocation
    #[serde(default)]
    pub downloader: DownloaderConfig,

    /// Mirror audit rules
    #[serde(default)]
    pub audit: AuditConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_toml(path.as_ref())
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("Config load failed from {:?}: {}. Using defaults.", path, e);
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.paths.config_root.trim().is_empty() {
            return Err(AppError::validation("paths.config_root is empty"));
        }
        if self.paths.data_root.trim().is_empty() {
            return Err(AppError::validation("paths.data_root is empty"));
        }
        if self.frontier.recent_batch_limit == 0 {
            return Err(AppError::validation(
                "frontier.recent_batch_limit must be > 0",
            ));
        }
        if self.downloader.program.trim().is_empty() {
            return Err(AppError::validation("downloader.program is empty"));
        }
        if self.downloader.user_agent.trim().is_empty() {
            return Err(AppError::validation("downloader.user_agent is empty"));
        }
        if self.audit.small_file_threshold == 0 {
            return Err(AppError::validation(
                "audit.small_file_threshold must be > 0",
            ));
        }
        if self.audit.not_applicable_marker.trim().is_empty() {
            return Err(AppError::validation("audit.not_applicable_marker is empty"));
        }
        if let Some(prefix) = self
            .audit
            .misfiled_prefixes
            .iter()
            .find(|p| p.trim().is_empty() || p.contains('/'))
        {
            return Err(AppError::invalid("audit.misfiled_prefixes", format!("{prefix:?}")));
        }
        Ok(())
    }

    /// Append `--config-location <path>` to the common downloader arguments.
    pub fn with_downloader_config(mut self, location: &str) -> Self {
        let arg = format!("--config-location {location}");
        self.downloader.extra_args = Some(match self.downloader.extra_args.take() {
            Some(existing) if !existing.trim().is_empty() => format!("{existing} {arg}"),
            _ => arg,
        });
        self
    }
}

/// Locations of the configuration root and the data mirror root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding archives, logs and reports
    #[serde(default = "defaults::config_root")]
    pub config_root: String,

    /// Directory holding one subdirectory per channel
    #[serde(default = "defaults::data_root")]
    pub data_root: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_root: defaults::config_root(),
            data_root: defaults::data_root(),
        }
    }
}

/// Task frontier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontierConfig {
    /// Items per photo listing the downloader walks in recent-only mode
    #[serde(default = "defaults::recent_batch_limit")]
    pub recent_batch_limit: u32,
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            recent_batch_limit: defaults::recent_batch_limit(),
        }
    }
}

/// External downloader settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// Downloader executable
    #[serde(default = "defaults::program")]
    pub program: String,

    /// User-Agent passed on every invocation
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Arguments appended to every invocation
    #[serde(default)]
    pub extra_args: Option<String>,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            program: defaults::program(),
            user_agent: defaults::user_agent(),
            extra_args: None,
        }
    }
}

/// Mirror audit settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Files below this size sharing a size are treated as duplicates
    #[serde(default = "defaults::small_file_threshold")]
    pub small_file_threshold: u64,

    /// Model directory the downloader uses when the uploader is unknown
    #[serde(default = "defaults::not_applicable_marker")]
    pub not_applicable_marker: String,

    /// Category prefixes whose decorated variants belong under the bare prefix
    #[serde(default = "defaults::misfiled_prefixes")]
    pub misfiled_prefixes: Vec<String>,

    /// Stray files removed before deleting an empty model directory
    #[serde(default = "defaults::marker_files")]
    pub marker_files: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            small_file_threshold: defaults::small_file_threshold(),
            not_applicable_marker: defaults::not_applicable_marker(),
            misfiled_prefixes: defaults::misfiled_prefixes(),
            marker_files: defaults::marker_files(),
        }
    }
}

mod defaults {
    // Path defaults
    pub fn config_root() -> String {
        "conf".into()
    }
    pub fn data_root() -> String {
        ".".into()
    }

    // Frontier defaults
    pub fn recent_batch_limit() -> u32 {
        10
    }

    // Downloader defaults
    pub fn program() -> String {
        "youtube-dl".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:105.0) Gecko/20100101 Firefox/105.0"
            .into()
    }

    // Audit defaults
    pub fn small_file_threshold() -> u64 {
        30_000
    }
    pub fn not_applicable_marker() -> String {
        "NA".into()
    }
    pub fn misfiled_prefixes() -> Vec<String> {
        vec!["NA".into()]
    }
    pub fn marker_files() -> Vec<String> {
        vec![".DS_Store".into(), "Thumbs.db".into(), "desktop.ini".into()]
    }
}
