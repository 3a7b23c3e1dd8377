//! Persistent application configuration.
//!
//! Stored as JSON in a platform-appropriate config directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::scan::ScanOptions;

/// On-disk configuration for the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the slot, digit and icon templates.
    ///
    /// Falls back to discovery next to the executable, then to the built-in set.
    pub assets_dir: Option<PathBuf>,

    /// Fingerprint catalog (JSON).
    pub catalog_path: PathBuf,

    /// JSON list of item names worth more on the market.
    pub marketable_path: Option<PathBuf>,

    /// Where screenshots with unresolved slots are kept for curation.
    pub debug_dir: PathBuf,

    /// Largest accepted upload, in bytes.
    pub max_image_bytes: u64,

    /// Matching gives up once quality reaches this.
    pub max_quality: u32,

    /// Minimum progress increment, in percent.
    pub progress_step: u8,

    /// Relaxed matches in one image before the submitter is warned.
    pub low_quality_warning_after: u32,

    /// Users exempt from the one-scan-at-a-time limit.
    pub trusted_users: Vec<u64>,
}

impl Default for Config {
    fn default() -> Self {
        let catalog_path = dirs::data_dir()
            .map(|p| p.join("lootscan"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("catalog.json");

        Self {
            assets_dir: None,
            catalog_path,
            marketable_path: None,
            debug_dir: PathBuf::from("debug/loot"),
            max_image_bytes: 2 * 1024 * 1024,
            max_quality: 30,
            progress_step: 5,
            low_quality_warning_after: 5,
            trusted_users: Vec::new(),
        }
    }
}

impl Config {
    /// Path to the config file.
    pub fn path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("config_dir() unavailable")?;
        Ok(base.join("lootscan.json"))
    }

    /// Load configuration from disk, falling back to defaults on missing file.
    pub fn load_or_default() -> Self {
        match Self::try_load() {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load config; using defaults");
                Self::default()
            }
        }
    }

    /// Try to load configuration from disk.
    pub fn try_load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
        let cfg = serde_json::from_str(&json).with_context(|| format!("parse {:?}", path))?;
        Ok(cfg)
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize config")?;
        fs::write(path, json).with_context(|| format!("write {:?}", path))?;
        Ok(())
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            max_quality: self.max_quality,
            progress_step: self.progress_step,
            low_quality_warning_after: self.low_quality_warning_after,
        }
    }
}
