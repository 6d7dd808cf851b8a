// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// Directory holding the database file and the settings.
const DATA_DIR: &str = "database";
const SETTINGS_FILE_NAME: &str = "settings.json";

pub const DEFAULT_DATABASE_URL: &str = "sqlite://database/diary_database.db";
pub const DEFAULT_QUOTES_API_URL: &str = "https://zenquotes.io/api/";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Application settings. Every field has a default so a partial (or
/// missing) settings file still yields a usable configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub database_url: String,
    pub quotes_api_url: String,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            quotes_api_url: DEFAULT_QUOTES_API_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Path of the settings file, relative to the working directory.
    pub fn settings_path() -> PathBuf {
        let mut path = PathBuf::new();
        path.push(DATA_DIR);
        path.push(SETTINGS_FILE_NAME);
        path
    }

    /// Loads the settings file, falling back to defaults when it is missing
    /// or unreadable.
    pub fn load() -> Self {
        let path = Self::settings_path();
        Self::load_from(&path).unwrap_or_else(|e| {
            warn!(
                "Could not load settings file {}: {:#}. Using defaults.",
                path.display(),
                e
            );
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!("Loaded settings from {}", path.display());
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
