use crate::error::{CardError, Result};
use crate::format::CardLinks;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_PAGE_SIZE: usize = 20;
const DEFAULT_MAX_PAGE_SIZE: usize = 100;

/// Environment variable that overrides `baseUrl` from the config file.
pub const BASE_URL_ENV: &str = "CARDGIFT_BASE_URL";

/// Configuration for cardgift, stored in `<data dir>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CardGiftConfig {
    /// Public origin every share/preview link starts with (no trailing slash)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the share page that unfurls into the social preview
    #[serde(default = "default_share_path")]
    pub share_path: String,

    /// Path of the preview image endpoint
    #[serde(default = "default_preview_path")]
    pub preview_path: String,

    /// Path of the interactive card page
    #[serde(default = "default_viewer_path")]
    pub viewer_path: String,

    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,

    /// Privileged wallet addresses resolved before the registry is consulted
    #[serde(default)]
    pub founders: FounderConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FounderConfig {
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub coauthors: Vec<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_share_path() -> String {
    "/api/save-card".to_string()
}

fn default_preview_path() -> String {
    "/api/og-image".to_string()
}

fn default_viewer_path() -> String {
    "/card-viewer.html".to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> usize {
    DEFAULT_MAX_PAGE_SIZE
}

impl Default for CardGiftConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            share_path: default_share_path(),
            preview_path: default_preview_path(),
            viewer_path: default_viewer_path(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            founders: FounderConfig::default(),
        }
    }
}

impl CardGiftConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(CardError::Io)?;
        let config: CardGiftConfig =
            serde_json::from_str(&content).map_err(CardError::Serialization)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(CardError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(CardError::Serialization)?;
        fs::write(config_path, content).map_err(CardError::Io)?;
        Ok(())
    }

    /// Apply `CARDGIFT_BASE_URL` if it is set.
    pub fn with_env_overrides(self) -> Self {
        self.with_base_url_override(std::env::var(BASE_URL_ENV).ok())
    }

    pub fn with_base_url_override(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.set_base_url(&url);
        }
        self
    }

    /// Set the base URL (trailing slashes are dropped)
    pub fn set_base_url(&mut self, url: &str) {
        self.base_url = url.trim().trim_end_matches('/').to_string();
    }

    pub fn links(&self) -> CardLinks {
        CardLinks {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            share_path: self.share_path.clone(),
            preview_path: self.preview_path.clone(),
            viewer_path: self.viewer_path.clone(),
        }
    }
}
