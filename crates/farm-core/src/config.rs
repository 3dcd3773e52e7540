//! Configuration management for the farm record system

use serde::{Deserialize, Serialize};
use crate::error::{FarmError, Result};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmConfig {
    pub backend: BackendConfig,

    #[serde(default = "default_pdf_service")]
    pub pdf_service: PdfServiceConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

/// Hosted PostgREST backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(alias = "base_url")]  // Accept both 'url' and 'base_url'
    pub url: String,

    #[serde(alias = "anon_key")]  // Accept both 'api_key' and 'anon_key'
    pub api_key: String,

    /// Bearer token of the signed-in user; the api key is sent when absent
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfServiceConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_farm_name")]
    pub farm_name: String,

    #[serde(default = "default_leaderboard_limit")]
    pub leaderboard_limit: usize,

    /// Lines per page for the text renderer
    #[serde(default = "default_page_height")]
    pub page_height: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            farm_name: default_farm_name(),
            leaderboard_limit: default_leaderboard_limit(),
            page_height: default_page_height(),
        }
    }
}

// Default functions
fn default_pdf_service() -> PdfServiceConfig {
    PdfServiceConfig {
        base_url: "http://localhost:8000".to_string()
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_farm_name() -> String {
    "TRYDT FARMSTEAD".to_string()
}

fn default_leaderboard_limit() -> usize {
    10
}

fn default_page_height() -> usize {
    60
}

impl FarmConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FarmError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_json_str(&content)
    }

    /// Load configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: FarmConfig = serde_json::from_str(json)
            .map_err(|e| FarmError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.backend.url.trim().is_empty() {
            return Err(FarmError::Config("Backend url is required".to_string()));
        }

        if self.backend.api_key.is_empty() {
            return Err(FarmError::Config("Backend api key is required".to_string()));
        }

        if self.report.leaderboard_limit == 0 {
            return Err(FarmError::Config("Leaderboard limit must be at least 1".to_string()));
        }

        if self.report.page_height == 0 {
            return Err(FarmError::Config("Report page height must be at least 1".to_string()));
        }

        Ok(())
    }
}
