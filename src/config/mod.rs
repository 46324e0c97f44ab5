use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, TokenError};

/// Default JWT lifetime in seconds
pub const DEFAULT_EXPIRATION_SECS: u64 = 600;

/// Default GitHub REST API base URL
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Resolved, immutable configuration for one token issuance.
///
/// Built once from CLI flags, environment and the optional config file, then
/// passed by reference into every pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub pem_path: PathBuf,
    pub app_id: u64,
    pub installation_id: u64,
    pub expiration_secs: u64,
    pub output: Option<PathBuf>,
    pub api_url: String,
}

/// Unvalidated settings as collected from one source.
///
/// Identifiers stay strings here so that non-numeric input can be reported
/// as a claims error rather than a usage error.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub pem: Option<PathBuf>,
    pub app_id: Option<String>,
    pub installation_id: Option<String>,
    pub expiration: Option<u64>,
    pub output: Option<PathBuf>,
    pub api_url: Option<String>,
}

impl Settings {
    /// Fill unset values from the config file. Values already set win.
    pub fn with_file_defaults(self, file: &GitHubFileConfig) -> Self {
        Self {
            pem: self.pem.or_else(|| file.pem.clone()),
            app_id: self.app_id.or_else(|| file.app_id.map(|id| id.to_string())),
            installation_id: self
                .installation_id
                .or_else(|| file.installation_id.map(|id| id.to_string())),
            expiration: self.expiration.or(file.expiration),
            output: self.output,
            api_url: self.api_url.or_else(|| file.api_url.clone()),
        }
    }
}

impl Config {
    pub fn build(settings: Settings) -> Result<Self> {
        let pem_path = settings
            .pem
            .ok_or_else(|| TokenError::Config("--pem flag is required".to_string()))?;
        let app_id = parse_id(settings.app_id, "--app", "app ID")?;
        let installation_id = parse_id(settings.installation_id, "--install", "installation ID")?;

        let expiration_secs = settings.expiration.unwrap_or(DEFAULT_EXPIRATION_SECS);
        if expiration_secs == 0 {
            return Err(TokenError::Config(
                "JWT expiration must be at least one second".to_string(),
            ));
        }

        let api_url = settings
            .api_url
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        if api_url.is_empty() {
            return Err(TokenError::Config("API URL must not be empty".to_string()));
        }

        Ok(Self {
            pem_path,
            app_id,
            installation_id,
            expiration_secs,
            output: settings.output,
            api_url,
        })
    }
}

fn parse_id(value: Option<String>, flag: &str, field: &'static str) -> Result<u64> {
    let raw = value.ok_or_else(|| TokenError::Config(format!("{} flag is required", flag)))?;
    let id: u64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
        TokenError::Claims {
            field,
            reason: format!("{:?}: {}", raw, e),
        }
    })?;
    if id == 0 {
        return Err(TokenError::Config(format!(
            "{} must be a positive integer",
            field
        )));
    }
    Ok(id)
}

/// Optional TOML defaults file (`--config`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub github: GitHubFileConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubFileConfig {
    /// Path to the App private key
    pub pem: Option<PathBuf>,
    pub app_id: Option<u64>,
    pub installation_id: Option<u64>,
    /// JWT lifetime in seconds
    pub expiration: Option<u64>,
    /// REST API base URL (GitHub Enterprise Server)
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            TokenError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            TokenError::Config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }
}
