//! Command-line interface for issuing a GitHub App installation token.
//!
//! Every flag may also be supplied through an environment variable or the
//! `[github]` table of a `--config` file. Flags win over the environment,
//! which wins over the file.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, FileConfig, Settings};
use crate::github::ReqwestTransport;
use crate::pipeline;

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "ghtoken")]
#[command(author, version, about = "Generate GitHub App installation access tokens", long_about = None)]
pub struct Cli {
    /// Path to the GitHub App private key PEM file (required)
    #[arg(long, env = "GITHUB_APP_PEM")]
    pub pem: Option<PathBuf>,

    /// GitHub App ID (required)
    #[arg(long, env = "GITHUB_APP_ID")]
    pub app: Option<String>,

    /// GitHub App Installation ID (required)
    #[arg(long, env = "GITHUB_INSTALLATION_ID")]
    pub install: Option<String>,

    /// JWT expiration time in seconds (default: 600)
    #[arg(long, env = "GITHUB_JWT_EXP")]
    pub exp: Option<u64>,

    /// Output file path (optional, defaults to stdout)
    #[arg(short, long, env = "GHTOKEN_OUTPUT")]
    pub output: Option<PathBuf>,

    /// GitHub API base URL (default: https://api.github.com)
    #[arg(long, env = "GITHUB_API_URL")]
    pub api_url: Option<String>,

    /// Path to a TOML file with default values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,
}

impl Cli {
    pub fn settings(&self) -> Settings {
        Settings {
            pem: self.pem.clone(),
            app_id: self.app.clone(),
            installation_id: self.install.clone(),
            expiration: self.exp,
            output: self.output.clone(),
            api_url: self.api_url.clone(),
        }
    }

    /// The `--config` file, or empty defaults when none was given.
    pub fn file_config(&self) -> Result<FileConfig> {
        match &self.config {
            Some(path) => Ok(FileConfig::load(path)?),
            None => Ok(FileConfig::default()),
        }
    }

    pub fn resolve(&self, file: &FileConfig) -> Result<Config> {
        Ok(Config::build(
            self.settings().with_file_defaults(&file.github),
        )?)
    }
}

/// Issue a token and write it to the configured destination
pub async fn run_command(cli: &Cli, file: &FileConfig) -> Result<()> {
    let config = cli.resolve(file)?;
    let transport = Arc::new(ReqwestTransport::new()?);

    pipeline::run(&config, transport, &mut std::io::stdout())
        .await
        .context("Failed to generate GitHub token")
}
