//! Error taxonomy for the token issuance pipeline.
//!
//! Every variant is fatal: the pipeline stops at the first error and nothing
//! is written to the output.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while issuing an installation access token
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to read private key {}: {source}", path.display())]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode PEM block: {0}")]
    KeyDecode(String),

    #[error("Failed to parse private key: {0}")]
    KeyParse(String),

    #[error("Key is not an RSA private key (algorithm {0})")]
    UnsupportedKeyType(String),

    #[error("Invalid {field}: {reason}")]
    Claims { field: &'static str, reason: String },

    #[error("Failed to sign JWT: {0}")]
    Signing(String),

    #[error("Failed to reach GitHub API: {0}")]
    Network(String),

    #[error("GitHub API request failed with status {status}: {body}")]
    Exchange { status: u16, body: String },

    #[error("Failed to parse installation token response: {0}")]
    ResponseParse(#[source] serde_json::Error),

    #[error("Failed to write token to {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, TokenError>;
