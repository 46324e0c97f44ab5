//! Issue short-lived GitHub App installation access tokens.
//!
//! The App's RSA private key signs a JWT, which is exchanged once at
//! `POST /app/installations/{id}/access_tokens` for an installation token.

pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod output;
pub mod pipeline;

pub use config::Config;
pub use error::{Result, TokenError};
pub use pipeline::{issue_token, run};
