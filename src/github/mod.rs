//! GitHub App authentication.
//!
//! This module provides:
//! - Private key loading (PKCS#1 and PKCS#8)
//! - JWT generation for App authentication
//! - Exchange of the App JWT for an installation access token

pub mod api_client;
pub mod keys;
pub mod token_manager;

pub use api_client::{
    GitHubAppClient, InstallationToken, ReqwestTransport, Transport, TransportRequest,
    TransportResponse,
};
pub use keys::{KeyParser, PrivateKey};
pub use token_manager::{generate_app_jwt, GitHubAppClaims, SignedAssertion};
