//! App JWT construction for GitHub App authentication.
//!
//! GitHub Apps authenticate as themselves with a short-lived JWT signed by the
//! app's private key. The JWT is only ever used once, to request an
//! installation access token.

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, Header};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::keys::PrivateKey;
use crate::error::{Result, TokenError};

/// JWT claims for GitHub App authentication.
/// GitHub requires: iat (issued at), exp (expiration), iss (issuer = app_id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubAppClaims {
    /// Issued at time (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer - the GitHub App ID
    pub iss: u64,
}

impl GitHubAppClaims {
    /// Derive the claims from a single reading of the clock.
    ///
    /// No upper bound is applied to `lifetime_secs`; GitHub decides what it accepts.
    pub fn new(app_id: u64, lifetime_secs: u64, now: DateTime<Utc>) -> Result<Self> {
        let iat = now.timestamp();
        let exp = i64::try_from(lifetime_secs)
            .ok()
            .and_then(|secs| iat.checked_add(secs))
            .ok_or_else(|| TokenError::Claims {
                field: "expiration",
                reason: format!("{} seconds is out of range", lifetime_secs),
            })?;

        Ok(Self {
            iat,
            exp,
            iss: app_id,
        })
    }
}

/// A compact, signed JWT (`header.claims.signature`).
#[derive(Clone, PartialEq, Eq)]
pub struct SignedAssertion(String);

impl SignedAssertion {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SignedAssertion {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl fmt::Debug for SignedAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignedAssertion(<{} bytes>)", self.0.len())
    }
}

/// Sign `claims` with RS256 (RSA-SHA256).
pub fn sign_claims(key: &PrivateKey, claims: &GitHubAppClaims) -> Result<SignedAssertion> {
    let header = Header::new(Algorithm::RS256);
    let encoding_key = key.encoding_key()?;

    let token = encode(&header, claims, &encoding_key)
        .map_err(|e| TokenError::Signing(e.to_string()))?;

    Ok(SignedAssertion(token))
}

/// Generate a JWT for GitHub App authentication.
///
/// # Example
/// ```ignore
/// let jwt = generate_app_jwt(&key, 12345, 600, Utc::now())?;
/// // Use: Authorization: Bearer {jwt}
/// ```
pub fn generate_app_jwt(
    key: &PrivateKey,
    app_id: u64,
    lifetime_secs: u64,
    now: DateTime<Utc>,
) -> Result<SignedAssertion> {
    let claims = GitHubAppClaims::new(app_id, lifetime_secs, now)?;
    sign_claims(key, &claims)
}
