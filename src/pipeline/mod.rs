//! Installation token issuance.
//!
//! Key loading, JWT signing, token exchange and delivery run strictly in that
//! order. The first failure aborts; nothing is written unless a token was issued.

use chrono::Utc;
use std::io::Write;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::github::{generate_app_jwt, keys, GitHubAppClient, InstallationToken, Transport};
use crate::output;

/// Load the key, sign an App JWT and exchange it for an installation token.
pub async fn issue_token(
    config: &Config,
    transport: Arc<dyn Transport>,
) -> Result<InstallationToken> {
    let assertion = {
        let key = keys::load(&config.pem_path)?;
        info!(path = %config.pem_path.display(), "Loaded GitHub App private key");
        generate_app_jwt(&key, config.app_id, config.expiration_secs, Utc::now())?
    };
    info!(
        app_id = config.app_id,
        expiration_secs = config.expiration_secs,
        "Signed GitHub App JWT"
    );

    let client = GitHubAppClient::new(config.api_url.clone(), transport);
    let token = client.exchange(&assertion, config.installation_id).await?;
    info!(
        installation_id = config.installation_id,
        expires_at = %token.expires_at,
        "Issued installation access token"
    );

    Ok(token)
}

/// Issue a token and deliver it per `config.output`.
pub async fn run(
    config: &Config,
    transport: Arc<dyn Transport>,
    stdout: &mut impl Write,
) -> Result<()> {
    let token = issue_token(config, transport).await?;
    output::deliver(&token.token, config.output.as_deref(), stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TokenError;
    use crate::github::{GitHubAppClaims, TransportRequest, TransportResponse};
    use async_trait::async_trait;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
    use rsa::traits::PublicKeyParts;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Answers 201 only for a bearer JWT signed by the fixture key with the expected claims.
    struct VerifyingTransport {
        decoding_key: DecodingKey,
        app_id: u64,
        calls: AtomicUsize,
    }

    impl VerifyingTransport {
        fn new(app_id: u64) -> Arc<Self> {
            let key = keys::load(&fixture("rsa_pkcs8.pem")).unwrap();
            let public = key.public_key();
            let decoding_key = DecodingKey::from_rsa_components(
                &URL_SAFE_NO_PAD.encode(public.n().to_bytes_be()),
                &URL_SAFE_NO_PAD.encode(public.e().to_bytes_be()),
            )
            .unwrap();
            Arc::new(Self {
                decoding_key,
                app_id,
                calls: AtomicUsize::new(0),
            })
        }

        fn verify(&self, request: &TransportRequest) -> bool {
            let Some(jwt) = request
                .headers
                .iter()
                .find(|(name, _)| *name == "Authorization")
                .and_then(|(_, value)| value.strip_prefix("Bearer "))
            else {
                return false;
            };
            let validation = Validation::new(Algorithm::RS256);
            match decode::<GitHubAppClaims>(jwt, &self.decoding_key, &validation) {
                Ok(data) => {
                    data.claims.iss == self.app_id && data.claims.exp - data.claims.iat == 600
                }
                Err(_) => false,
            }
        }
    }

    #[async_trait]
    impl Transport for VerifyingTransport {
        async fn post(&self, request: TransportRequest) -> Result<TransportResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !request.url.ends_with("/app/installations/456/access_tokens") {
                return Ok(TransportResponse {
                    status: 404,
                    body: r#"{"message":"Not Found"}"#.to_string(),
                });
            }
            if !self.verify(&request) {
                return Ok(TransportResponse {
                    status: 401,
                    body: r#"{"message":"A JSON web token could not be decoded"}"#.to_string(),
                });
            }
            Ok(TransportResponse {
                status: 201,
                body: r#"{"token":"ghs_xxx","expires_at":"2030-01-01T00:10:00Z","permissions":{"contents":"read"},"repository_selection":"selected"}"#.to_string(),
            })
        }
    }

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    fn config(pem: &str) -> Config {
        Config {
            pem_path: fixture(pem),
            app_id: 123,
            installation_id: 456,
            expiration_secs: 600,
            output: None,
            api_url: "https://api.github.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_issue_token_with_pkcs1_key() {
        let token = issue_token(&config("rsa_pkcs1.pem"), VerifyingTransport::new(123))
            .await
            .unwrap();
        assert_eq!(token.token, "ghs_xxx");
        assert_eq!(token.repository_selection.as_deref(), Some("selected"));
    }

    #[tokio::test]
    async fn test_run_prints_token() {
        let mut out = Vec::new();
        run(&config("rsa_pkcs8.pem"), VerifyingTransport::new(123), &mut out)
            .await
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "ghs_xxx\n");
    }

    #[tokio::test]
    async fn test_run_writes_file_instead_of_stdout() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gh-token");
        let config = Config {
            output: Some(path.clone()),
            ..config("rsa_pkcs1.pem")
        };
        let mut out = Vec::new();

        run(&config, VerifyingTransport::new(123), &mut out)
            .await
            .unwrap();

        assert!(out.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ghs_xxx");
    }

    #[tokio::test]
    async fn test_rejected_jwt_surfaces_exchange_error() {
        let mut out = Vec::new();
        let err = run(&config("rsa_pkcs1.pem"), VerifyingTransport::new(999), &mut out)
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::Exchange { status: 401, .. }));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_key_failure_skips_exchange() {
        let transport = VerifyingTransport::new(123);
        let err = issue_token(&config("ec_pkcs8.pem"), transport.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::UnsupportedKeyType(_)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }
}
