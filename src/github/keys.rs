//! Private key loading for GitHub App authentication.
//!
//! GitHub hands out App keys as PKCS#1 (`RSA PRIVATE KEY`) or, when the key
//! has been converted by other tooling, as PKCS#8 (`PRIVATE KEY`). Both are
//! accepted: the first PEM block is tried against an ordered list of
//! [`KeyParser`]s until one succeeds.

use jsonwebtoken::EncodingKey;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::PrivateKeyInfo;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::error::{Result, TokenError};

/// Why a single parser rejected the key bytes
#[derive(Debug)]
pub enum ParseFailure {
    /// The bytes are not in this parser's encoding; try the next one.
    Malformed(String),
    /// The encoding was understood but the key is not RSA. Stops the search.
    Unsupported(String),
}

/// One strategy for turning DER bytes into an RSA key.
pub trait KeyParser: Send + Sync {
    fn name(&self) -> &'static str;

    fn parse(&self, der: &[u8]) -> std::result::Result<RsaPrivateKey, ParseFailure>;
}

/// `RSA PRIVATE KEY` (PKCS#1)
pub struct Pkcs1Parser;

impl KeyParser for Pkcs1Parser {
    fn name(&self) -> &'static str {
        "PKCS#1"
    }

    fn parse(&self, der: &[u8]) -> std::result::Result<RsaPrivateKey, ParseFailure> {
        RsaPrivateKey::from_pkcs1_der(der).map_err(|e| ParseFailure::Malformed(e.to_string()))
    }
}

/// `PRIVATE KEY` (PKCS#8), restricted to the rsaEncryption algorithm
pub struct Pkcs8Parser;

impl KeyParser for Pkcs8Parser {
    fn name(&self) -> &'static str {
        "PKCS#8"
    }

    fn parse(&self, der: &[u8]) -> std::result::Result<RsaPrivateKey, ParseFailure> {
        let info =
            PrivateKeyInfo::try_from(der).map_err(|e| ParseFailure::Malformed(e.to_string()))?;

        let oid = info.algorithm.oid;
        if oid != rsa::pkcs1::ALGORITHM_OID {
            return Err(ParseFailure::Unsupported(algorithm_name(&oid.to_string())));
        }

        RsaPrivateKey::try_from(info).map_err(|e| ParseFailure::Malformed(e.to_string()))
    }
}

fn algorithm_name(oid: &str) -> String {
    match oid {
        "1.2.840.10045.2.1" => format!("EC ({})", oid),
        "1.3.101.112" => format!("Ed25519 ({})", oid),
        "1.3.101.113" => format!("Ed448 ({})", oid),
        "1.2.840.10040.4.1" => format!("DSA ({})", oid),
        _ => oid.to_string(),
    }
}

/// The parsers tried by [`load`], in order.
pub fn default_parsers() -> Vec<Box<dyn KeyParser>> {
    vec![Box::new(Pkcs1Parser), Box::new(Pkcs8Parser)]
}

/// An RSA private key loaded for signing. Never printed or persisted.
pub struct PrivateKey {
    inner: RsaPrivateKey,
}

impl PrivateKey {
    pub fn public_key(&self) -> RsaPublicKey {
        self.inner.to_public_key()
    }

    /// Signing key for `jsonwebtoken`, which takes PKCS#1 DER.
    pub fn encoding_key(&self) -> Result<EncodingKey> {
        let der = self
            .inner
            .to_pkcs1_der()
            .map_err(|e| TokenError::Signing(format!("Failed to encode RSA key: {}", e)))?;
        Ok(EncodingKey::from_rsa_der(der.as_bytes()))
    }
}

impl From<RsaPrivateKey> for PrivateKey {
    fn from(inner: RsaPrivateKey) -> Self {
        Self { inner }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey").finish_non_exhaustive()
    }
}

/// Read a PEM file and decode its first block into an RSA key.
pub fn load(path: &Path) -> Result<PrivateKey> {
    let data = std::fs::read(path).map_err(|source| TokenError::KeyRead {
        path: path.to_path_buf(),
        source,
    })?;
    decode_pem(&data, &default_parsers())
}

/// Decode the first PEM block in `data` with the given parsers.
pub fn decode_pem(data: &[u8], parsers: &[Box<dyn KeyParser>]) -> Result<PrivateKey> {
    let block = pem::parse(data).map_err(|e| TokenError::KeyDecode(e.to_string()))?;
    debug!(tag = block.tag(), "Decoded PEM block");

    let mut failures = Vec::with_capacity(parsers.len());
    for parser in parsers {
        match parser.parse(block.contents()) {
            Ok(key) => {
                debug!(format = parser.name(), "Parsed RSA private key");
                return Ok(PrivateKey::from(key));
            }
            Err(ParseFailure::Unsupported(algorithm)) => {
                return Err(TokenError::UnsupportedKeyType(algorithm));
            }
            Err(ParseFailure::Malformed(reason)) => {
                failures.push(format!("{}: {}", parser.name(), reason));
            }
        }
    }

    Err(TokenError::KeyParse(failures.join("; ")))
}
