//! # Signed URL Generation

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use subtle::ConstantTimeEq;

use super::errors::{BlobError, BlobResult};

/// HTTP method a signed URL is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlMethod {
    Get,
    Put,
}

impl UrlMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrlMethod::Get => "GET",
            UrlMethod::Put => "PUT",
        }
    }
}

impl fmt::Display for UrlMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UrlMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(UrlMethod::Get),
            "PUT" => Ok(UrlMethod::Put),
            other => Err(format!("unsupported method: {}", other)),
        }
    }
}

/// Signed URL generator
#[derive(Debug, Clone)]
pub struct SignedUrlGenerator {
    secret: Vec<u8>,
}

impl SignedUrlGenerator {
    /// Create a new generator
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: secret.to_vec(),
        }
    }

    /// Generate a signed URL valid for `ttl` from now
    pub fn generate(
        &self,
        bucket: &str,
        path: &str,
        method: UrlMethod,
        content_type: &str,
        ttl: Duration,
    ) -> SignedUrl {
        let expires_at = Utc::now() + ttl;
        let signature = self.sign(bucket, path, method, content_type, expires_at);

        SignedUrl {
            bucket: bucket.to_string(),
            path: path.to_string(),
            method,
            content_type: content_type.to_string(),
            expires_at,
            signature,
        }
    }

    /// Verify a signed URL
    pub fn verify(&self, url: &SignedUrl) -> BlobResult<()> {
        if Utc::now() > url.expires_at {
            return Err(BlobError::UrlExpired);
        }

        let expected = self.sign(
            &url.bucket,
            &url.path,
            url.method,
            &url.content_type,
            url.expires_at,
        );
        let matches: bool = url.signature.as_bytes().ct_eq(expected.as_bytes()).into();
        if !matches {
            return Err(BlobError::InvalidSignature);
        }

        Ok(())
    }

    fn sign(
        &self,
        bucket: &str,
        path: &str,
        method: UrlMethod,
        content_type: &str,
        expires_at: DateTime<Utc>,
    ) -> String {
        let message = format!(
            "{}/{}/{}/{}/{}",
            method,
            bucket,
            path,
            content_type,
            expires_at.timestamp()
        );

        // Keyed digest: secret followed by the canonical message
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        hasher.update(message.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

/// A signed URL
#[derive(Debug, Clone)]
pub struct SignedUrl {
    pub bucket: String,
    pub path: String,
    pub method: UrlMethod,
    pub content_type: String,
    pub expires_at: DateTime<Utc>,
    pub signature: String,
}

impl SignedUrl {
    /// Render the URL against a base address
    pub fn to_url(&self, base_url: &str) -> String {
        format!(
            "{}/{}/{}?method={}&expires={}&token={}",
            base_url.trim_end_matches('/'),
            self.bucket,
            self.path,
            self.method,
            self.expires_at.timestamp(),
            self.signature
        )
    }
}
