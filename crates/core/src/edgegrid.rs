//! EdgeGrid (`EG1-HMAC-SHA256`) request signing.
//!
//! The signature binds the request method, scheme, host, path and query,
//! a configurable set of headers, and a SHA-256 digest of the body to the
//! client secret. Every signature carries a UTC timestamp and a fresh
//! UUID nonce.
//!
//! ```text
//! signing_key = base64(HMAC-SHA256(client_secret, timestamp))
//! data        = METHOD \t scheme \t host \t path?query \t headers \t body_hash \t auth_prefix
//! signature   = base64(HMAC-SHA256(signing_key, data))
//! ```

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::HeaderMap;
use reqwest::{Method, Url};
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

use crate::errors::SigningError;

type HmacSha256 = Hmac<Sha256>;

/// Default number of body bytes covered by the content hash.
pub const DEFAULT_MAX_BODY: usize = 131_072;

const ALGORITHM: &str = "EG1-HMAC-SHA256";

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// EdgeGrid API client credential.
///
/// Loaded once at startup and shared read-only. `Debug` never prints the
/// tokens or the secret.
#[derive(Clone)]
pub struct Credential {
    access_token: String,
    client_token: String,
    client_secret: String,
    host: String,
}

impl Credential {
    pub fn new(
        access_token: impl Into<String>,
        client_token: impl Into<String>,
        client_secret: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            client_token: client_token.into(),
            client_secret: client_secret.into(),
            host: host.into(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn client_token(&self) -> &str {
        &self.client_token
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn check(&self) -> Result<(), SigningError> {
        if self.access_token.is_empty() {
            return Err(SigningError::MissingCredential("access_token"));
        }
        if self.client_token.is_empty() {
            return Err(SigningError::MissingCredential("client_token"));
        }
        if self.client_secret.is_empty() {
            return Err(SigningError::MissingCredential("client_secret"));
        }
        if self.host.is_empty() {
            return Err(SigningError::MissingCredential("host"));
        }
        Ok(())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("client_token", &"<redacted>")
            .field("client_secret", &"<redacted>")
            .field("host", &self.host)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Signer
// ---------------------------------------------------------------------------

/// Tunables for the signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningConfig {
    /// Body bytes beyond this limit are not hashed.
    pub max_body: usize,
    /// Header names (case-insensitive) covered by the signature, in order.
    pub headers_to_sign: Vec<String>,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            max_body: DEFAULT_MAX_BODY,
            headers_to_sign: Vec::new(),
        }
    }
}

/// Computes `Authorization` values for the EdgeGrid scheme.
#[derive(Debug, Clone)]
pub struct EdgeGridSigner {
    credential: Credential,
    config: SigningConfig,
}

impl EdgeGridSigner {
    /// Create a signer. Fails if any credential field is empty.
    pub fn new(credential: Credential, config: SigningConfig) -> Result<Self, SigningError> {
        credential.check()?;
        Ok(Self { credential, config })
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Sign a request with the current time and a fresh nonce.
    pub fn sign(
        &self,
        method: &Method,
        url: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<String, SigningError> {
        let timestamp = format_timestamp(Utc::now());
        let nonce = Uuid::new_v4().to_string();
        self.sign_with(&timestamp, &nonce, method, url, headers, body)
    }

    /// Deterministic signing core: the caller supplies timestamp and nonce.
    pub fn sign_with(
        &self,
        timestamp: &str,
        nonce: &str,
        method: &Method,
        url: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<String, SigningError> {
        let parsed = Url::parse(url).map_err(|e| SigningError::InvalidUrl {
            url: url.to_string(),
            detail: e.to_string(),
        })?;
        let host = match (parsed.host_str(), parsed.port()) {
            (Some(h), Some(p)) => format!("{}:{}", h, p),
            (Some(h), None) => h.to_string(),
            (None, _) => {
                return Err(SigningError::InvalidUrl {
                    url: url.to_string(),
                    detail: "URL has no host".into(),
                })
            }
        };
        let mut relative = parsed.path().to_string();
        if let Some(query) = parsed.query() {
            relative.push('?');
            relative.push_str(query);
        }

        let auth_prefix = format!(
            "{} client_token={};access_token={};timestamp={};nonce={};",
            ALGORITHM, self.credential.client_token, self.credential.access_token, timestamp, nonce
        );

        let data_to_sign = [
            method.as_str().to_ascii_uppercase(),
            parsed.scheme().to_string(),
            host,
            relative,
            self.canonical_headers(headers)?,
            self.content_hash(method, body),
            auth_prefix.clone(),
        ]
        .join("\t");

        let signing_key = hmac_base64(self.credential.client_secret.as_bytes(), timestamp.as_bytes())?;
        let signature = hmac_base64(signing_key.as_bytes(), data_to_sign.as_bytes())?;

        debug!(method = %method, nonce, "signed purge API request");
        Ok(format!("{}signature={}", auth_prefix, signature))
    }

    fn canonical_headers(&self, headers: &HeaderMap) -> Result<String, SigningError> {
        let mut parts = Vec::with_capacity(self.config.headers_to_sign.len());
        for name in &self.config.headers_to_sign {
            let Some(value) = headers.get(name.as_str()) else {
                continue;
            };
            let value = value
                .to_str()
                .map_err(|_| SigningError::InvalidHeader(name.clone()))?;
            let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
            parts.push(format!("{}:{}", name.to_ascii_lowercase(), collapsed));
        }
        Ok(parts.join("\t"))
    }

    fn content_hash(&self, method: &Method, body: &[u8]) -> String {
        if *method != Method::POST || body.is_empty() {
            return String::new();
        }
        let end = body.len().min(self.config.max_body);
        BASE64.encode(Sha256::digest(&body[..end]))
    }
}

/// EdgeGrid timestamp: `YYYYMMDDTHH:MM:SS+0000`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H:%M:%S+0000").to_string()
}

fn hmac_base64(key: &[u8], data: &[u8]) -> Result<String, SigningError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| SigningError::Hmac(e.to_string()))?;
    mac.update(data);
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use reqwest::header::HeaderValue;

    const TS: &str = "20140321T19:34:21+0000";
    const NONCE: &str = "nonce-xx-xxxx-xxxx-xxxx-xxxxxxxxxxxx";
    const HOST: &str = "akaa-baseurl-xxxxxxxxxxx-xxxxxxxxxxxxx.luna.akamaiapis.net";

    fn signer(config: SigningConfig) -> EdgeGridSigner {
        EdgeGridSigner::new(
            Credential::new(
                "akab-access-token-xxx-xxxxxxxxxxxxxxxx",
                "akab-client-token-xxx-xxxxxxxxxxxxxxxx",
                "SOMESECRET",
                HOST,
            ),
            config,
        )
        .unwrap()
    }

    fn prefix() -> String {
        format!(
            "EG1-HMAC-SHA256 client_token=akab-client-token-xxx-xxxxxxxxxxxxxxxx;\
             access_token=akab-access-token-xxx-xxxxxxxxxxxxxxxx;timestamp={};nonce={};",
            TS, NONCE
        )
    }

    #[test]
    fn test_timestamp_format() {
        let at = Utc.with_ymd_and_hms(2014, 3, 21, 19, 34, 21).unwrap();
        assert_eq!(format_timestamp(at), TS);
    }

    #[test]
    fn test_sign_simple_get() {
        let value = signer(SigningConfig::default())
            .sign_with(TS, NONCE, &Method::GET, &format!("https://{}/", HOST), &HeaderMap::new(), b"")
            .unwrap();
        assert_eq!(
            value,
            format!("{}signature=MY1mmxCqlyWh8XrFw3kxSlb6/AxJUXsjtZm6xqzmkjE=", prefix())
        );
    }

    #[test]
    fn test_sign_purge_post() {
        let body = br#"{"objects":["https://www.mercer.com/us/about.html"]}"#;
        let value = signer(SigningConfig::default())
            .sign_with(
                TS,
                NONCE,
                &Method::POST,
                &format!("https://{}/ccu/v3/remove/url/production", HOST),
                &HeaderMap::new(),
                body,
            )
            .unwrap();
        assert_eq!(
            value,
            format!("{}signature=DdjRartL8szLF7lXFEiU8+Pq7ujuT5zyYZEXpMBFNss=", prefix())
        );
    }

    #[test]
    fn test_content_hash_only_for_post() {
        let s = signer(SigningConfig::default());
        let body = br#"{"objects":["https://www.mercer.com/us/about.html"]}"#;
        assert_eq!(
            s.content_hash(&Method::POST, body),
            "0D2ydCg5fh2HUBMQ58RmwZtilxU8CQwCFRls8t6GXEY="
        );
        assert_eq!(s.content_hash(&Method::PUT, body), "");
        assert_eq!(s.content_hash(&Method::POST, b""), "");
    }

    #[test]
    fn test_content_hash_truncates_at_max_body() {
        let s = signer(SigningConfig {
            max_body: 4,
            headers_to_sign: Vec::new(),
        });
        assert_eq!(
            s.content_hash(&Method::POST, b"abcdefgh"),
            s.content_hash(&Method::POST, b"abcd")
        );
    }

    #[test]
    fn test_canonical_headers_collapse_whitespace() {
        let s = signer(SigningConfig {
            max_body: DEFAULT_MAX_BODY,
            headers_to_sign: vec!["X-Test1".into(), "X-Missing".into(), "X-Test2".into()],
        });
        let mut headers = HeaderMap::new();
        headers.insert("x-test1", HeaderValue::from_static("  first   value "));
        headers.insert("x-test2", HeaderValue::from_static("second"));
        assert_eq!(
            s.canonical_headers(&headers).unwrap(),
            "x-test1:first value\tx-test2:second"
        );
    }

    #[test]
    fn test_signed_headers_change_signature() {
        let url = format!("https://{}/ccu/v3/remove/url/production", HOST);
        let plain = signer(SigningConfig::default())
            .sign_with(TS, NONCE, &Method::POST, &url, &HeaderMap::new(), b"{}")
            .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("x-purge-source", HeaderValue::from_static("agent"));
        let covered = signer(SigningConfig {
            max_body: DEFAULT_MAX_BODY,
            headers_to_sign: vec!["X-Purge-Source".into()],
        })
        .sign_with(TS, NONCE, &Method::POST, &url, &headers, b"{}")
        .unwrap();

        assert_ne!(plain, covered);
    }

    #[test]
    fn test_query_is_signed() {
        let s = signer(SigningConfig::default());
        let a = s
            .sign_with(TS, NONCE, &Method::GET, &format!("https://{}/a?x=1", HOST), &HeaderMap::new(), b"")
            .unwrap();
        let b = s
            .sign_with(TS, NONCE, &Method::GET, &format!("https://{}/a?x=2", HOST), &HeaderMap::new(), b"")
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_fresh_nonce_per_signature() {
        let s = signer(SigningConfig::default());
        let url = format!("https://{}/", HOST);
        let a = s.sign(&Method::GET, &url, &HeaderMap::new(), b"").unwrap();
        let b = s.sign(&Method::GET, &url, &HeaderMap::new(), b"").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("EG1-HMAC-SHA256 client_token="));
    }

    #[test]
    fn test_rejects_empty_credential_field() {
        let result = EdgeGridSigner::new(
            Credential::new("a", "c", "", HOST),
            SigningConfig::default(),
        );
        assert!(matches!(
            result,
            Err(SigningError::MissingCredential("client_secret"))
        ));
    }

    #[test]
    fn test_rejects_relative_url() {
        let result = signer(SigningConfig::default()).sign(
            &Method::POST,
            "/ccu/v3/remove/url/production",
            &HeaderMap::new(),
            b"{}",
        );
        assert!(matches!(result, Err(SigningError::InvalidUrl { .. })));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let credential = Credential::new("akab-access", "akab-client", "topsecret", HOST);
        let rendered = format!("{:?}", credential);
        assert!(!rendered.contains("topsecret"));
        assert!(!rendered.contains("akab-access"));
        assert!(rendered.contains(HOST));
    }
}
