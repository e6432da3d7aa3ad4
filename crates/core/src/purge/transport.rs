//! HTTP transport to the purge API.
//!
//! [`PurgeTransport`] is the seam between the dispatcher and the network so
//! the dispatcher can be exercised against scripted responses. The
//! production implementation, [`HttpTransport`], wraps a single pooled
//! `reqwest::Client`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tracing::{debug, instrument, warn};

use crate::errors::TransportError;

/// A fully built and signed purge request.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Status and body of a purge API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Sends one POST to the purge API.
#[async_trait]
pub trait PurgeTransport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError>;
}

/// reqwest-backed transport with a bounded request timeout.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("edgeflush/", env!("CARGO_PKG_VERSION")))
            .build()?;
        debug!(timeout_secs = timeout.as_secs(), "created purge HTTP transport");
        Ok(Self { http, timeout })
    }
}

#[async_trait]
impl PurgeTransport for HttpTransport {
    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError> {
        let resp = self
            .http
            .post(&request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(self.timeout.as_secs())
                } else {
                    TransportError::Http(e)
                }
            })?;

        let status = resp.status().as_u16();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(status, error = %e, "could not read purge API response body");
                String::new()
            }
        };
        debug!(status, "purge API responded");
        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_transport_construction() {
        let transport = HttpTransport::new(Duration::from_secs(15)).unwrap();
        assert_eq!(transport.timeout, Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind then drop a listener to find a port with nothing behind it.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
        let result = transport
            .send(OutboundRequest {
                url: format!("http://{}/ccu/v3/remove/url/production", addr),
                headers: HeaderMap::new(),
                body: b"{}".to_vec(),
            })
            .await;
        assert!(matches!(result, Err(TransportError::Http(_))));
    }
}
