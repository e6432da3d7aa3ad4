//! Purge request construction, signing, delivery and classification.
//!
//! One dispatch runs `BUILDING -> SIGNED -> SENT -> CONFIRMED | FAILED`.
//! Building and signing faults are returned as [`DispatchError`] and never
//! touch the network. Everything after the request leaves is a
//! [`DispatchResult`]; a failed result raises exactly one alert.

use std::future::Future;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use tracing::{debug, error, info, instrument, warn};

use super::transport::{OutboundRequest, PurgeTransport};
use super::DispatcherConfig;
use crate::config::TRANSPORT_SCHEME;
use crate::edgegrid::{Credential, EdgeGridSigner};
use crate::errors::{DispatchError, SigningError, TransportError};
use crate::models::{DispatchResult, Network, PurgeMode, PurgeRequest, PurgeTarget, PurgeType};
use crate::notify::AlertSink;

/// HTTP status the purge API returns when a request is queued.
pub const PURGE_ACCEPTED: u16 = 201;

/// Longest slice of a response body quoted in a failure message.
const MAX_BODY_IN_MESSAGE: usize = 512;

/// Sends signed purge requests and reports the outcome.
///
/// Holds no mutable state; one instance can serve concurrent callers.
pub struct PurgeDispatcher {
    config: DispatcherConfig,
    signer: EdgeGridSigner,
    transport: Arc<dyn PurgeTransport>,
    alerts: Arc<dyn AlertSink>,
}

impl PurgeDispatcher {
    /// Create a dispatcher. Fails if the credential cannot sign requests.
    pub fn new(
        config: DispatcherConfig,
        credential: Credential,
        transport: Arc<dyn PurgeTransport>,
        alerts: Arc<dyn AlertSink>,
    ) -> Result<Self, DispatchError> {
        let signer = EdgeGridSigner::new(credential, config.signing.clone())?;
        let dispatcher = Self {
            config,
            signer,
            transport,
            alerts,
        };
        if dispatcher.basic_credential_superseded() {
            info!(
                header = %dispatcher.config.signature_header,
                "transport_user is set but the EdgeGrid signature occupies Authorization; \
                 the basic credential is not sent"
            );
        }
        info!(host = %dispatcher.config.host, "purge dispatcher ready");
        Ok(dispatcher)
    }

    /// Whether the signature header overwrites the configured basic credential.
    pub fn basic_credential_superseded(&self) -> bool {
        self.config.transport_user.is_some()
            && self
                .config
                .signature_header
                .eq_ignore_ascii_case(AUTHORIZATION.as_str())
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Full endpoint URL for `mode`.
    ///
    /// A configured transport URI replaces the API host (its `akamai://`
    /// scheme becomes `https://`); the CCU path is appended either way.
    pub fn endpoint(&self, mode: &PurgeMode) -> String {
        let base = match self.config.transport_uri.as_deref().map(str::trim) {
            Some(uri) if !uri.is_empty() => {
                if uri.to_ascii_lowercase().starts_with(TRANSPORT_SCHEME) {
                    format!("https://{}", &uri[TRANSPORT_SCHEME.len()..])
                } else {
                    uri.to_string()
                }
            }
            _ => {
                let host = self.config.host.trim();
                if host.contains("://") {
                    host.to_string()
                } else {
                    format!("https://{}", host)
                }
            }
        };
        format!("{}{}", base.trim_end_matches('/'), mode.path_suffix())
    }

    /// Build the purge request for `mode`.
    ///
    /// URL mode purges `targets` verbatim. CP-code mode purges the
    /// configured CP codes and ignores `targets`.
    pub fn build_request(
        &self,
        targets: &[PurgeTarget],
        mode: &PurgeMode,
    ) -> Result<PurgeRequest, DispatchError> {
        let objects = match mode.kind {
            PurgeType::Url => targets.to_vec(),
            PurgeType::CpCode => {
                if !targets.is_empty() {
                    debug!(
                        discarded = targets.len(),
                        "CP code mode: resolved targets replaced by configured CP codes"
                    );
                }
                self.config.cp_codes.clone()
            }
        };
        PurgeRequest::new(*mode, objects)
    }

    /// Attach content type, basic credential and EdgeGrid signature.
    pub fn sign_request(&self, request: &PurgeRequest) -> Result<OutboundRequest, DispatchError> {
        let url = self.endpoint(&request.mode());
        let body = request.body();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let basic = self.basic_credential()?;
        if let Some(value) = basic.clone() {
            headers.insert(AUTHORIZATION, value);
        }

        let signature = self.signer.sign(&Method::POST, &url, &headers, &body)?;

        let name = HeaderName::from_bytes(self.config.signature_header.as_bytes())
            .map_err(|_| SigningError::InvalidHeader(self.config.signature_header.clone()))?;
        let value = HeaderValue::from_str(&signature)
            .map_err(|_| SigningError::InvalidHeader(self.config.signature_header.clone()))?;
        if name == AUTHORIZATION && basic.is_some() {
            debug!("EdgeGrid signature replaces the basic credential in Authorization");
        }
        headers.insert(name, value);

        Ok(OutboundRequest { url, headers, body })
    }

    fn basic_credential(&self) -> Result<Option<HeaderValue>, SigningError> {
        let Some(ref user) = self.config.transport_user else {
            return Ok(None);
        };
        let password = self.config.transport_password.as_deref().unwrap_or_default();
        let encoded = BASE64.encode(format!("{}:{}", user, password));
        HeaderValue::from_str(&format!("Basic {}", encoded))
            .map(Some)
            .map_err(|_| SigningError::InvalidHeader(AUTHORIZATION.to_string()))
    }

    /// Connection test: purge the fixed test object on the staging network.
    #[instrument(skip(self))]
    pub async fn test(&self) -> Result<DispatchResult, DispatchError> {
        let mode = PurgeMode::new(self.config.test_action, PurgeType::Url, Network::Staging);
        let request = PurgeRequest::new(mode, vec![PurgeTarget::new(self.config.test_object.as_str())])?;
        info!(object = %self.config.test_object, "sending purge connection test");
        self.dispatch(request, std::future::pending()).await
    }

    /// Submit a purge for `targets` under `mode`.
    #[instrument(skip(self, targets), fields(count = targets.len(), mode = %mode))]
    pub async fn submit(
        &self,
        targets: &[PurgeTarget],
        mode: &PurgeMode,
    ) -> Result<DispatchResult, DispatchError> {
        let request = self.build_request(targets, mode)?;
        self.dispatch(request, std::future::pending()).await
    }

    /// Like [`submit`](Self::submit), but abandons the HTTP exchange when
    /// `cancel` completes first. A cancelled exchange is a failed result.
    #[instrument(skip(self, targets, cancel), fields(count = targets.len(), mode = %mode))]
    pub async fn submit_until<F>(
        &self,
        targets: &[PurgeTarget],
        mode: &PurgeMode,
        cancel: F,
    ) -> Result<DispatchResult, DispatchError>
    where
        F: Future<Output = ()> + Send,
    {
        let request = self.build_request(targets, mode)?;
        self.dispatch(request, cancel).await
    }

    async fn dispatch<F>(
        &self,
        request: PurgeRequest,
        cancel: F,
    ) -> Result<DispatchResult, DispatchError>
    where
        F: Future<Output = ()> + Send,
    {
        let outbound = self.sign_request(&request)?;
        debug!(url = %outbound.url, objects = request.objects().len(), "purge request signed");

        let sent = tokio::select! {
            res = self.transport.send(outbound) => res,
            _ = cancel => Err(TransportError::Cancelled),
        };

        let result = match sent {
            Ok(resp) if resp.status == PURGE_ACCEPTED => {
                info!(
                    status = resp.status,
                    objects = request.objects().len(),
                    "purge request accepted"
                );
                DispatchResult::ok(
                    resp.status,
                    format!("purge request accepted for {} object(s)", request.objects().len()),
                )
            }
            Ok(resp) => {
                let message = format!(
                    "purge API returned HTTP {}: {}",
                    resp.status,
                    truncate(resp.body.trim(), MAX_BODY_IN_MESSAGE)
                );
                self.fail(Some(resp.status), message, request.objects()).await
            }
            Err(e) => {
                let message = format!("purge request could not be delivered: {}", e);
                self.fail(None, message, request.objects()).await
            }
        };
        Ok(result)
    }

    async fn fail(
        &self,
        status: Option<u16>,
        message: String,
        objects: &[PurgeTarget],
    ) -> DispatchResult {
        warn!(status = ?status, objects = objects.len(), %message, "purge request failed");
        let alert = self.alerts.notify(&message, objects);
        match tokio::time::timeout(self.config.alert_timeout, alert).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "failed to deliver purge failure alert"),
            Err(_) => warn!(
                timeout_ms = self.config.alert_timeout.as_millis() as u64,
                "purge failure alert did not complete in time; abandoned"
            ),
        }
        DispatchResult::failed(status, message)
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
