//! Error types for the EdgeFlush core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.
//!
//! Dispatch failures that reach the CDN (non-201 responses, transport
//! faults) are *results*, not errors: they surface as a failed
//! [`DispatchResult`](crate::models::DispatchResult). Only the fatal classes
//! below propagate out of the dispatcher.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A required environment variable is not set.
    #[error("required environment variable '{var}' is not set (referenced by config field '{field}')")]
    EnvVarMissing { var: String, field: String },

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Path mapping errors
// ---------------------------------------------------------------------------

/// Errors from mapping-list loading and path resolution.
#[derive(Debug, Error)]
pub enum MappingError {
    /// A changed path matched a non-exact entry but has no enclosing page.
    #[error("no containing page found for '{path}'")]
    ContainingPageNotFound { path: String },

    /// The mapping file could not be loaded.
    #[error("mapping file error at '{path}': {detail}")]
    MappingFileError { path: String, detail: String },

    /// TOML parse / serialize error for the mapping file.
    #[error("mapping file parse error: {0}")]
    ParseError(String),

    /// Generic I/O error.
    #[error("mapping I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Signing errors
// ---------------------------------------------------------------------------

/// Errors raised while computing the EdgeGrid request signature.
#[derive(Debug, Error)]
pub enum SigningError {
    /// A credential component is empty.
    #[error("credential field '{0}' is empty")]
    MissingCredential(&'static str),

    /// The request URL could not be parsed or has no host.
    #[error("cannot sign request for URL '{url}': {detail}")]
    InvalidUrl { url: String, detail: String },

    /// A header value could not be represented in an HTTP header.
    #[error("invalid value for header '{0}'")]
    InvalidHeader(String),

    /// The HMAC key could not be initialised.
    #[error("HMAC initialisation failed: {0}")]
    Hmac(String),
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Errors from the HTTP exchange with the purge API.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP-level transport error (network, TLS, etc.).
    #[error("purge API HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("purge API request timed out after {0}s")]
    Timeout(u64),

    /// The caller cancelled the exchange before it completed.
    #[error("purge request cancelled before completion")]
    Cancelled,

    /// The transport produced no response at all.
    #[error("purge API returned no response")]
    NoResponse,
}

// ---------------------------------------------------------------------------
// Dispatch errors
// ---------------------------------------------------------------------------

/// Fatal dispatch errors. These never reach the network.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The effective object list (URLs or CP codes) is empty.
    #[error("no CP codes or URLs to purge")]
    NoTargets,

    /// Signature construction failed.
    #[error("request signing failed: {0}")]
    Signing(#[from] SigningError),
}

// ---------------------------------------------------------------------------
// Notification errors
// ---------------------------------------------------------------------------

/// Errors from the notification subsystem (Slack, email).
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Slack webhook delivery failed.
    #[error("Slack notification failed: {0}")]
    SlackError(String),

    /// Email delivery failed.
    #[error("email notification failed: {0}")]
    EmailError(String),

    /// HTTP error during notification delivery.
    #[error("notification HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// All notification channels failed.
    #[error("all notification channels failed: {0}")]
    AllChannelsFailed(String),
}

// ---------------------------------------------------------------------------
// Agent errors
// ---------------------------------------------------------------------------

/// Errors from handling a single change event.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Path resolution failed; nothing was sent.
    #[error("path resolution failed: {0}")]
    Mapping(#[from] MappingError),

    /// The dispatcher refused the request before sending it.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = MappingError::ContainingPageNotFound {
            path: "/content/mercer/us/x".into(),
        };
        assert_eq!(
            err.to_string(),
            "no containing page found for '/content/mercer/us/x'"
        );

        let err = DispatchError::NoTargets;
        assert_eq!(err.to_string(), "no CP codes or URLs to purge");

        let err = ConfigError::EnvVarMissing {
            var: "EDGEGRID_CLIENT_SECRET".into(),
            field: "edgegrid.client_secret_env".into(),
        };
        assert!(err.to_string().contains("EDGEGRID_CLIENT_SECRET"));

        let err = TransportError::Timeout(15);
        assert!(err.to_string().contains("15s"));
    }

    #[test]
    fn test_core_error_from_subsystem() {
        let core_err: CoreError = SigningError::MissingCredential("client_secret").into();
        assert!(matches!(core_err, CoreError::Signing(_)));

        let dispatch_err: DispatchError = SigningError::MissingCredential("host").into();
        assert!(matches!(dispatch_err, DispatchError::Signing(_)));

        let agent_err: AgentError = DispatchError::NoTargets.into();
        assert!(matches!(agent_err, AgentError::Dispatch(DispatchError::NoTargets)));
    }

    #[test]
    fn test_dispatch_error_classes() {
        // Config faults surface before a dispatcher exists; only these two reach callers.
        let classify = |err: &DispatchError| match err {
            DispatchError::NoTargets => "no-targets",
            DispatchError::Signing(_) => "signing",
        };
        assert_eq!(classify(&DispatchError::NoTargets), "no-targets");
        assert_eq!(
            classify(&SigningError::MissingCredential("client_token").into()),
            "signing"
        );
    }
}
