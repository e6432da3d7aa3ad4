//! CDN purge dispatch: request building, signing, delivery and failure
//! handling against the CCU v3 purge API.

pub mod dispatcher;
pub mod transport;

use std::fmt;
use std::time::Duration;

use crate::edgegrid::SigningConfig;
use crate::models::{PurgeAction, PurgeTarget};

pub use dispatcher::{PurgeDispatcher, PURGE_ACCEPTED};
pub use transport::{HttpTransport, OutboundRequest, PurgeTransport, TransportResponse};

/// Static dispatcher settings, fixed for the lifetime of a dispatcher.
#[derive(Clone)]
pub struct DispatcherConfig {
    /// API host from the credential (scheme optional).
    pub host: String,
    /// Optional `akamai://` transport URI that overrides the host.
    pub transport_uri: Option<String>,
    /// Basic-auth user for the transport.
    pub transport_user: Option<String>,
    /// Basic-auth password for the transport.
    pub transport_password: Option<String>,
    /// Objects purged in CP-code mode.
    pub cp_codes: Vec<PurgeTarget>,
    /// URL purged by the connection test.
    pub test_object: String,
    /// Purge action used by the connection test.
    pub test_action: PurgeAction,
    /// Header that carries the EdgeGrid signature.
    pub signature_header: String,
    /// Longest wait for the alert sink after a failed dispatch.
    pub alert_timeout: Duration,
    pub signing: SigningConfig,
}

impl fmt::Debug for DispatcherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherConfig")
            .field("host", &self.host)
            .field("transport_uri", &self.transport_uri)
            .field("transport_user", &self.transport_user)
            .field(
                "transport_password",
                &self.transport_password.as_ref().map(|_| "<redacted>"),
            )
            .field("cp_codes", &self.cp_codes)
            .field("test_object", &self.test_object)
            .field("test_action", &self.test_action)
            .field("signature_header", &self.signature_header)
            .field("alert_timeout", &self.alert_timeout)
            .field("signing", &self.signing)
            .finish()
    }
}
