//! Domain model types used throughout EdgeFlush.
//!
//! These types bridge the path mapper, the purge dispatcher, the agent and
//! the daemon API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, DispatchError};

// ---------------------------------------------------------------------------
// Mapping entries & purge targets
// ---------------------------------------------------------------------------

/// One prefix -> target-host rule from the externally maintained mapping list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// Repository path prefix, e.g. `/content/mercer/us`.
    pub prefix: String,
    /// Public base URL (or opaque target) the prefix maps to.
    pub target: String,
}

impl MappingEntry {
    pub fn new(prefix: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            target: target.into(),
        }
    }
}

/// A single resolved flush target: an absolute URL or an opaque CP code.
///
/// No identity beyond the string value; duplicates are forwarded as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurgeTarget(String);

impl PurgeTarget {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PurgeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PurgeTarget {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PurgeTarget {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// Purge mode axes
// ---------------------------------------------------------------------------

/// Purge semantics: evict or mark stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurgeAction {
    #[default]
    Remove,
    Invalidate,
}

/// Whether purge objects are URLs or CP codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurgeType {
    #[default]
    Url,
    #[serde(rename = "cpcode")]
    CpCode,
}

/// Target CDN network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Staging,
    #[default]
    Production,
}

impl fmt::Display for PurgeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remove => write!(f, "remove"),
            Self::Invalidate => write!(f, "invalidate"),
        }
    }
}

impl fmt::Display for PurgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url => write!(f, "url"),
            Self::CpCode => write!(f, "cpcode"),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Staging => write!(f, "staging"),
            Self::Production => write!(f, "production"),
        }
    }
}

fn invalid_token(field: &str, value: &str, allowed: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        detail: format!("'{}' is not one of {}", value, allowed),
    }
}

impl FromStr for PurgeAction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remove" => Ok(Self::Remove),
            "invalidate" => Ok(Self::Invalidate),
            _ => Err(invalid_token("purge.action", s, "remove, invalidate")),
        }
    }
}

impl FromStr for PurgeType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "url" => Ok(Self::Url),
            "cpcode" => Ok(Self::CpCode),
            _ => Err(invalid_token("purge.type", s, "url, cpcode")),
        }
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "staging" => Ok(Self::Staging),
            "production" => Ok(Self::Production),
            _ => Err(invalid_token("purge.network", s, "staging, production")),
        }
    }
}

/// The three purge axes, resolved once per agent instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeMode {
    #[serde(default)]
    pub action: PurgeAction,
    #[serde(default, rename = "type")]
    pub kind: PurgeType,
    #[serde(default)]
    pub network: Network,
}

impl PurgeMode {
    pub fn new(action: PurgeAction, kind: PurgeType, network: Network) -> Self {
        Self {
            action,
            kind,
            network,
        }
    }

    /// The CCU v3 route for this mode: `/ccu/v3/{action}/{type}/{network}`.
    pub fn path_suffix(&self) -> String {
        format!("/ccu/v3/{}/{}/{}", self.action, self.kind, self.network)
    }
}

impl fmt::Display for PurgeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.action, self.kind, self.network)
    }
}

// ---------------------------------------------------------------------------
// Purge request
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct PurgeBody<'a> {
    objects: &'a [PurgeTarget],
}

/// A validated, non-empty purge request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeRequest {
    mode: PurgeMode,
    objects: Vec<PurgeTarget>,
}

impl PurgeRequest {
    /// Build a request; an empty object list is refused.
    pub fn new(mode: PurgeMode, objects: Vec<PurgeTarget>) -> Result<Self, DispatchError> {
        if objects.is_empty() {
            return Err(DispatchError::NoTargets);
        }
        Ok(Self { mode, objects })
    }

    pub fn mode(&self) -> PurgeMode {
        self.mode
    }

    pub fn objects(&self) -> &[PurgeTarget] {
        &self.objects
    }

    /// Serialize the JSON body: `{"objects": [...]}`.
    pub fn body(&self) -> Vec<u8> {
        // A struct of strings always serializes.
        serde_json::to_vec(&PurgeBody {
            objects: &self.objects,
        })
        .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Dispatch result
// ---------------------------------------------------------------------------

/// Terminal outcome of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchOutcome {
    Ok,
    Failed,
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Result of a purge submission or connection test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub outcome: DispatchOutcome,
    pub http_status: Option<u16>,
    pub message: String,
}

impl DispatchResult {
    pub fn ok(http_status: u16, message: impl Into<String>) -> Self {
        Self {
            outcome: DispatchOutcome::Ok,
            http_status: Some(http_status),
            message: message.into(),
        }
    }

    pub fn failed(http_status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            outcome: DispatchOutcome::Failed,
            http_status,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome == DispatchOutcome::Ok
    }
}

// ---------------------------------------------------------------------------
// Change events
// ---------------------------------------------------------------------------

/// The kind of content change reported by the content system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplicationAction {
    /// Connection test; no content involved.
    Test,
    Activate,
    Deactivate,
    Delete,
    /// Any other action type; acknowledged without a purge.
    #[serde(other)]
    Other,
}

impl ReplicationAction {
    /// Whether this action changes published content and needs a purge.
    pub fn requires_purge(&self) -> bool {
        matches!(self, Self::Activate | Self::Deactivate | Self::Delete)
    }
}

impl fmt::Display for ReplicationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Test => write!(f, "test"),
            Self::Activate => write!(f, "activate"),
            Self::Deactivate => write!(f, "deactivate"),
            Self::Delete => write!(f, "delete"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// An inbound content-change notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Repository path that changed.
    #[serde(default)]
    pub path: String,
    pub action: ReplicationAction,
    /// Enclosing page, when the content system already knows it.
    #[serde(default)]
    pub containing_page: Option<String>,
}

/// What the agent did with one change event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub action: ReplicationAction,
    pub path: String,
    pub targets: Vec<PurgeTarget>,
    /// `None` when nothing needed purging.
    pub result: Option<DispatchResult>,
}

impl DeliveryReport {
    /// True unless a dispatch happened and failed.
    pub fn is_ok(&self) -> bool {
        self.result.as_ref().map_or(true, DispatchResult::is_ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_route() {
        let mode = PurgeMode::default();
        assert_eq!(mode.path_suffix(), "/ccu/v3/remove/url/production");
    }

    #[test]
    fn test_mode_route_all_axes() {
        let mode = PurgeMode::new(PurgeAction::Invalidate, PurgeType::CpCode, Network::Staging);
        assert_eq!(mode.path_suffix(), "/ccu/v3/invalidate/cpcode/staging");
        assert_eq!(mode.to_string(), "invalidate/cpcode/staging");
    }

    #[test]
    fn test_parse_axes_case_insensitive() {
        assert_eq!("Invalidate".parse::<PurgeAction>().unwrap(), PurgeAction::Invalidate);
        assert_eq!("CPCODE".parse::<PurgeType>().unwrap(), PurgeType::CpCode);
        assert_eq!(" staging ".parse::<Network>().unwrap(), Network::Staging);
    }

    #[test]
    fn test_parse_axes_rejects_unknown() {
        let err = "arl".parse::<PurgeType>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "purge.type"));
        assert!("delete".parse::<PurgeAction>().is_err());
        assert!("qa".parse::<Network>().is_err());
    }

    #[test]
    fn test_purge_request_rejects_empty() {
        let result = PurgeRequest::new(PurgeMode::default(), Vec::new());
        assert!(matches!(result, Err(DispatchError::NoTargets)));
    }

    #[test]
    fn test_purge_request_body() {
        let request = PurgeRequest::new(
            PurgeMode::default(),
            vec!["https://www.mercer.com/us/about.html".into()],
        )
        .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&request.body()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "objects": ["https://www.mercer.com/us/about.html"] })
        );
    }

    #[test]
    fn test_purge_request_keeps_duplicates_and_order() {
        let request = PurgeRequest::new(
            PurgeMode::default(),
            vec!["b".into(), "a".into(), "b".into()],
        )
        .unwrap();
        let body = String::from_utf8(request.body()).unwrap();
        assert_eq!(body, r#"{"objects":["b","a","b"]}"#);
    }

    #[test]
    fn test_change_event_unknown_action() {
        let event: ChangeEvent =
            serde_json::from_str(r#"{"path":"/content/x","action":"reverse"}"#).unwrap();
        assert_eq!(event.action, ReplicationAction::Other);
        assert!(!event.action.requires_purge());
        assert!(event.containing_page.is_none());
    }

    #[test]
    fn test_delivery_report_without_dispatch_is_ok() {
        let report = DeliveryReport {
            action: ReplicationAction::Activate,
            path: "/content/other".into(),
            targets: Vec::new(),
            result: None,
        };
        assert!(report.is_ok());
    }

    #[test]
    fn test_mode_deserialize_defaults() {
        let mode: PurgeMode = toml::from_str("network = \"staging\"").unwrap();
        assert_eq!(mode.action, PurgeAction::Remove);
        assert_eq!(mode.kind, PurgeType::Url);
        assert_eq!(mode.network, Network::Staging);
    }
}
