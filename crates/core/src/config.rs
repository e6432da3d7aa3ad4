//! TOML-based configuration system for EdgeFlush.
//!
//! All sensitive values (API tokens, client secret, transport password,
//! webhook URLs) are stored as `_env` fields that reference environment
//! variable names. The actual secrets are resolved at runtime via
//! [`AppConfig::resolve_env_vars`] and are never serialized back out.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::edgegrid::{Credential, SigningConfig, DEFAULT_MAX_BODY};
use crate::errors::ConfigError;
use crate::mapping::MapperConfig;
use crate::models::{MappingEntry, Network, PurgeAction, PurgeMode, PurgeTarget, PurgeType};
use crate::purge::DispatcherConfig;

/// Reserved transport-URI scheme that routes an agent to this dispatcher.
pub const TRANSPORT_SCHEME: &str = "akamai://";

/// Object purged by the connection test.
pub const DEFAULT_TEST_OBJECT: &str = "https://www.mercer.com/contact.html";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Daemon / logging settings.
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// EdgeGrid API client credentials.
    pub edgegrid: EdgeGridConfig,

    /// Purge endpoint, mode and transport settings.
    #[serde(default)]
    pub purge: PurgeConfig,

    /// Path-to-URL mapping settings.
    #[serde(default)]
    pub mapping: MappingConfig,

    /// Failure alert channels (Slack, email).
    #[serde(default)]
    pub notifications: NotificationConfig,
}

// ---------------------------------------------------------------------------
// Daemon
// ---------------------------------------------------------------------------

/// Daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Listen address for the change-event API (default `127.0.0.1:8085`).
    #[serde(default = "default_listen")]
    pub listen: String,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_listen() -> String {
    "127.0.0.1:8085".into()
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            listen: default_listen(),
        }
    }
}

// ---------------------------------------------------------------------------
// EdgeGrid
// ---------------------------------------------------------------------------

/// EdgeGrid API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeGridConfig {
    /// API host, e.g. `akab-xxxx.purge.akamaiapis.net` (scheme optional).
    pub host: String,

    /// Environment variable holding the access token.
    #[serde(default = "default_access_token_env")]
    pub access_token_env: String,

    /// Environment variable holding the client token.
    #[serde(default = "default_client_token_env")]
    pub client_token_env: String,

    /// Environment variable holding the client secret.
    #[serde(default = "default_client_secret_env")]
    pub client_secret_env: String,

    /// Maximum number of body bytes covered by the content hash.
    #[serde(default = "default_max_body")]
    pub max_body: usize,

    /// Extra request headers included in the signature.
    #[serde(default)]
    pub headers_to_sign: Vec<String>,

    #[serde(skip)]
    pub access_token: Option<String>,

    #[serde(skip)]
    pub client_token: Option<String>,

    #[serde(skip)]
    pub client_secret: Option<String>,
}

fn default_access_token_env() -> String {
    "EDGEGRID_ACCESS_TOKEN".into()
}
fn default_client_token_env() -> String {
    "EDGEGRID_CLIENT_TOKEN".into()
}
fn default_client_secret_env() -> String {
    "EDGEGRID_CLIENT_SECRET".into()
}
fn default_max_body() -> usize {
    DEFAULT_MAX_BODY
}

// ---------------------------------------------------------------------------
// Purge
// ---------------------------------------------------------------------------

/// Purge endpoint, mode and transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeConfig {
    /// Optional agent transport URI (`akamai://host`). Overrides the API
    /// host; the CCU path is still appended.
    #[serde(default)]
    pub transport_uri: Option<String>,

    /// Transport basic-auth user.
    #[serde(default)]
    pub transport_user: Option<String>,

    /// Environment variable holding the transport basic-auth password.
    #[serde(default)]
    pub transport_password_env: Option<String>,

    /// `remove` (default) or `invalidate`.
    #[serde(default)]
    pub action: PurgeAction,

    /// `url` (default) or `cpcode`.
    #[serde(default, rename = "type")]
    pub kind: PurgeType,

    /// `production` (default) or `staging`.
    #[serde(default)]
    pub network: Network,

    /// CP codes purged when `type = "cpcode"`.
    #[serde(default)]
    pub cp_codes: Vec<String>,

    /// Request timeout in seconds (default 15).
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// URL purged on staging by the connection test.
    #[serde(default = "default_test_object")]
    pub test_object: String,

    /// Header that carries the EdgeGrid signature (default `Authorization`).
    #[serde(default = "default_signature_header")]
    pub signature_header: String,

    /// Resolved transport password.
    #[serde(skip)]
    pub transport_password: Option<String>,
}

fn default_timeout() -> u64 {
    15
}
fn default_test_object() -> String {
    DEFAULT_TEST_OBJECT.into()
}
fn default_signature_header() -> String {
    "Authorization".into()
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            transport_uri: None,
            transport_user: None,
            transport_password_env: None,
            action: PurgeAction::default(),
            kind: PurgeType::default(),
            network: Network::default(),
            cp_codes: Vec::new(),
            request_timeout_secs: default_timeout(),
            test_object: default_test_object(),
            signature_header: default_signature_header(),
            transport_password: None,
        }
    }
}

impl PurgeConfig {
    /// The configured purge mode.
    pub fn mode(&self) -> PurgeMode {
        PurgeMode::new(self.action, self.kind, self.network)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Path mapping configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Paths outside this root are never purged.
    #[serde(default = "default_content_root")]
    pub content_root: String,

    /// Substring a path must contain to be considered.
    #[serde(default = "default_tenant_marker")]
    pub tenant_marker: String,

    /// Paths containing this marker flush the bare site target.
    #[serde(default = "default_site_flush_marker")]
    pub site_flush_marker: String,

    /// Optional TOML mapping file; takes precedence over inline entries.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Inline mapping entries.
    #[serde(default)]
    pub entries: Vec<MappingEntry>,
}

fn default_content_root() -> String {
    "/content".into()
}
fn default_tenant_marker() -> String {
    "mercer".into()
}
fn default_site_flush_marker() -> String {
    "flush-site-cache".into()
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            content_root: default_content_root(),
            tenant_marker: default_tenant_marker(),
            site_flush_marker: default_site_flush_marker(),
            file: None,
            entries: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Notification channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Environment variable holding the Slack incoming-webhook URL.
    #[serde(default)]
    pub slack_webhook_url_env: Option<String>,

    /// SMTP server address for email notifications (e.g. `smtp.example.com:587`).
    #[serde(default)]
    pub email_smtp: Option<String>,

    /// SMTP user, when the relay requires authentication.
    #[serde(default)]
    pub email_username: Option<String>,

    /// Environment variable holding the SMTP password.
    #[serde(default)]
    pub email_password_env: Option<String>,

    /// Sender email address.
    #[serde(default)]
    pub email_from: Option<String>,

    /// Recipient email addresses.
    #[serde(default)]
    pub email_recipients: Vec<String>,

    /// Upper bound in seconds on delivering one failure alert (default 10).
    #[serde(default = "default_alert_timeout")]
    pub alert_timeout_secs: u64,

    /// Resolved Slack webhook URL.
    #[serde(skip)]
    pub slack_webhook_url: Option<String>,

    /// Resolved SMTP password.
    #[serde(skip)]
    pub email_password: Option<String>,
}

fn default_alert_timeout() -> u64 {
    10
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            slack_webhook_url_env: None,
            email_smtp: None,
            email_username: None,
            email_password_env: None,
            email_from: None,
            email_recipients: Vec::new(),
            alert_timeout_secs: default_alert_timeout(),
            slack_webhook_url: None,
            email_password: None,
        }
    }
}

impl NotificationConfig {
    pub fn alert_timeout(&self) -> Duration {
        Duration::from_secs(self.alert_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Resolve all `*_env` fields from environment variables and populate the
    /// corresponding resolved fields.
    ///
    /// Missing variables log a warning but do **not** fail here; the
    /// credential is checked when [`credential`](Self::credential) is built.
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        info!("resolving environment variable references in config");

        self.edgegrid.access_token =
            resolve_optional_env(&self.edgegrid.access_token_env, "edgegrid.access_token_env");
        self.edgegrid.client_token =
            resolve_optional_env(&self.edgegrid.client_token_env, "edgegrid.client_token_env");
        self.edgegrid.client_secret =
            resolve_optional_env(&self.edgegrid.client_secret_env, "edgegrid.client_secret_env");

        if let Some(ref env_name) = self.purge.transport_password_env {
            self.purge.transport_password =
                resolve_optional_env(env_name, "purge.transport_password_env");
        }

        if let Some(ref env_name) = self.notifications.slack_webhook_url_env {
            self.notifications.slack_webhook_url =
                resolve_optional_env(env_name, "notifications.slack_webhook_url_env");
        }

        if let Some(ref env_name) = self.notifications.email_password_env {
            self.notifications.email_password =
                resolve_optional_env(env_name, "notifications.email_password_env");
        }

        debug!("environment variable resolution complete");
        Ok(())
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.edgegrid.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "edgegrid.host".into(),
                detail: "API host must not be empty".into(),
            });
        }
        if !(1..=300).contains(&self.purge.request_timeout_secs) {
            return Err(ConfigError::InvalidValue {
                field: "purge.request_timeout_secs".into(),
                detail: "timeout must be between 1 and 300 seconds".into(),
            });
        }
        if !(1..=300).contains(&self.notifications.alert_timeout_secs) {
            return Err(ConfigError::InvalidValue {
                field: "notifications.alert_timeout_secs".into(),
                detail: "alert timeout must be between 1 and 300 seconds".into(),
            });
        }
        if self.purge.kind == PurgeType::CpCode && self.purge.cp_codes.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "purge.cp_codes".into(),
                detail: "at least one CP code is required when type = \"cpcode\"".into(),
            });
        }
        if let Some(ref uri) = self.purge.transport_uri {
            let lower = uri.to_ascii_lowercase();
            if !uri.is_empty() && !lower.starts_with(TRANSPORT_SCHEME) && !lower.starts_with("https://")
            {
                return Err(ConfigError::InvalidValue {
                    field: "purge.transport_uri".into(),
                    detail: format!("'{}' must start with {} or https://", uri, TRANSPORT_SCHEME),
                });
            }
        }
        if self.purge.transport_user.is_some() && self.purge.transport_password_env.is_none() {
            return Err(ConfigError::InvalidValue {
                field: "purge.transport_password_env".into(),
                detail: "a password variable is required when transport_user is set".into(),
            });
        }
        if self.purge.test_object.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "purge.test_object".into(),
                detail: "test object must not be empty".into(),
            });
        }
        if !self.mapping.content_root.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "mapping.content_root".into(),
                detail: "content root must be an absolute repository path".into(),
            });
        }
        if let Some(entry) = self.mapping.entries.iter().find(|e| e.prefix.is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "mapping.entries".into(),
                detail: format!("entry for target '{}' has an empty prefix", entry.target),
            });
        }

        Ok(())
    }

    /// Convenience: load, resolve, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.resolve_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the EdgeGrid credential from the resolved secrets.
    pub fn credential(&self) -> Result<Credential, ConfigError> {
        let eg = &self.edgegrid;
        let access_token = require(&eg.access_token, &eg.access_token_env, "edgegrid.access_token_env")?;
        let client_token = require(&eg.client_token, &eg.client_token_env, "edgegrid.client_token_env")?;
        let client_secret =
            require(&eg.client_secret, &eg.client_secret_env, "edgegrid.client_secret_env")?;
        Ok(Credential::new(access_token, client_token, client_secret, eg.host.clone()))
    }

    /// Dispatcher settings derived from the `[purge]` and `[edgegrid]` sections.
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            host: self.edgegrid.host.clone(),
            transport_uri: self.purge.transport_uri.clone(),
            transport_user: self.purge.transport_user.clone(),
            transport_password: self.purge.transport_password.clone(),
            cp_codes: self
                .purge
                .cp_codes
                .iter()
                .map(|c| PurgeTarget::new(c.as_str()))
                .collect(),
            test_object: self.purge.test_object.clone(),
            test_action: self.purge.action,
            signature_header: self.purge.signature_header.clone(),
            alert_timeout: self.notifications.alert_timeout(),
            signing: SigningConfig {
                max_body: self.edgegrid.max_body,
                headers_to_sign: self.edgegrid.headers_to_sign.clone(),
            },
        }
    }

    /// Path mapper settings derived from the `[mapping]` section.
    pub fn mapper_config(&self) -> MapperConfig {
        MapperConfig {
            content_root: self.mapping.content_root.clone(),
            tenant_marker: self.mapping.tenant_marker.clone(),
            site_flush_marker: self.mapping.site_flush_marker.clone(),
        }
    }
}

fn require(value: &Option<String>, env_name: &str, field: &str) -> Result<String, ConfigError> {
    value.clone().ok_or_else(|| ConfigError::EnvVarMissing {
        var: env_name.to_string(),
        field: field.to_string(),
    })
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_toml() -> &'static str {
        r#"
[daemon]
log_level = "debug"
listen = "0.0.0.0:9000"

[edgegrid]
host = "akab-example.purge.akamaiapis.net"
access_token_env = "EF_ACCESS"
client_token_env = "EF_CLIENT"
client_secret_env = "EF_SECRET"
headers_to_sign = ["X-Purge-Source"]

[purge]
transport_uri = "akamai://akab-override.purge.akamaiapis.net"
transport_user = "replication"
transport_password_env = "EF_TRANSPORT_PW"
action = "invalidate"
type = "url"
network = "staging"
request_timeout_secs = 20

[mapping]
content_root = "/content"
tenant_marker = "mercer"

[[mapping.entries]]
prefix = "/content/mercer/us"
target = "https://www.mercer.com/us"

[[mapping.entries]]
prefix = "/content/mercer/ca"
target = "https://www.mercer.ca"

[notifications]
slack_webhook_url_env = "EF_SLACK"
email_smtp = "smtp.example.com:587"
email_from = "noreply@example.com"
email_recipients = ["sitesupport@example.com"]
"#
    }

    #[test]
    fn test_parse_full_config() {
        let config: AppConfig = toml::from_str(sample_toml()).expect("failed to parse toml");
        assert_eq!(config.daemon.listen, "0.0.0.0:9000");
        assert_eq!(config.edgegrid.host, "akab-example.purge.akamaiapis.net");
        assert_eq!(config.purge.action, PurgeAction::Invalidate);
        assert_eq!(config.purge.network, Network::Staging);
        assert_eq!(config.purge.mode().path_suffix(), "/ccu/v3/invalidate/url/staging");
        assert_eq!(config.mapping.entries.len(), 2);
        assert_eq!(config.mapping.entries[1].target, "https://www.mercer.ca");
        assert_eq!(config.notifications.email_recipients, vec!["sitesupport@example.com"]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edgeflush.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(sample_toml().as_bytes()).unwrap();

        let config = AppConfig::load_from_file(&path).expect("load_from_file failed");
        assert_eq!(config.daemon.log_level, "debug");
    }

    #[test]
    fn test_file_not_found() {
        let result = AppConfig::load_from_file("/nonexistent/edgeflush.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_rejects_unknown_purge_type() {
        let toml_str = r#"
[edgegrid]
host = "h"
[purge]
type = "arl"
"#;
        let result: Result<AppConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_empty_host() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.edgegrid.host = "  ".into();
        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "edgegrid.host"
        ));
    }

    #[test]
    fn test_validate_requires_cp_codes_for_cpcode_mode() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.purge.kind = PurgeType::CpCode;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "purge.cp_codes"
        ));

        config.purge.cp_codes = vec!["12345".into()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_timeout_out_of_range() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.purge.request_timeout_secs = 0;
        assert!(config.validate().is_err());
        config.purge.request_timeout_secs = 301;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_foreign_transport_scheme() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.purge.transport_uri = Some("ftp://example.com".into());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "purge.transport_uri"
        ));
    }

    #[test]
    fn test_validate_rejects_empty_prefix() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.mapping.entries.push(MappingEntry::new("", "https://all.example.com"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolve_env_vars_and_credential() {
        std::env::set_var("EF_TEST_ACCESS", "akab-access");
        std::env::set_var("EF_TEST_CLIENT", "akab-client");
        std::env::set_var("EF_TEST_SECRET", "c2VjcmV0");

        let toml_str = r#"
[edgegrid]
host = "akab-example.purge.akamaiapis.net"
access_token_env = "EF_TEST_ACCESS"
client_token_env = "EF_TEST_CLIENT"
client_secret_env = "EF_TEST_SECRET"
"#;
        let mut config: AppConfig = toml::from_str(toml_str).unwrap();
        config.resolve_env_vars().unwrap();

        let credential = config.credential().unwrap();
        assert_eq!(credential.access_token(), "akab-access");
        assert_eq!(credential.host(), "akab-example.purge.akamaiapis.net");

        std::env::remove_var("EF_TEST_ACCESS");
        std::env::remove_var("EF_TEST_CLIENT");
        std::env::remove_var("EF_TEST_SECRET");
    }

    #[test]
    fn test_credential_requires_secret() {
        let toml_str = r#"
[edgegrid]
host = "h"
client_secret_env = "EF_TEST_SECRET_NEVER_SET"
"#;
        let mut config: AppConfig = toml::from_str(toml_str).unwrap();
        config.resolve_env_vars().unwrap();
        let result = config.credential();
        assert!(matches!(result, Err(ConfigError::EnvVarMissing { .. })));
    }

    #[test]
    fn test_defaults() {
        let minimal = r#"
[edgegrid]
host = "akab-example.purge.akamaiapis.net"
"#;
        let config: AppConfig = toml::from_str(minimal).unwrap();
        assert_eq!(config.daemon.log_level, "info");
        assert_eq!(config.daemon.listen, "127.0.0.1:8085");
        assert_eq!(config.purge.mode(), PurgeMode::default());
        assert_eq!(config.purge.request_timeout_secs, 15);
        assert_eq!(config.purge.test_object, DEFAULT_TEST_OBJECT);
        assert_eq!(config.purge.signature_header, "Authorization");
        assert_eq!(config.mapping.content_root, "/content");
        assert_eq!(config.mapping.site_flush_marker, "flush-site-cache");
        assert_eq!(config.edgegrid.max_body, DEFAULT_MAX_BODY);
        assert_eq!(config.notifications.alert_timeout_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_alert_timeout_reaches_dispatcher() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.notifications.alert_timeout_secs = 3;
        assert!(config.validate().is_ok());
        assert_eq!(config.dispatcher_config().alert_timeout, Duration::from_secs(3));

        config.notifications.alert_timeout_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "notifications.alert_timeout_secs"
        ));
    }

    #[test]
    fn test_dispatcher_config_carries_cp_codes() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.purge.cp_codes = vec!["111".into(), "222".into()];
        let dispatcher = config.dispatcher_config();
        assert_eq!(dispatcher.cp_codes, vec![PurgeTarget::new("111"), PurgeTarget::new("222")]);
        assert_eq!(dispatcher.signing.headers_to_sign, vec!["X-Purge-Source"]);
    }
}
