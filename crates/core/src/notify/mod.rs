//! Alerting for purge requests that could not be confirmed.
//!
//! The dispatcher talks to an [`AlertSink`]. [`Notifier`] fans an alert
//! out to Slack and SMTP email; [`LogAlertSink`] is used when no channel is
//! configured. Alert delivery is best effort: the dispatcher logs sink
//! errors and keeps its own result.

pub mod email;
pub mod slack;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::config::NotificationConfig;
use crate::errors::NotificationError;
use crate::models::PurgeTarget;

/// Receives purge-failure alerts.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Report that `failed_targets` could not be purged because of `reason`.
    async fn notify(
        &self,
        reason: &str,
        failed_targets: &[PurgeTarget],
    ) -> Result<(), NotificationError>;
}

/// Writes alerts to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn notify(
        &self,
        reason: &str,
        failed_targets: &[PurgeTarget],
    ) -> Result<(), NotificationError> {
        error!(
            reason,
            targets = ?failed_targets,
            "CDN purge failed and no alert channel is configured"
        );
        Ok(())
    }
}

/// Unified notifier that dispatches to all configured channels.
pub struct Notifier {
    slack: Option<slack::SlackNotifier>,
    email: Option<email::EmailNotifier>,
}

impl Notifier {
    /// Create a new notifier from the notification configuration.
    pub fn new(config: &NotificationConfig) -> Self {
        let timeout = config.alert_timeout();

        let slack = config.slack_webhook_url.as_ref().and_then(|url| {
            match slack::SlackNotifier::new(url.clone(), timeout) {
                Ok(notifier) => {
                    info!("Slack alerts enabled");
                    Some(notifier)
                }
                Err(e) => {
                    warn!(error = %e, "could not build Slack client; Slack alerts disabled");
                    None
                }
            }
        });

        let email = match (&config.email_smtp, &config.email_from) {
            (Some(smtp), Some(from)) if !config.email_recipients.is_empty() => {
                info!("email alerts enabled");
                let notifier = email::EmailNotifier::new(
                    smtp.clone(),
                    from.clone(),
                    config.email_recipients.clone(),
                )
                .with_timeout(timeout);
                match (&config.email_username, &config.email_password) {
                    (Some(user), Some(password)) => {
                        Some(notifier.with_credentials(user.clone(), password.clone()))
                    }
                    (Some(_), None) => {
                        warn!("email_username set but no SMTP password resolved; sending unauthenticated");
                        Some(notifier)
                    }
                    _ => Some(notifier),
                }
            }
            _ => None,
        };

        Self { slack, email }
    }

    /// Return whether any notification channel is configured.
    pub fn is_configured(&self) -> bool {
        self.slack.is_some() || self.email.is_some()
    }
}

#[async_trait]
impl AlertSink for Notifier {
    async fn notify(
        &self,
        reason: &str,
        failed_targets: &[PurgeTarget],
    ) -> Result<(), NotificationError> {
        info!(targets = failed_targets.len(), "sending purge failure alert");

        let mut errors = Vec::new();

        if let Some(ref slack) = self.slack {
            if let Err(e) = slack.send_alert(reason, failed_targets).await {
                warn!(error = %e, "Slack alert failed");
                errors.push(format!("Slack: {}", e));
            }
        }

        if let Some(ref email) = self.email {
            let body = format_failure_email_html(reason, failed_targets);
            if let Err(e) = email.send(EMAIL_SUBJECT, &body).await {
                warn!(error = %e, "email alert failed");
                errors.push(format!("Email: {}", e));
            }
        }

        let total_channels = self.slack.is_some() as usize + self.email.is_some() as usize;
        if total_channels > 0 && errors.len() >= total_channels {
            return Err(NotificationError::AllChannelsFailed(errors.join("; ")));
        }

        Ok(())
    }
}

const EMAIL_SUBJECT: &str = "[EdgeFlush] CDN purge request failed";

/// Format a purge failure as an HTML email.
fn format_failure_email_html(reason: &str, failed_targets: &[PurgeTarget]) -> String {
    let mut html = format!(
        "<html><body>\
        <h2 style=\"color: red;\">CDN purge request failed</h2>\
        <p><strong>Reason:</strong> {}</p>",
        html_escape(reason),
    );

    if failed_targets.is_empty() {
        html.push_str("<p>No purge targets were attached to this request.</p>");
    } else {
        html.push_str("<p>The following objects were not purged:</p><ul>");
        for target in failed_targets {
            html.push_str(&format!("<li><code>{}</code></li>", html_escape(target.as_str())));
        }
        html.push_str("</ul>");
    }

    html.push_str(
        "<p>Verify the purge API credentials and host in the EdgeFlush configuration, \
         then re-publish the affected content or purge it manually.</p>",
    );
    html.push_str("</body></html>");
    html
}

/// Minimal HTML escaping for user-provided strings.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
