//! Email alert sender via SMTP.
//!
//! Uses the `lettre` crate to send one HTML message addressed to every
//! configured recipient.

use std::time::Duration;

use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info, warn};

use crate::errors::NotificationError;

const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// SMTP email notifier.
pub struct EmailNotifier {
    smtp_addr: String,
    from: String,
    recipients: Vec<String>,
    credentials: Option<(String, String)>,
    timeout: Duration,
}

impl EmailNotifier {
    /// Create a new email notifier.
    ///
    /// `smtp_addr` should be `host:port` (e.g. `smtp.example.com:587`).
    pub fn new(smtp_addr: String, from: String, recipients: Vec<String>) -> Self {
        info!(
            smtp = %smtp_addr,
            from = %from,
            recipients = ?recipients,
            "initializing email notifier"
        );
        Self {
            smtp_addr,
            from,
            recipients,
            credentials: None,
            timeout: DEFAULT_SMTP_TIMEOUT,
        }
    }

    /// Authenticate against the relay with the given user and password.
    pub fn with_credentials(mut self, username: String, password: String) -> Self {
        self.credentials = Some((username, password));
        self
    }

    /// Bound each SMTP exchange by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the message without sending it.
    fn build_message(&self, subject: &str, html_body: &str) -> Result<Message, NotificationError> {
        let from_mailbox: Mailbox = self
            .from
            .parse()
            .map_err(|e| NotificationError::EmailError(format!("invalid from address: {}", e)))?;

        let mut builder = Message::builder().from(from_mailbox).subject(subject);
        let mut valid = 0usize;
        for recipient in &self.recipients {
            match recipient.parse::<Mailbox>() {
                Ok(mailbox) => {
                    builder = builder.to(mailbox);
                    valid += 1;
                }
                // The remaining recipients still get the alert.
                Err(e) => warn!(recipient = %recipient, error = %e, "skipping invalid recipient"),
            }
        }
        if valid == 0 {
            return Err(NotificationError::EmailError(
                "no valid recipient addresses".into(),
            ));
        }

        builder
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| NotificationError::EmailError(format!("failed to build email: {}", e)))
    }

    /// Send an HTML email to all configured recipients.
    pub async fn send(&self, subject: &str, html_body: &str) -> Result<(), NotificationError> {
        debug!(subject, to = ?self.recipients, "sending email");

        let email = self.build_message(subject, html_body)?;
        let transport = self.build_transport()?;

        match transport.send(email).await {
            Ok(_) => {
                info!(to = ?self.recipients, "email sent successfully");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to send email");
                Err(NotificationError::EmailError(format!("SMTP send failed: {}", e)))
            }
        }
    }

    /// Split `host:port`, defaulting to the submission port.
    fn host_and_port(&self) -> (&str, u16) {
        match self.smtp_addr.rsplit_once(':') {
            Some((host, port)) => (host, port.parse().unwrap_or(DEFAULT_SMTP_PORT)),
            None => (self.smtp_addr.as_str(), DEFAULT_SMTP_PORT),
        }
    }

    /// Build an async STARTTLS transport, with credentials when configured.
    fn build_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotificationError> {
        let (host, port) = self.host_and_port();

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| NotificationError::EmailError(format!("SMTP connection error: {}", e)))?
            .port(port)
            .timeout(Some(self.timeout));

        if let Some((ref user, ref password)) = self.credentials {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier(recipients: Vec<String>) -> EmailNotifier {
        EmailNotifier::new(
            "smtp.example.com:2525".into(),
            "noreply@example.com".into(),
            recipients,
        )
    }

    #[test]
    fn test_email_notifier_construction() {
        let n = notifier(vec!["sitesupport@example.com".into()]);
        assert_eq!(n.from, "noreply@example.com");
        assert_eq!(n.recipients.len(), 1);
        assert!(n.credentials.is_none());
        assert_eq!(n.timeout, DEFAULT_SMTP_TIMEOUT);
        assert_eq!(n.with_timeout(Duration::from_secs(3)).timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_host_and_port() {
        assert_eq!(notifier(vec![]).host_and_port(), ("smtp.example.com", 2525));

        let n = EmailNotifier::new("mail.local".into(), "a@b.c".into(), vec![]);
        assert_eq!(n.host_and_port(), ("mail.local", DEFAULT_SMTP_PORT));
    }

    #[test]
    fn test_build_message_skips_bad_recipient() {
        let n = notifier(vec!["not an address".into(), "ops@example.com".into()]);
        let message = n.build_message("subject", "<p>body</p>").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("ops@example.com"));
        assert!(!raw.contains("not an address"));
    }

    #[test]
    fn test_build_message_requires_a_recipient() {
        let n = notifier(vec!["still not an address".into()]);
        assert!(matches!(
            n.build_message("subject", "body"),
            Err(NotificationError::EmailError(_))
        ));
    }
}
