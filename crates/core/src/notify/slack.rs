//! Slack incoming-webhook alert sender.

use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::errors::NotificationError;
use crate::models::PurgeTarget;

/// Slack caps a section text block at 3000 characters.
const MAX_SECTION_LEN: usize = 2900;

/// Slack incoming-webhook notifier.
pub struct SlackNotifier {
    webhook_url: String,
    http: reqwest::Client,
}

impl SlackNotifier {
    /// Create a notifier whose webhook calls give up after `timeout`.
    pub fn new(webhook_url: String, timeout: Duration) -> Result<Self, NotificationError> {
        info!(timeout_secs = timeout.as_secs(), "initializing Slack notifier");
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(NotificationError::HttpError)?;
        Ok(Self { webhook_url, http })
    }

    /// Post a purge-failure alert.
    pub async fn send_alert(
        &self,
        reason: &str,
        failed_targets: &[PurgeTarget],
    ) -> Result<(), NotificationError> {
        debug!(targets = failed_targets.len(), "sending Slack purge alert");
        self.post(&alert_payload(reason, failed_targets)).await
    }

    async fn post(&self, payload: &Value) -> Result<(), NotificationError> {
        let resp = self
            .http
            .post(&self.webhook_url)
            .json(payload)
            .send()
            .await
            .map_err(NotificationError::HttpError)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Slack webhook returned error");
            return Err(NotificationError::SlackError(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        info!("Slack alert sent");
        Ok(())
    }
}

/// Build the block-kit payload for a purge failure.
fn alert_payload(reason: &str, failed_targets: &[PurgeTarget]) -> Value {
    let mut listing = String::new();
    for target in failed_targets {
        let line = format!("\u{2022} `{}`\n", target);
        if listing.len() + line.len() > MAX_SECTION_LEN {
            listing.push_str("\u{2026}\n");
            break;
        }
        listing.push_str(&line);
    }
    if listing.is_empty() {
        listing.push_str("_no targets_");
    }

    json!({
        "text": format!(":rotating_light: CDN purge request failed: {}", reason),
        "unfurl_links": false,
        "unfurl_media": false,
        "blocks": [
            {
                "type": "section",
                "text": { "type": "mrkdwn", "text": format!("*CDN purge request failed*\n{}", reason) }
            },
            {
                "type": "section",
                "text": { "type": "mrkdwn", "text": listing }
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slack_notifier_construction() {
        let notifier =
            SlackNotifier::new("https://hooks.slack.com/test".into(), Duration::from_secs(10))
                .unwrap();
        assert_eq!(notifier.webhook_url, "https://hooks.slack.com/test");
    }

    #[tokio::test]
    async fn test_silent_webhook_times_out() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let notifier =
            SlackNotifier::new(format!("http://{}/hook", addr), Duration::from_millis(200))
                .unwrap();
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            notifier.send_alert("HTTP 500", &["https://www.mercer.com/us".into()]),
        )
        .await
        .expect("webhook call must be bounded by the client timeout");
        assert!(matches!(result, Err(NotificationError::HttpError(_))));
    }

    #[test]
    fn test_alert_payload_lists_targets() {
        let payload = alert_payload(
            "purge API returned HTTP 403",
            &["https://www.mercer.com/us/about.html".into()],
        );
        assert!(payload["text"].as_str().unwrap().contains("HTTP 403"));
        let listing = payload["blocks"][1]["text"]["text"].as_str().unwrap();
        assert!(listing.contains("https://www.mercer.com/us/about.html"));
    }

    #[test]
    fn test_alert_payload_truncates_long_listing() {
        let targets: Vec<PurgeTarget> = (0..500)
            .map(|i| PurgeTarget::new(format!("https://www.mercer.com/us/page-{}.html", i)))
            .collect();
        let payload = alert_payload("boom", &targets);
        let listing = payload["blocks"][1]["text"]["text"].as_str().unwrap();
        assert!(listing.len() <= MAX_SECTION_LEN + 8);
        assert!(listing.ends_with("\u{2026}\n"));
    }

    #[test]
    fn test_alert_payload_without_targets() {
        let payload = alert_payload("connection test failed", &[]);
        assert_eq!(payload["blocks"][1]["text"]["text"], "_no targets_");
    }
}
