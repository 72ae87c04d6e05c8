//! HTTP mail relay client.

use super::{Notifier, NotifyError};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Outgoing message as accepted by the relay.
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Notifier that hands emails to an HTTP mail relay.
///
/// Messages are POSTed as JSON to `{base_url}/v1/send`. Any non-2xx
/// response is treated as a failed delivery.
#[derive(Clone)]
pub struct MailRelayNotifier {
    client: Client,
    base_url: String,
    sender: String,
    api_token: Option<SecretString>,
}

impl MailRelayNotifier {
    /// Create a new relay client.
    pub fn new(
        base_url: impl Into<String>,
        sender: impl Into<String>,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            sender: sender.into(),
            api_token: api_token.map(SecretString::new),
        })
    }

    /// Check if the relay is reachable.
    pub async fn health_check(&self) -> bool {
        self.client
            .get(format!("{}/v1/health", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl Notifier for MailRelayNotifier {
    #[instrument(skip(self, address, body))]
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let url = format!("{}/v1/send", self.base_url);
        let request = SendRequest {
            from: &self.sender,
            to: address,
            subject,
            body,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(token) = &self.api_token {
            builder = builder.header("Authorization", format!("Bearer {}", token.expose_secret()));
        }

        debug!(url = %url, "Sending email via relay");

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Mail relay rejected message");

            return Err(NotifyError::Rejected(format!("{} - {}", status, body)));
        }

        debug!("Email accepted by relay");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_notifier(mock_server: &MockServer, token: Option<&str>) -> MailRelayNotifier {
        MailRelayNotifier::new(
            mock_server.uri(),
            "no-reply@registration.local",
            token.map(String::from),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_send_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/send"))
            .and(header("Authorization", "Bearer relay-token"))
            .and(body_json(serde_json::json!({
                "from": "no-reply@registration.local",
                "to": "jane@x.com",
                "subject": "Registration pincode",
                "body": "Finalize registration with pincode 123456"
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&mock_server)
            .await;

        let notifier = test_notifier(&mock_server, Some("relay-token"));
        let result = notifier
            .send(
                "jane@x.com",
                "Registration pincode",
                "Finalize registration with pincode 123456",
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_send_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/send"))
            .respond_with(ResponseTemplate::new(503).set_body_string("mailbox unavailable"))
            .mount(&mock_server)
            .await;

        let notifier = test_notifier(&mock_server, None);
        let result = notifier.send("nobody@x.com", "s", "b").await;

        match result {
            Err(NotifyError::Rejected(msg)) => assert!(msg.contains("mailbox unavailable")),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_unreachable() {
        let notifier = MailRelayNotifier::new(
            "http://127.0.0.1:1",
            "no-reply@registration.local",
            None,
            Duration::from_secs(1),
        )
        .unwrap();

        let result = notifier.send("jane@x.com", "s", "b").await;
        assert!(matches!(result, Err(NotifyError::Http(_))));
    }

    #[tokio::test]
    async fn test_health_check() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let notifier = test_notifier(&mock_server, None);
        assert!(notifier.health_check().await);
    }

    #[tokio::test]
    async fn test_send_keeps_address_and_pincode_out_of_logs() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/send"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&mock_server)
            .await;

        let notifier = test_notifier(&mock_server, None);
        let (logs, _guard) = crate::notify::tests::capture_logs();

        notifier
            .send(
                "jane@x.com",
                "Registration pincode",
                "Finalize registration with pincode 482913",
            )
            .await
            .unwrap();

        let out = logs.contents();
        assert!(out.contains("Email accepted by relay"));
        assert!(!out.contains("jane@x.com"));
        assert!(!out.contains("482913"));
    }
}
