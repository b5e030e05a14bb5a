use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;

/// Raw outcome of a webhook POST. Success is for the caller to judge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    pub status_code: u16,
    pub body: String,
}

#[derive(Serialize)]
struct SlackPayload<'a> {
    text: &'a str,
}

/// Slack incoming webhook.
pub struct SlackNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl SlackNotifier {
    pub fn new(webhook_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            client: builder.build()?,
            webhook_url: webhook_url.into(),
        })
    }

    /// POST `{"text": message}` as JSON. Only transport failures are errors.
    pub async fn notify(&self, message: &str) -> Result<DeliveryResult> {
        let resp = self
            .client
            .post(&self.webhook_url)
            .json(&SlackPayload { text: message })
            .send()
            .await?;
        let status_code = resp.status().as_u16();
        let body = resp.text().await?;
        debug!(status = status_code, "webhook responded");
        Ok(DeliveryResult { status_code, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use assert_matches::assert_matches;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_text_payload_as_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/hook"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({"text": "hello\nworld"})))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = SlackNotifier::new(format!("{}/services/hook", server.uri()), None).unwrap();
        let result = notifier.notify("hello\nworld").await.unwrap();
        assert_eq!(
            result,
            DeliveryResult {
                status_code: 200,
                body: "ok".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn non_200_is_returned_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("invalid_token"))
            .mount(&server)
            .await;

        let notifier = SlackNotifier::new(server.uri(), None).unwrap();
        let result = notifier.notify("hi").await.unwrap();
        assert_eq!(result.status_code, 403);
        assert_eq!(result.body, "invalid_token");
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        // Bind then release a port so nothing is listening on it.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let notifier =
            SlackNotifier::new(format!("http://127.0.0.1:{port}/hook"), Some(Duration::from_secs(2)))
                .unwrap();
        let err = notifier.notify("hi").await.unwrap_err();
        assert_matches!(err, Error::Transport(_));
    }

    #[tokio::test]
    async fn timeout_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let notifier = SlackNotifier::new(server.uri(), Some(Duration::from_millis(200))).unwrap();
        let err = notifier.notify("hi").await.unwrap_err();
        assert_matches!(err, Error::Transport(e) if e.is_timeout());
    }
}
