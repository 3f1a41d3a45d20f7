//! Outbound transport to Slack incoming webhooks.

use async_trait::async_trait;
use reqwest::header;
use url::Url;

use super::message::{CONTENT_TYPE, form_body};
use crate::config::SlackConfig;

/// Errors from a single delivery. Never escalated past the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("invalid endpoint for channel '{channel}': {source}")]
    InvalidEndpoint {
        channel: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Something that can post a message to a channel.
#[async_trait]
pub trait SlackTransport: Send + Sync {
    /// Post `text` to `channel`, returning the response body on success.
    async fn send(&self, channel: &str, text: &str) -> Result<String, DeliveryError>;
}

pub struct SlackClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl SlackClient {
    /// Build the HTTP client. A rustls crypto provider must already be installed.
    pub fn new(config: &SlackConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
        })
    }

    /// Resolve a channel against the base URL.
    ///
    /// A path such as `/services/T000/B000/XXXX` replaces the base path; a full
    /// URL is used as is.
    pub fn endpoint(&self, channel: &str) -> Result<Url, DeliveryError> {
        self.base_url.join(channel).map_err(|source| DeliveryError::InvalidEndpoint {
            channel: channel.to_string(),
            source,
        })
    }
}

#[async_trait]
impl SlackTransport for SlackClient {
    async fn send(&self, channel: &str, text: &str) -> Result<String, DeliveryError> {
        let url = self.endpoint(channel)?;
        let body = form_body(text)?;

        let response = self
            .http_client
            .post(url)
            .header(header::CONTENT_TYPE, CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(DeliveryError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_slack_client;
    use std::time::Duration;
    use wiremock::matchers::{body_string, header as header_matcher, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: &str) -> SlackClient {
        create_test_slack_client(&SlackConfig {
            base_url: base_url.parse().unwrap(),
            timeout: Duration::from_secs(5),
            max_concurrent_sends: 4,
        })
    }

    #[test]
    fn test_endpoint_resolution() {
        let client = client("https://hooks.slack.com");
        assert_eq!(
            client.endpoint("/services/T000/B000/XXXX").unwrap().as_str(),
            "https://hooks.slack.com/services/T000/B000/XXXX"
        );
        assert_eq!(
            client.endpoint("https://other.example.com/hook").unwrap().as_str(),
            "https://other.example.com/hook"
        );
        assert!(matches!(
            client.endpoint("http://[not-an-ip"),
            Err(DeliveryError::InvalidEndpoint { .. })
        ));
    }

    #[tokio::test]
    async fn test_send_uses_form_wire_format() {
        let mock_server = MockServer::start().await;
        let text = "*[repo] tit*\nurl\n> desc\nhi <@U1>";
        Mock::given(method("POST"))
            .and(path("/services/T000/B000/XXXX"))
            .and(header_matcher("content-type", CONTENT_TYPE))
            .and(body_string(form_body(text).unwrap()))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let response = client(&mock_server.uri()).send("/services/T000/B000/XXXX", text).await.unwrap();
        assert_eq!(response, "ok");
    }

    #[tokio::test]
    async fn test_send_http_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no_service"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let err = client(&mock_server.uri()).send("/services/gone", "text").await.unwrap_err();
        assert!(matches!(err, DeliveryError::Status { status: 404, ref body } if body == "no_service"));
    }

    #[tokio::test]
    async fn test_send_network_error() {
        // Point to a port that's not listening
        let err = client("http://127.0.0.1:1").send("/services/x", "text").await.unwrap_err();
        assert!(matches!(err, DeliveryError::Transport(_)));
    }
}
