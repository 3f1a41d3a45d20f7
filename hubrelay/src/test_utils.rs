//! Shared fixtures for unit and HTTP tests.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue};
use axum_test::TestServer;
use serde_json::{Value, json};

use crate::config::{Account, Config, Directory, DirectorySource, SlackConfig};
use crate::github::signature::{DELIVERY_HEADER, EVENT_HEADER, SIGNATURE_HEADER, sign_body};
use crate::slack::SlackClient;

pub const TEST_SECRET: &str = "test-webhook-secret";

/// reqwest is built without a bundled TLS provider; tests share one process,
/// so the first caller installs it and later calls find it in place.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

pub fn create_test_slack_client(config: &SlackConfig) -> SlackClient {
    install_crypto_provider();
    SlackClient::new(config).expect("Failed to create Slack client")
}

pub fn create_test_directory() -> Directory {
    Directory {
        secret: TEST_SECRET.to_string(),
        accounts: HashMap::from([
            (
                "@octocat".to_string(),
                Account {
                    id: "@U024BE7LH".to_string(),
                    channel: "/services/T000/B000/octocat".to_string(),
                },
            ),
            (
                "@hubot".to_string(),
                Account {
                    id: "@U0G9QF9C6".to_string(),
                    channel: "/services/T000/B000/hubot".to_string(),
                },
            ),
        ]),
    }
}

pub fn create_test_config(slack_base_url: &str) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        slack: SlackConfig {
            base_url: slack_base_url.parse().expect("test Slack URL is valid"),
            timeout: std::time::Duration::from_secs(5),
            max_concurrent_sends: 4,
        },
        ..Default::default()
    }
}

/// Test server whose directory is fixed and whose Slack calls go to `slack_base_url`.
pub async fn create_test_app(slack_base_url: &str) -> TestServer {
    create_test_server(
        create_test_config(slack_base_url),
        DirectorySource::Static(Arc::new(create_test_directory())),
    )
}

pub fn create_test_server(config: Config, directory: DirectorySource) -> TestServer {
    install_crypto_provider();
    crate::Application::new_with_directory(config, directory)
        .expect("Failed to create application")
        .into_test_server()
}

/// Headers GitHub would send for `body`, signed with `secret`.
pub fn signed_headers(secret: &str, event: &str, body: &[u8]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let signature = sign_body(secret.as_bytes(), body).expect("HMAC accepts any key length");
    headers.insert(SIGNATURE_HEADER, HeaderValue::from_str(&signature).expect("signature is ASCII"));
    headers.insert(EVENT_HEADER, HeaderValue::from_str(event).expect("event is ASCII"));
    headers.insert(DELIVERY_HEADER, HeaderValue::from_static("72d3162e-cc78-11e3-81ab-4c9367dc0958"));
    headers
}

/// Minimal `issue_comment` payload.
pub fn issue_comment_payload(action: &str, body: &str) -> Value {
    json!({
        "action": action,
        "repository": { "name": "hello-world" },
        "issue": { "title": "Spelling error in the README file" },
        "comment": {
            "html_url": "https://github.com/octo/hello-world/issues/1#issuecomment-1",
            "user": { "login": "monalisa" },
            "body": body,
        },
    })
}
