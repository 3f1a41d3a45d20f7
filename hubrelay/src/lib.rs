//! # hubrelay: GitHub to Slack mention relay
//!
//! `hubrelay` receives GitHub webhook deliveries, and whenever an issue, pull
//! request, review or comment mentions a GitHub user that has a Slack account
//! on file, posts a short notification to that account's Slack incoming
//! webhook with the mention rewritten into a Slack mention.
//!
//! ## Request flow
//!
//! ```text
//! POST /github/events
//!   │
//!   ├─ headers present?            github::HookHeaders      (400 no_signature / no_event / no_event_id)
//!   ├─ account directory snapshot  config::DirectorySource  (500 if unreadable)
//!   ├─ HMAC-SHA1 signature         github::signature        (401 invalid_signature, 400 empty_payload)
//!   ├─ classify + normalize        github::events           (202 unhandled_event / unhandled_action)
//!   ├─ resolve + rewrite mentions  slack::mentions
//!   ├─ render text                 slack::message
//!   └─ fan out, one POST/account   slack::dispatcher        (failures logged, never fail the hook)
//! ```
//!
//! The account directory holds the webhook secret and the mention -> account
//! mapping. It is read again for every delivery so edits apply without a
//! restart.
//!
//! ## Modules
//!
//! - [`api`]: HTTP handlers and response bodies
//! - [`config`]: server configuration and the account directory
//! - [`errors`]: the handler error type and its HTTP mapping
//! - [`github`]: authentication and event normalization
//! - [`relay`]: the per-hook pipeline
//! - [`slack`]: mention resolution, message text, and delivery
//! - [`telemetry`]: tracing and OpenTelemetry setup
//!
//! ## Running
//!
//! ```bash
//! hubrelay -f config.yaml            # serve
//! hubrelay -f config.yaml --validate # check config and directory, then exit
//! ```

pub mod api;
pub mod config;
pub mod errors;
pub mod github;
pub mod relay;
pub mod slack;
pub mod telemetry;

#[cfg(test)]
mod test_utils;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use config::DirectorySource;
use slack::{NotificationDispatcher, SlackClient};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info};

/// Largest hook body accepted. GitHub caps webhook payloads at 25 MB.
pub const MAX_HOOK_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .directory(DirectorySource::File("accounts.yaml".into()))
///     .dispatcher(dispatcher)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub directory: DirectorySource,
    pub dispatcher: NotificationDispatcher,
}

/// Build the router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let enable_metrics = state.config.enable_metrics;

    let mut router = Router::new()
        .route("/", get(api::handlers::home::home))
        .route(
            "/github/events",
            post(api::handlers::github::post_github_events).layer(DefaultBodyLimit::max(MAX_HOOK_BODY_BYTES)),
        )
        .with_state(state);

    if enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// The relay server.
///
/// [`Application::new`] wires the Slack client, dispatcher and directory
/// source from configuration; [`Application::serve`] binds and runs until
/// the shutdown future resolves.
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create an application that reads the account directory from `config.directory.path`.
    ///
    /// reqwest is built without a bundled TLS provider: install one with
    /// `rustls::crypto::CryptoProvider::install_default` first.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let directory = DirectorySource::from(&config.directory);
        Self::new_with_directory(config, directory)
    }

    pub fn new_with_directory(config: Config, directory: DirectorySource) -> anyhow::Result<Self> {
        debug!("Starting relay with configuration: {:#?}", config);

        let client = SlackClient::new(&config.slack)?;
        let dispatcher = NotificationDispatcher::new(Arc::new(client), config.slack.max_concurrent_sends);

        let state = AppState::builder()
            .config(config.clone())
            .directory(directory)
            .dispatcher(dispatcher)
            .build();

        Ok(Self {
            router: build_router(state),
            config,
        })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Relay listening on http://{}, posting to {}",
            bind_addr, self.config.slack.base_url
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
