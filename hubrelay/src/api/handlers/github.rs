//! Inbound GitHub webhook endpoint.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Json,
};
use tracing::instrument;

use crate::{
    AppState,
    api::models::relay::RelayResponse,
    errors::Result,
    github::HookHeaders,
    relay::relay_hook,
};

/// Authenticate a GitHub delivery and relay it to the mentioned Slack accounts.
///
/// Required headers are checked before the account directory is read; the
/// signature is verified against the secret from that same directory
/// snapshot. Unhandled events and actions are acknowledged with 202.
#[instrument(skip_all, fields(event, delivery_id))]
pub async fn post_github_events(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<Json<RelayResponse>> {
    let hook_headers = HookHeaders::from_headers(&headers)?;

    let span = tracing::Span::current();
    span.record("event", hook_headers.event());
    span.record("delivery_id", hook_headers.delivery_id());

    let directory = state.directory.snapshot().await?;
    let hook = hook_headers.authenticate(&directory.secret, body)?;

    let report = relay_hook(&directory, &hook, &state.dispatcher).await?;

    Ok(Json(RelayResponse::from(&report)))
}
