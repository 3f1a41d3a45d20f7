//! HTTP layer: route handlers and the JSON bodies they return.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Response data structures
//!
//! # Routes
//!
//! - `GET /`: liveness greeting, `{"res": "Hello!"}`
//! - `POST /github/events`: inbound GitHub webhook deliveries
//! - `GET /internal/metrics`: Prometheus scrape endpoint (when `enable_metrics` is set)

pub mod handlers;
pub mod models;
