//! ddosmon - streaming backend for the DDoS detection dashboard
//!
//! Watches the detection process's output directory, extracts the latest
//! score from each finished result file, and fans it out to every live
//! dashboard connection, alongside on-demand CPU and network gauges.
//!
//! Data flows one direction: filesystem event -> extraction -> broadcast.
//! The metrics endpoints are an independent, stateless request path.

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;

pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod hub;
pub mod ingest;
pub mod realtime;
pub mod sysmon;
pub mod watch;

pub use error::{Error, Result};

use crate::sysmon::MetricsGateway;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// OS metrics provider gateway
    pub metrics: Arc<MetricsGateway>,
    /// Interface /network-usage reports on when none is requested
    pub default_interface: String,
}

/// Build the metrics HTTP router
///
/// The dashboard is served from another origin, so CORS is permissive.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/cpu-usage", get(api::cpu_usage))
        .route("/network-usage", get(api::network_usage))
        .route("/health", get(api::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
