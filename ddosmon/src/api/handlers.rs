//! HTTP request handlers
//!
//! Implements the instantaneous-metrics endpoints the dashboard polls.
//! Both are stateless request/response snapshots of the OS metrics
//! provider; failures stay isolated to the single request that hit them.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::Error;
use crate::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
pub struct CpuUsageResponse {
    cpu: f64,
}

#[derive(Debug, Serialize)]
pub struct NetworkUsageResponse {
    network: f64,
}

#[derive(Debug, Deserialize)]
pub struct NetworkUsageQuery {
    interface: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "ddosmon".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /cpu-usage - current aggregate compute load
pub async fn cpu_usage(
    State(state): State<AppState>,
) -> Result<Json<CpuUsageResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.metrics.current_compute_load() {
        Ok(cpu) => Ok(Json(CpuUsageResponse { cpu })),
        Err(e) => {
            error!("Failed to read compute load: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch CPU usage".to_string(),
                }),
            ))
        }
    }
}

/// GET /network-usage - combined rx+tx throughput for one interface, MiB/s
///
/// The interface defaults to the configured one; `?interface=` overrides
/// per request.
pub async fn network_usage(
    State(state): State<AppState>,
    Query(query): Query<NetworkUsageQuery>,
) -> Result<Json<NetworkUsageResponse>, (StatusCode, Json<ErrorResponse>)> {
    let interface = query
        .interface
        .unwrap_or_else(|| state.default_interface.clone());

    match state.metrics.current_network_throughput(&interface) {
        Ok(network) => Ok(Json(NetworkUsageResponse { network })),
        Err(e @ Error::InterfaceNotFound(_)) => {
            warn!("{}", e);
            Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("No network stats found for '{}'", interface),
                }),
            ))
        }
        Err(e) => {
            error!("Failed to read network throughput: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch network usage".to_string(),
                }),
            ))
        }
    }
}
