//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: model lifecycle, dataset access, optimizer runs
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use shelfwise_ai::AiError;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Loads any previously trained model before returning, so no request ever
/// races model loading.
pub async fn build_app(config: ApiConfig) -> Result<Router, AiError> {
    let services = Arc::new(services::AppServices::load(config)?);
    tracing::info!(trained = services.is_trained(), "services ready");

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_log_middleware))
                .layer(Extension(services)),
        ))
}
