use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::app::services::{AppServices, run_blocking};
use crate::app::{dto, errors};

pub async fn optimize(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match run_blocking(services, |s| s.optimize()).await {
        Ok(plan) => (StatusCode::OK, Json(dto::OptimizeResponse::from(plan))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn optimize_records(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::OptimizeRecordsRequest>,
) -> axum::response::Response {
    match services.optimize_records(body.records) {
        Ok(plan) => (StatusCode::OK, Json(dto::OptimizeResponse::from(plan))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
