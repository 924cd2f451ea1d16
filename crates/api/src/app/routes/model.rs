use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
};

use crate::app::services::{AppServices, run_blocking};
use crate::app::{dto, errors};

const DEFAULT_PERIODS_AHEAD: u32 = 4;

pub async fn train(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match run_blocking(services, |s| s.train()).await {
        Ok(summary) => (StatusCode::OK, Json(dto::TrainResponse::from(summary))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn predict(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::PredictQuery>,
) -> axum::response::Response {
    let periods_ahead = query.periods_ahead.unwrap_or(DEFAULT_PERIODS_AHEAD);

    match run_blocking(services, move |s| s.forecast_per_branch(periods_ahead)).await {
        Ok((period, per_branch)) => {
            (StatusCode::OK, Json(dto::PredictResponse::new(period, per_branch))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}
