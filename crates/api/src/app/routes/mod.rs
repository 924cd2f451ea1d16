use axum::{
    Router,
    routing::{get, post},
};

pub mod model;
pub mod optimize;
pub mod system;

/// Router for the model and optimizer endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/status", get(system::status))
        .route("/train", post(model::train))
        .route("/predict", get(model::predict))
        .route("/optimize", get(optimize::optimize))
        .route("/optimize/records", post(optimize::optimize_records))
}
