use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use shelfwise_ai::AiError;
use shelfwise_core::DomainError;

use crate::app::services::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Ai(e) => ai_error_to_response(e),
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Background(message) => {
            tracing::error!(error = %message, "service task did not complete");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
        }
    }
}

pub fn ai_error_to_response(err: AiError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        AiError::ModelNotTrained => json_error(StatusCode::CONFLICT, "model_not_trained", message),
        AiError::MalformedRecord(_) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "malformed_record", message)
        }
        AiError::InvalidInput(_) => json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_input", message),
        AiError::TrainingFailed(_) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "training_failed", message)
        }
        AiError::Artifact(_) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "artifact_error", message),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DomainError::Validation(_) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", message)
        }
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", message),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
