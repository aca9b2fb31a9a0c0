use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use rollstock_core::DomainError;
use rollstock_infra::StoreError;
use rollstock_inventory::StatsError;

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", "Roll not found"),
        StoreError::Domain(e) => domain_error_to_response(e),
        StoreError::Storage(msg) => {
            tracing::error!(error = %msg, "roll store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

pub fn stats_error_to_response(err: StatsError) -> axum::response::Response {
    match err {
        StatsError::NoData => json_error(StatusCode::NOT_FOUND, "no_data", "No rolls found in this period"),
        StatsError::NoDurationData => json_error(StatusCode::NOT_FOUND, "no_duration_data", err.to_string()),
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
