use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use rollstock_core::RollId;
use rollstock_inventory::compute_stats;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn create_roll(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateRollRequest>,
) -> axum::response::Response {
    let new = match body.into_new_roll() {
        Ok(n) => n,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let roll = match services.store().create(new, Utc::now()).await {
        Ok(r) => r,
        Err(e) => return errors::store_error_to_response(e),
    };

    tracing::info!(roll_id = %roll.id, length = roll.length, weight = roll.weight, "roll added");
    (StatusCode::OK, Json(dto::roll_to_json(&roll))).into_response()
}

pub async fn delete_roll(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: RollId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let roll = match services.store().soft_delete(id, Utc::now()).await {
        Ok(r) => r,
        Err(e) => return errors::store_error_to_response(e),
    };

    tracing::info!(roll_id = %roll.id, "roll removed");
    (StatusCode::OK, Json(dto::roll_to_json(&roll))).into_response()
}

pub async fn get_roll(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: RollId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.store().get(id).await {
        Ok(Some(roll)) => (StatusCode::OK, Json(dto::roll_to_json(&roll))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "Roll not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_rolls(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListRollsQuery>,
) -> axum::response::Response {
    let filter = match query.to_filter() {
        Ok(f) => f,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.store().list(&filter).await {
        Ok(rolls) => (
            StatusCode::OK,
            Json(rolls.iter().map(dto::roll_to_json).collect::<Vec<_>>()),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_stats(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::StatsQuery>,
) -> axum::response::Response {
    let window = match query.to_window() {
        Ok(w) => w,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let rolls = match services.store().stats_snapshot(&window).await {
        Ok(r) => r,
        Err(e) => return errors::store_error_to_response(e),
    };

    let report = match compute_stats(&rolls, &window, Utc::now()) {
        Ok(r) => r,
        Err(e) => return errors::stats_error_to_response(e),
    };

    if report.max_duration.is_none() {
        tracing::debug!(
            start = %window.start(),
            end = %window.end(),
            "no removed rolls in window; duration stats omitted"
        );
    }

    (StatusCode::OK, Json(report)).into_response()
}
