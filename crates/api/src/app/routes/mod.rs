use axum::{Router, routing::get};

pub mod rolls;
pub mod system;

/// Router for the roll endpoints. Every collection path also answers with a
/// trailing slash.
pub fn router() -> Router {
    Router::new()
        .route("/rolls", get(rolls::list_rolls).post(rolls::create_roll))
        .route("/rolls/", get(rolls::list_rolls).post(rolls::create_roll))
        .route("/rolls/stats", get(rolls::get_stats))
        .route("/rolls/stats/", get(rolls::get_stats))
        .route("/rolls/:id", get(rolls::get_roll).delete(rolls::delete_roll))
}
