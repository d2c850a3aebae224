pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::journal::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/entries", get(handlers::handle_list_entries))
        .route("/api/v1/entries/text", post(handlers::handle_create_text))
        .route("/api/v1/entries/video", post(handlers::handle_create_video))
        .route(
            "/api/v1/entries/:id",
            get(handlers::handle_get_entry).delete(handlers::handle_delete_entry),
        )
        .route(
            "/api/v1/entries/:id/analyze",
            post(handlers::handle_reanalyze),
        )
        .with_state(state)
}
