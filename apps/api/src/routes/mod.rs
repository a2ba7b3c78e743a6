pub mod cards;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/cards", post(cards::handle_render_cards))
        .route("/api/v1/cards/preview", post(cards::handle_preview))
        .with_state(state)
}
