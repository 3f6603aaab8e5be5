pub mod content_blocks;
pub mod health;
pub mod pages;
pub mod products;

use axum::{extract::DefaultBodyLimit, Router};

use crate::state::AppState;

/// Assemble the full router with all route groups.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config().max_body_bytes;
    Router::new()
        .merge(health::routes())
        .merge(pages::routes())
        .merge(products::routes())
        .merge(content_blocks::routes())
        // Enforced by the Json extractor, so rejections keep the error body.
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
