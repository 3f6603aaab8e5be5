use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

/// Build the CORS layer. The public site and the admin UI are served from
/// other origins, so any origin may read and edit.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH])
        .allow_headers(Any)
}
