use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// CORS for the browser card UI.
pub fn quiz_client_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_origin(Any)
}
