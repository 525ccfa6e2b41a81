//! Router assembly.
//!
//! There are no named routes: every request falls through to the static file
//! service. Responses carry a short-lived Cache-Control header so clients
//! revalidate files that change between requests, and the request-ID
//! middleware wraps everything so each request gets a correlated log span.

use axum::{middleware, Router};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::CACHE_CONTROL_FILES;
use crate::http::static_files::create_static_service;
use crate::middleware::request_id_layer;
use crate::state::AppState;

/// Creates the Axum router serving the configured directory.
pub fn create_router(state: AppState) -> Router {
    create_static_service(state)
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_FILES),
        ))
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
