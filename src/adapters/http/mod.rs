//! HTTP adapters - REST API implementations.
//!
//! The survey router plus the cross-cutting layers every request passes
//! through (CORS, tracing, request timeout).

pub mod survey;

pub use survey::{survey_routes, SurveyHandlers};

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

/// Builds the full application router with middleware applied.
pub fn app_router(handlers: SurveyHandlers, server: &ServerConfig) -> Router {
    survey_routes(handlers)
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&server.cors_origins_list()))
}

/// Permissive when no origins are configured.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_layer_accepts_configured_origins() {
        // Construction must not panic for valid, invalid or absent origins.
        let _ = cors_layer(&[]);
        let _ = cors_layer(&["http://localhost:5173".to_string()]);
        let _ = cors_layer(&["bad\norigin".to_string()]);
    }
}
