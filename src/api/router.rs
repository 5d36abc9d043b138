//! HTTP routing configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, http::StatusCode, routing::get};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::app::AppState;

use super::handlers::{
    create_configuration_handler, create_property_handler, delete_configuration_handler,
    delete_property_handler, get_configuration_handler, get_property_handler,
    health_check_handler, list_configurations_handler, list_properties_handler,
    liveness_handler, metrics_handler, readiness_handler, update_configuration_handler,
    update_property_handler,
};

/// Router settings
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Requests running longer than this get a 408
    pub request_timeout: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Create router with default settings
pub fn create_router(app_state: Arc<AppState>) -> Router {
    create_router_with_config(app_state, RouterConfig::default())
}

/// Create router with custom settings
pub fn create_router_with_config(app_state: Arc<AppState>, config: RouterConfig) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(CorsLayer::permissive());

    let properties = get(list_properties_handler).post(create_property_handler);
    let configurations = get(list_configurations_handler).post(create_configuration_handler);

    // Collections answer with and without a trailing slash. Static
    // `/settings` segments win over `/{id}` in the matcher.
    let api_routes = Router::new()
        .route("/api/properties", properties.clone())
        .route("/api/properties/", properties)
        .route("/api/properties/settings", configurations.clone())
        .route("/api/properties/settings/", configurations)
        .route(
            "/api/properties/settings/{id}",
            get(get_configuration_handler)
                .put(update_configuration_handler)
                .delete(delete_configuration_handler),
        )
        .route(
            "/api/properties/{id}",
            get(get_property_handler)
                .put(update_property_handler)
                .delete(delete_property_handler),
        );

    // Health routes
    let health_routes = Router::new()
        .route("/", get(health_check_handler))
        .route("/live", get(liveness_handler))
        .route("/ready", get(readiness_handler));

    api_routes
        .nest("/health", health_routes)
        .route("/metrics", get(metrics_handler))
        .layer(middleware)
        .with_state(app_state)
}
