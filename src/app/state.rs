//! Application state management.
//!
//! This module provides the shared application state that is
//! accessible to all request handlers via Axum's State extractor.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{instrument, warn};

use crate::domain::{ConfigurationRepository, HealthResponse, HealthStatus, PropertyRepository};

use super::service::{ConfigurationService, PropertyService};

/// Shared application state for the Axum web server.
///
/// All contained types are wrapped in `Arc` and implement `Send + Sync`,
/// making `AppState` safe to share across async tasks.
///
/// # Example
///
/// ```ignore
/// let db = Arc::new(PostgresClient::with_defaults(&url).await?);
/// let state = AppState::new(db.clone(), db);
///
/// let router = create_router(Arc::new(state));
/// ```
#[derive(Clone)]
pub struct AppState {
    pub properties: Arc<PropertyService>,
    pub configurations: Arc<ConfigurationService>,

    /// Repositories, kept for health probes.
    pub property_repository: Arc<dyn PropertyRepository>,
    pub configuration_repository: Arc<dyn ConfigurationRepository>,

    /// Prometheus handle rendered at `/metrics`, if a recorder is installed.
    pub metrics: Option<Arc<PrometheusHandle>>,
}

impl AppState {
    /// Creates a new `AppState`, wiring both services to the repositories.
    #[must_use]
    pub fn new(
        property_repository: Arc<dyn PropertyRepository>,
        configuration_repository: Arc<dyn ConfigurationRepository>,
    ) -> Self {
        let properties = Arc::new(PropertyService::new(
            Arc::clone(&property_repository),
            Arc::clone(&configuration_repository),
        ));
        let configurations = Arc::new(ConfigurationService::new(Arc::clone(
            &configuration_repository,
        )));

        Self {
            properties,
            configurations,
            property_repository,
            configuration_repository,
            metrics: None,
        }
    }

    /// Attaches a Prometheus handle for the `/metrics` endpoint.
    #[must_use]
    pub fn with_metrics(mut self, handle: Option<Arc<PrometheusHandle>>) -> Self {
        self.metrics = handle;
        self
    }

    /// Probes both repositories.
    ///
    /// Storage is unhealthy if either probe fails.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> HealthResponse {
        let properties = self.property_repository.health_check().await;
        let configurations = self.configuration_repository.health_check().await;

        let database = match properties.and(configurations) {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => {
                warn!(error = ?e, "Database health check failed");
                HealthStatus::Unhealthy
            }
        };

        HealthResponse::new(database)
    }
}
