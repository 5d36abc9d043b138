//! Domain traits defining contracts for external systems.

use async_trait::async_trait;

use super::error::AppError;
use super::filters::{ConfigurationFilter, PropertyFilter};
use super::types::{
    Configuration, CreateConfigurationRequest, CreatePropertyRequest, Property,
    UpdateConfigurationRequest, UpdatePropertyRequest,
};

/// Persistence contract for property listings.
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    /// Check storage connectivity
    async fn health_check(&self) -> Result<(), AppError>;

    /// Persist a new property, assigning its identity and timestamps
    async fn create(&self, data: &CreatePropertyRequest) -> Result<Property, AppError>;

    /// List properties matching the filter
    async fn list(&self, filter: &PropertyFilter) -> Result<Vec<Property>, AppError>;

    /// Write only the supplied fields of `changes`
    async fn update(
        &self,
        property: &Property,
        changes: &UpdatePropertyRequest,
    ) -> Result<Property, AppError>;

    /// Remove a property
    async fn delete(&self, property: &Property) -> Result<(), AppError>;
}

/// Persistence contract for the configuration catalog.
#[async_trait]
pub trait ConfigurationRepository: Send + Sync {
    /// Check storage connectivity
    async fn health_check(&self) -> Result<(), AppError>;

    /// Persist a new configuration, assigning its identity and timestamps
    async fn create(&self, data: &CreateConfigurationRequest) -> Result<Configuration, AppError>;

    /// List configurations matching the filter
    async fn list(&self, filter: &ConfigurationFilter) -> Result<Vec<Configuration>, AppError>;

    /// Write only the supplied fields of `changes`
    async fn update(
        &self,
        configuration: &Configuration,
        changes: &UpdateConfigurationRequest,
    ) -> Result<Configuration, AppError>;

    /// Remove a configuration
    async fn delete(&self, configuration: &Configuration) -> Result<(), AppError>;
}
