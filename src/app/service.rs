//! Application service layer.
//!
//! Services run the fetch-configurations, validate, persist sequence for
//! each use case. They hold the repository abstractions only, so every
//! workflow can be exercised against the in-memory mocks.

use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{
    validate_additional_features, validate_configuration, validate_property_type, AppError,
    Configuration, ConfigurationFilter, ConfigurationRepository, CreateConfigurationRequest,
    CreatePropertyRequest, FeatureMap, Property, PropertyFilter, PropertyRepository,
    UpdateConfigurationRequest, UpdatePropertyRequest,
};

/// Records a rejected validation rule and passes the error through.
fn rejected<E: Into<AppError>>(rule: &'static str, err: E) -> AppError {
    let err = err.into();
    warn!(rule, error = %err, "Validation rejected request");
    metrics::counter!("property_validation_rejections_total", "rule" => rule).increment(1);
    err
}

/// Use cases for property listings.
///
/// # Example
///
/// ```ignore
/// let db = Arc::new(PostgresClient::with_defaults(&url).await?);
/// let service = PropertyService::new(db.clone(), db);
///
/// let property = service.create_property(&request).await?;
/// ```
pub struct PropertyService {
    property_repository: Arc<dyn PropertyRepository>,
    configuration_repository: Arc<dyn ConfigurationRepository>,
}

impl PropertyService {
    /// Creates a new `PropertyService`.
    ///
    /// # Arguments
    ///
    /// * `property_repository` - Storage for listings.
    /// * `configuration_repository` - Catalog consulted during validation.
    #[must_use]
    pub fn new(
        property_repository: Arc<dyn PropertyRepository>,
        configuration_repository: Arc<dyn ConfigurationRepository>,
    ) -> Self {
        Self {
            property_repository,
            configuration_repository,
        }
    }

    /// Validates and persists a new property.
    ///
    /// The workflow is:
    /// 1. Validate the request payload
    /// 2. Check the property type against the catalog
    /// 3. Check the additional features against the catalog
    /// 4. Persist the property
    ///
    /// # Errors
    ///
    /// Returns an `AppError` if:
    /// - The payload is malformed
    /// - The property type or any feature is rejected
    /// - The repository fails
    #[instrument(skip(self, request), fields(property_type = %request.property_type))]
    pub async fn create_property(
        &self,
        request: &CreatePropertyRequest,
    ) -> Result<Property, AppError> {
        request.validate().map_err(|e| rejected("request", e))?;

        self.check_property_type(&request.property_type).await?;
        self.check_additional_features(&request.additional_features).await?;

        let property = self.property_repository.create(request).await?;
        info!(property_id = %property.id, "Property created");
        Ok(property)
    }

    /// Lists properties matching the filter.
    #[instrument(skip(self))]
    pub async fn list_properties(
        &self,
        filter: &PropertyFilter,
    ) -> Result<Vec<Property>, AppError> {
        self.property_repository.list(filter).await
    }

    /// Gets a property by ID.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` when no property has this ID.
    #[instrument(skip(self))]
    pub async fn get_property(&self, id: Uuid) -> Result<Property, AppError> {
        self.property_repository
            .list(&PropertyFilter::by_id(id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::property_not_found(id))
    }

    /// Applies a partial update.
    ///
    /// Only the checks whose input field is present in `changes` run, so an
    /// update that touches neither `property_type` nor `additional_features`
    /// never reads the catalog.
    #[instrument(skip(self, changes))]
    pub async fn update_property(
        &self,
        id: Uuid,
        changes: &UpdatePropertyRequest,
    ) -> Result<Property, AppError> {
        let existing = self.get_property(id).await?;

        changes.validate().map_err(|e| rejected("request", e))?;

        if let Some(property_type) = &changes.property_type {
            self.check_property_type(property_type).await?;
        }
        if let Some(features) = &changes.additional_features {
            self.check_additional_features(features).await?;
        }

        let property = self.property_repository.update(&existing, changes).await?;
        info!(property_id = %property.id, "Property updated");
        Ok(property)
    }

    /// Deletes a property by ID.
    #[instrument(skip(self))]
    pub async fn delete_property(&self, id: Uuid) -> Result<(), AppError> {
        let existing = self.get_property(id).await?;
        self.property_repository.delete(&existing).await?;
        info!(property_id = %id, "Property deleted");
        Ok(())
    }

    async fn check_property_type(&self, property_type: &str) -> Result<(), AppError> {
        let matches = self
            .configuration_repository
            .list(&ConfigurationFilter::key_eq(property_type))
            .await?;

        validate_property_type(property_type, &matches).map_err(|e| rejected("property_type", e))
    }

    async fn check_additional_features(&self, features: &FeatureMap) -> Result<(), AppError> {
        let matches = self
            .configuration_repository
            .list(&ConfigurationFilter::key_in(features.keys().cloned()))
            .await?;

        validate_additional_features(features, &matches)
            .map_err(|e| rejected("additional_features", e))
    }
}

/// Use cases for the configuration catalog.
pub struct ConfigurationService {
    configuration_repository: Arc<dyn ConfigurationRepository>,
}

impl ConfigurationService {
    #[must_use]
    pub fn new(configuration_repository: Arc<dyn ConfigurationRepository>) -> Self {
        Self {
            configuration_repository,
        }
    }

    /// Validates and persists a new configuration.
    #[instrument(skip(self, request), fields(key = %request.key, kind = %request.kind))]
    pub async fn create_configuration(
        &self,
        request: &CreateConfigurationRequest,
    ) -> Result<Configuration, AppError> {
        request.validate().map_err(|e| rejected("request", e))?;
        validate_configuration(request).map_err(|e| rejected("configuration", e))?;

        let configuration = self.configuration_repository.create(request).await?;
        info!(configuration_id = %configuration.id, "Configuration created");
        Ok(configuration)
    }

    #[instrument(skip(self))]
    pub async fn list_configurations(
        &self,
        filter: &ConfigurationFilter,
    ) -> Result<Vec<Configuration>, AppError> {
        self.configuration_repository.list(filter).await
    }

    /// Gets a configuration by ID.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` when no configuration has this ID.
    #[instrument(skip(self))]
    pub async fn get_configuration(&self, id: Uuid) -> Result<Configuration, AppError> {
        self.configuration_repository
            .list(&ConfigurationFilter::by_id(id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::configuration_not_found(id))
    }

    /// Applies a partial update.
    ///
    /// The shape rule is checked on the existing record with `changes`
    /// merged in, so changing only the type of a `SELECT` entry that still
    /// has values is rejected.
    #[instrument(skip(self, changes))]
    pub async fn update_configuration(
        &self,
        id: Uuid,
        changes: &UpdateConfigurationRequest,
    ) -> Result<Configuration, AppError> {
        let existing = self.get_configuration(id).await?;

        changes.validate().map_err(|e| rejected("request", e))?;
        validate_configuration(&existing.merged(changes))
            .map_err(|e| rejected("configuration", e))?;

        let configuration = self
            .configuration_repository
            .update(&existing, changes)
            .await?;
        info!(configuration_id = %configuration.id, "Configuration updated");
        Ok(configuration)
    }

    #[instrument(skip(self))]
    pub async fn delete_configuration(&self, id: Uuid) -> Result<(), AppError> {
        let existing = self.get_configuration(id).await?;
        self.configuration_repository.delete(&existing).await?;
        info!(configuration_id = %id, "Configuration deleted");
        Ok(())
    }
}
