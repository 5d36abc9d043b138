//! Domain layer containing core business types, traits, and error definitions.

pub mod error;
pub mod filters;
pub mod traits;
pub mod types;
pub mod validation;

pub use error::{
    AppError, ConfigError, ConfigurationInvalid, DatabaseError, FeatureValidationError,
    PropertyTypeInvalid, ValidationError,
};
pub use filters::{ConfigurationFilter, OrderBy, Page, PropertyFilter};
pub use traits::{ConfigurationRepository, PropertyRepository};
pub use types::{
    Configuration, ConfigurationShape, ConfigurationType, CreateConfigurationRequest,
    CreatePropertyRequest, EntityId, ErrorDetail, ErrorResponse, FeatureMap, FeatureValue,
    HealthResponse, HealthStatus, Location, Property, UpdateConfigurationRequest,
    UpdatePropertyRequest,
};
pub use validation::{
    validate_additional_features, validate_configuration, validate_property_type,
};
