//! Application error types with proper error chaining.

use thiserror::Error;
use uuid::Uuid;

use super::types::{ConfigurationType, FeatureValue};

#[derive(Error, Debug, Clone)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Query execution failed: {0}")]
    Query(String),
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Duplicate record: {0}")]
    Duplicate(String),
    #[error("Pool exhausted: {0}")]
    PoolExhausted(String),
    #[error("Migration failed: {0}")]
    Migration(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Request payload failed its shape constraints.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },
    #[error("Validation failed: {0}")]
    Multiple(String),
    /// The body or query could not be decoded into the expected shape.
    #[error("Malformed request: {0}")]
    Malformed(String),
}

/// A configuration violates its own shape rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration with key '{key}' and type '{kind}' is not valid")]
pub struct ConfigurationInvalid {
    pub key: String,
    pub kind: ConfigurationType,
}

/// A property type matches no configuration key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Property type '{property_type}' does not match any configuration")]
pub struct PropertyTypeInvalid {
    pub property_type: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureValidationError {
    #[error("Additional features do not match the configured features")]
    AllFeaturesInvalid,
    #[error("Value '{value}' is not valid for feature '{key}'")]
    InvalidFeatureValue { key: String, value: FeatureValue },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{entity} with id '{id}' not found")]
    NotFound { entity: &'static str, id: Uuid },
    #[error(transparent)]
    ConfigurationInvalid(#[from] ConfigurationInvalid),
    #[error(transparent)]
    PropertyTypeInvalid(#[from] PropertyTypeInvalid),
    #[error(transparent)]
    Features(#[from] FeatureValidationError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    /// The request could not be read at all, e.g. broken JSON or a bad path id.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    pub fn property_not_found(id: Uuid) -> Self {
        AppError::NotFound {
            entity: "Property",
            id,
        }
    }

    pub fn configuration_not_found(id: Uuid) -> Self {
        AppError::NotFound {
            entity: "Configuration",
            id,
        }
    }

    /// Machine-readable error kind, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound { .. } => "not_found",
            AppError::ConfigurationInvalid(_) => "configuration_invalid",
            AppError::PropertyTypeInvalid(_) => "property_type_invalid",
            AppError::Features(FeatureValidationError::AllFeaturesInvalid) => {
                "all_features_invalid"
            }
            AppError::Features(FeatureValidationError::InvalidFeatureValue { .. }) => {
                "invalid_feature_value"
            }
            AppError::Validation(_) => "validation_error",
            AppError::Database(DatabaseError::NotFound(_)) => "not_found",
            AppError::Database(DatabaseError::Duplicate(_)) => "duplicate",
            AppError::Database(_) => "database_error",
            AppError::BadRequest(_) => "bad_request",
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(ValidationError::Multiple(err.to_string()))
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Row not found".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted("Pool timed out".to_string()),
            sqlx::Error::Io(io_err) => DatabaseError::Connection(io_err.to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.code().is_some_and(|code| code == "23505") {
                    return DatabaseError::Duplicate(db_err.message().to_string());
                }
                DatabaseError::Query(db_err.message().to_string())
            }
            _ => DatabaseError::Query(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(DatabaseError::from(err))
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(DatabaseError::Migration(err.to_string()))
    }
}
