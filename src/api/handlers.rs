//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::app::AppState;
use crate::domain::{
    AppError, Configuration, ConfigurationFilter, CreateConfigurationRequest,
    CreatePropertyRequest, DatabaseError, ErrorDetail, ErrorResponse, HealthResponse,
    HealthStatus, OrderBy, Page, Property, PropertyFilter, UpdateConfigurationRequest,
    UpdatePropertyRequest, ValidationError,
};

/// Builds pagination from the raw query parameters.
///
/// `order_by` is a column name, prefixed with `-` for descending order.
fn page_from_query(
    page: Option<u32>,
    size: Option<u32>,
    order_by: Option<&str>,
) -> Result<Page, AppError> {
    let order_by = match order_by {
        None => None,
        Some(raw) => Some(OrderBy::parse(raw).ok_or_else(|| {
            AppError::Validation(ValidationError::InvalidField {
                field: "order_by".to_string(),
                message: format!("'{raw}' is not a valid ordering"),
            })
        })?),
    };

    Ok(Page {
        page,
        size,
        order_by,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct PropertyListQuery {
    pub id_eq: Option<Uuid>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub order_by: Option<String>,
}

impl PropertyListQuery {
    fn into_filter(self) -> Result<PropertyFilter, AppError> {
        Ok(PropertyFilter {
            id_eq: self.id_eq,
            page: page_from_query(self.page, self.size, self.order_by.as_deref())?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfigurationListQuery {
    pub id_eq: Option<Uuid>,
    pub key_eq: Option<String>,
    /// Comma-separated list of keys.
    pub key_in: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub order_by: Option<String>,
}

impl ConfigurationListQuery {
    fn into_filter(self) -> Result<ConfigurationFilter, AppError> {
        let page = page_from_query(self.page, self.size, self.order_by.as_deref())?;
        let key_in = self.key_in.map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(String::from)
                .collect()
        });

        Ok(ConfigurationFilter {
            id_eq: self.id_eq,
            key_eq: self.key_eq,
            key_in,
            page,
        })
    }
}

// Properties

pub async fn create_property_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreatePropertyRequest>,
) -> Result<(StatusCode, Json<Property>), AppError> {
    let property = state.properties.create_property(&payload).await?;
    Ok((StatusCode::CREATED, Json(property)))
}

pub async fn list_properties_handler(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<PropertyListQuery>,
) -> Result<Json<Vec<Property>>, AppError> {
    let filter = query.into_filter()?;
    let properties = state.properties.list_properties(&filter).await?;
    Ok(Json(properties))
}

pub async fn get_property_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Property>, AppError> {
    let property = state.properties.get_property(id).await?;
    Ok(Json(property))
}

pub async fn update_property_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdatePropertyRequest>,
) -> Result<Json<Property>, AppError> {
    let property = state.properties.update_property(id, &payload).await?;
    Ok(Json(property))
}

pub async fn delete_property_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    state.properties.delete_property(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Configurations

pub async fn create_configuration_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateConfigurationRequest>,
) -> Result<(StatusCode, Json<Configuration>), AppError> {
    let configuration = state.configurations.create_configuration(&payload).await?;
    Ok((StatusCode::CREATED, Json(configuration)))
}

pub async fn list_configurations_handler(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ConfigurationListQuery>,
) -> Result<Json<Vec<Configuration>>, AppError> {
    let filter = query.into_filter()?;
    let configurations = state.configurations.list_configurations(&filter).await?;
    Ok(Json(configurations))
}

pub async fn get_configuration_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Configuration>, AppError> {
    let configuration = state.configurations.get_configuration(id).await?;
    Ok(Json(configuration))
}

pub async fn update_configuration_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateConfigurationRequest>,
) -> Result<Json<Configuration>, AppError> {
    let configuration = state
        .configurations
        .update_configuration(id, &payload)
        .await?;
    Ok(Json(configuration))
}

pub async fn delete_configuration_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    state.configurations.delete_configuration(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Health

/// Detailed health check
pub async fn health_check_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let health = state.health_check().await;
    Json(health)
}

/// Kubernetes liveness probe
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Kubernetes readiness probe
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    let health = state.health_check().await;
    match health.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Prometheus exposition, 404 when no recorder is installed.
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

impl AppError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::ConfigurationInvalid(_)
            | AppError::PropertyTypeInvalid(_)
            | AppError::Features(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(db_err) => match db_err {
                DatabaseError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
                DatabaseError::NotFound(_) => StatusCode::NOT_FOUND,
                DatabaseError::Duplicate(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_type = self.kind();
        let message = self.to_string();

        if status.is_server_error() {
            error!(error_type = %error_type, message = %message, "Server error");
        }

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                r#type: error_type.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ConfigurationInvalid, ConfigurationType, FeatureValidationError, PropertyTypeInvalid,
    };
    use http_body_util::BodyExt;

    async fn error_body(err: AppError) -> (StatusCode, ErrorResponse) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_response() {
        let (status, body) = error_body(AppError::property_not_found(Uuid::nil())).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error.r#type, "not_found");
        assert!(body.error.message.starts_with("Property with id"));
    }

    #[tokio::test]
    async fn test_domain_errors_are_bad_requests() {
        let errors = [
            AppError::from(ConfigurationInvalid {
                key: "k".to_string(),
                kind: ConfigurationType::Text,
            }),
            AppError::from(PropertyTypeInvalid {
                property_type: "castle".to_string(),
            }),
            AppError::from(FeatureValidationError::AllFeaturesInvalid),
        ];

        for err in errors {
            let kind = err.kind();
            let (status, body) = error_body(err).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body.error.r#type, kind);
        }
    }

    #[test]
    fn test_database_error_status_codes() {
        let cases = [
            (
                DatabaseError::Connection("down".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (DatabaseError::NotFound("x".to_string()), StatusCode::NOT_FOUND),
            (DatabaseError::Duplicate("x".to_string()), StatusCode::CONFLICT),
            (
                DatabaseError::Query("x".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::Database(err).status_code(), expected);
        }
    }

    #[test]
    fn test_validation_is_unprocessable() {
        let err = AppError::Validation(ValidationError::Multiple("bad".to_string()));
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_page_query_parses_order() {
        let filter = PropertyListQuery {
            page: Some(1),
            size: Some(10),
            order_by: Some("-rent_value".to_string()),
            ..Default::default()
        }
        .into_filter()
        .unwrap();

        assert_eq!(filter.page.order_by, Some(OrderBy::desc("rent_value")));
        assert_eq!(filter.page.offset(), Some(10));
    }

    #[test]
    fn test_page_query_rejects_empty_order() {
        let result = page_from_query(None, None, Some("-"));

        assert!(matches!(
            result,
            Err(AppError::Validation(ValidationError::InvalidField { .. }))
        ));
    }

    #[test]
    fn test_configuration_query_splits_keys() {
        let filter = ConfigurationListQuery {
            key_in: Some("parking, pool,,garden".to_string()),
            ..Default::default()
        }
        .into_filter()
        .unwrap();

        assert_eq!(
            filter.key_in,
            Some(vec![
                "parking".to_string(),
                "pool".to_string(),
                "garden".to_string()
            ])
        );
    }
}
