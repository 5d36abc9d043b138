//! PostgreSQL repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    PgPool, Postgres, QueryBuilder, Row,
    postgres::{PgPoolOptions, PgRow},
    types::Json,
};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{
    AppError, Configuration, ConfigurationFilter, ConfigurationRepository, ConfigurationType,
    CreateConfigurationRequest, CreatePropertyRequest, DatabaseError, FeatureMap, Location, Page,
    Property, PropertyFilter, PropertyRepository, UpdateConfigurationRequest,
    UpdatePropertyRequest,
};

const PROPERTY_COLUMNS: &str = "id, property_type, room_count, bathroom_count, \
     additional_features, location_address, location_latitude, location_longitude, \
     rent_value, created_at, updated_at";

const CONFIGURATION_COLUMNS: &str = "id, key, type, value, created_at, updated_at";

/// PostgreSQL connection pool configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(3),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

/// PostgreSQL client with connection pooling.
///
/// Implements both repository traits over one pool.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client with custom configuration
    pub async fn new(database_url: &str, config: PostgresConfig) -> Result<Self, AppError> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect(database_url)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client with default configuration
    pub async fn with_defaults(database_url: &str) -> Result<Self, AppError> {
        Self::new(database_url, PostgresConfig::default()).await
    }

    /// Run database migrations using sqlx migrate
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying connection pool (for testing)
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        Ok(())
    }

    fn row_to_property(row: &PgRow) -> Result<Property, AppError> {
        let features: Json<FeatureMap> = row.try_get("additional_features")?;

        Ok(Property {
            id: row.try_get("id")?,
            property_type: row.try_get("property_type")?,
            room_count: row.try_get("room_count")?,
            bathroom_count: row.try_get("bathroom_count")?,
            additional_features: features.0,
            location: Location {
                address: row.try_get("location_address")?,
                latitude: row.try_get("location_latitude")?,
                longitude: row.try_get("location_longitude")?,
            },
            rent_value: row.try_get("rent_value")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_configuration(row: &PgRow) -> Result<Configuration, AppError> {
        let kind: String = row.try_get("type")?;
        let kind: ConfigurationType = kind
            .parse()
            .map_err(|e: String| AppError::Database(DatabaseError::Query(e)))?;
        let value: Option<Json<Vec<String>>> = row.try_get("value")?;

        Ok(Configuration {
            id: row.try_get("id")?,
            key: row.try_get("key")?,
            kind,
            value: value.map(|v| v.0),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

fn property_order_column(field: &str) -> Option<&'static str> {
    match field {
        "id" => Some("id"),
        "property_type" => Some("property_type"),
        "room_count" => Some("room_count"),
        "bathroom_count" => Some("bathroom_count"),
        "rent_value" => Some("rent_value"),
        "created_at" => Some("created_at"),
        "updated_at" => Some("updated_at"),
        _ => None,
    }
}

fn configuration_order_column(field: &str) -> Option<&'static str> {
    match field {
        "id" => Some("id"),
        "key" => Some("key"),
        "type" => Some("type"),
        "created_at" => Some("created_at"),
        "updated_at" => Some("updated_at"),
        _ => None,
    }
}

/// Appends `ORDER BY`, `LIMIT` and `OFFSET`.
///
/// Unknown order fields fall back to creation order.
fn push_page(
    builder: &mut QueryBuilder<'_, Postgres>,
    page: &Page,
    column_for: fn(&str) -> Option<&'static str>,
) {
    let ordering = page
        .order_by
        .as_ref()
        .and_then(|order| column_for(&order.field).map(|column| (column, order.descending)));

    match ordering {
        Some((column, descending)) => {
            builder
                .push(" ORDER BY ")
                .push(column)
                .push(if descending { " DESC" } else { " ASC" })
                .push(", created_at ASC, id ASC");
        }
        None => {
            builder.push(" ORDER BY created_at ASC, id ASC");
        }
    }

    if let Some(limit) = page.limit() {
        builder.push(" LIMIT ").push_bind(limit);
    }
    if let Some(offset) = page.offset() {
        builder.push(" OFFSET ").push_bind(offset);
    }
}

fn missing(entity: &str, id: Uuid) -> AppError {
    AppError::Database(DatabaseError::NotFound(format!(
        "{} {} not found",
        entity, id
    )))
}

#[async_trait]
impl PropertyRepository for PostgresClient {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        self.ping().await
    }

    #[instrument(skip(self, data), fields(property_type = %data.property_type))]
    async fn create(&self, data: &CreatePropertyRequest) -> Result<Property, AppError> {
        let now = Utc::now();

        let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO property (");
        builder.push(PROPERTY_COLUMNS).push(") VALUES (");
        builder
            .separated(", ")
            .push_bind(Uuid::new_v4())
            .push_bind(data.property_type.clone())
            .push_bind(data.room_count)
            .push_bind(data.bathroom_count)
            .push_bind(Json(data.additional_features.clone()))
            .push_bind(data.location.address.clone())
            .push_bind(data.location.latitude)
            .push_bind(data.location.longitude)
            .push_bind(data.rent_value)
            .push_bind(now)
            .push_bind(now);
        builder.push(") RETURNING ").push(PROPERTY_COLUMNS);

        let row = builder.build().fetch_one(&self.pool).await?;
        Self::row_to_property(&row)
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: &PropertyFilter) -> Result<Vec<Property>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT ");
        builder.push(PROPERTY_COLUMNS).push(" FROM property WHERE TRUE");

        if let Some(id) = filter.id_eq {
            builder.push(" AND id = ").push_bind(id);
        }
        push_page(&mut builder, &filter.page, property_order_column);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_property).collect()
    }

    #[instrument(skip(self, property, changes), fields(property_id = %property.id))]
    async fn update(
        &self,
        property: &Property,
        changes: &UpdatePropertyRequest,
    ) -> Result<Property, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE property SET updated_at = ");
        builder.push_bind(Utc::now());

        if let Some(property_type) = &changes.property_type {
            builder
                .push(", property_type = ")
                .push_bind(property_type.clone());
        }
        if let Some(room_count) = changes.room_count {
            builder.push(", room_count = ").push_bind(room_count);
        }
        if let Some(bathroom_count) = changes.bathroom_count {
            builder.push(", bathroom_count = ").push_bind(bathroom_count);
        }
        if let Some(features) = &changes.additional_features {
            builder
                .push(", additional_features = ")
                .push_bind(Json(features.clone()));
        }
        if let Some(location) = &changes.location {
            builder
                .push(", location_address = ")
                .push_bind(location.address.clone())
                .push(", location_latitude = ")
                .push_bind(location.latitude)
                .push(", location_longitude = ")
                .push_bind(location.longitude);
        }
        if let Some(rent_value) = changes.rent_value {
            builder.push(", rent_value = ").push_bind(rent_value);
        }

        builder
            .push(" WHERE id = ")
            .push_bind(property.id)
            .push(" RETURNING ")
            .push(PROPERTY_COLUMNS);

        let row = builder
            .build()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| missing("Property", property.id))?;
        Self::row_to_property(&row)
    }

    #[instrument(skip(self, property), fields(property_id = %property.id))]
    async fn delete(&self, property: &Property) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM property WHERE id = $1")
            .bind(property.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(missing("Property", property.id));
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigurationRepository for PostgresClient {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        self.ping().await
    }

    #[instrument(skip(self, data), fields(key = %data.key))]
    async fn create(&self, data: &CreateConfigurationRequest) -> Result<Configuration, AppError> {
        let now = Utc::now();

        let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO configuration (");
        builder.push(CONFIGURATION_COLUMNS).push(") VALUES (");
        builder
            .separated(", ")
            .push_bind(Uuid::new_v4())
            .push_bind(data.key.clone())
            .push_bind(data.kind.as_str())
            .push_bind(data.value.clone().map(Json))
            .push_bind(now)
            .push_bind(now);
        builder.push(") RETURNING ").push(CONFIGURATION_COLUMNS);

        let row = builder.build().fetch_one(&self.pool).await?;
        Self::row_to_configuration(&row)
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: &ConfigurationFilter) -> Result<Vec<Configuration>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT ");
        builder
            .push(CONFIGURATION_COLUMNS)
            .push(" FROM configuration WHERE TRUE");

        if let Some(id) = filter.id_eq {
            builder.push(" AND id = ").push_bind(id);
        }
        if let Some(key) = &filter.key_eq {
            builder.push(" AND key = ").push_bind(key.clone());
        }
        if let Some(keys) = &filter.key_in {
            builder
                .push(" AND key = ANY(")
                .push_bind(keys.clone())
                .push(")");
        }
        push_page(&mut builder, &filter.page, configuration_order_column);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_configuration).collect()
    }

    #[instrument(skip(self, configuration, changes), fields(configuration_id = %configuration.id))]
    async fn update(
        &self,
        configuration: &Configuration,
        changes: &UpdateConfigurationRequest,
    ) -> Result<Configuration, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE configuration SET updated_at = ");
        builder.push_bind(Utc::now());

        if let Some(key) = &changes.key {
            builder.push(", key = ").push_bind(key.clone());
        }
        if let Some(kind) = changes.kind {
            builder.push(", type = ").push_bind(kind.as_str());
        }
        if let Some(value) = &changes.value {
            builder
                .push(", value = ")
                .push_bind(value.clone().map(Json));
        }

        builder
            .push(" WHERE id = ")
            .push_bind(configuration.id)
            .push(" RETURNING ")
            .push(CONFIGURATION_COLUMNS);

        let row = builder
            .build()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| missing("Configuration", configuration.id))?;
        Self::row_to_configuration(&row)
    }

    #[instrument(skip(self, configuration), fields(configuration_id = %configuration.id))]
    async fn delete(&self, configuration: &Configuration) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM configuration WHERE id = $1")
            .bind(configuration.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(missing("Configuration", configuration.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderBy;

    #[test]
    fn test_postgres_config_default() {
        let config = PostgresConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.acquire_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_order_columns_are_allow_listed() {
        assert_eq!(property_order_column("rent_value"), Some("rent_value"));
        assert_eq!(property_order_column("rent_value; DROP TABLE property"), None);
        assert_eq!(configuration_order_column("type"), Some("type"));
        assert_eq!(configuration_order_column("value"), None);
    }

    #[test]
    fn test_push_page_sql() {
        let page = Page {
            page: Some(2),
            size: Some(5),
            order_by: Some(OrderBy::desc("rent_value")),
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM property");
        push_page(&mut builder, &page, property_order_column);

        assert_eq!(
            builder.sql(),
            "SELECT * FROM property ORDER BY rent_value DESC, created_at ASC, id ASC LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn test_push_page_ignores_unknown_order_and_zero_size() {
        let page = Page {
            page: Some(1),
            size: Some(0),
            order_by: Some(OrderBy::asc("password")),
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM configuration");
        push_page(&mut builder, &page, configuration_order_column);

        assert_eq!(
            builder.sql(),
            "SELECT * FROM configuration ORDER BY created_at ASC, id ASC OFFSET $1"
        );
    }
}
