//! Mock implementations for testing.
//!
//! These mocks provide in-memory implementations of the repository traits
//! that can be configured to simulate success, failure, and unhealthy
//! storage.

use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::domain::{
    AppError, Configuration, ConfigurationFilter, ConfigurationRepository,
    CreateConfigurationRequest, CreatePropertyRequest, DatabaseError, Page, Property,
    PropertyFilter, PropertyRepository, UpdateConfigurationRequest, UpdatePropertyRequest,
};

/// Configuration for mock behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// If true, operations will fail.
    pub should_fail: bool,
    /// Custom error message for failures.
    pub error_message: Option<String>,
}

impl MockConfig {
    /// Creates a config that always succeeds.
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    /// Creates a config that always fails.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
        }
    }
}

/// Call bookkeeping shared by both mocks.
struct MockControl {
    config: MockConfig,
    call_count: AtomicU64,
    list_count: AtomicU64,
    is_healthy: AtomicBool,
}

impl MockControl {
    fn new(config: MockConfig) -> Self {
        Self {
            config,
            call_count: AtomicU64::new(0),
            list_count: AtomicU64::new(0),
            is_healthy: AtomicBool::new(true),
        }
    }

    fn record_call(&self) {
        self.call_count.fetch_add(1, Ordering::Relaxed);
    }

    fn record_list(&self) {
        self.record_call();
        self.list_count.fetch_add(1, Ordering::Relaxed);
    }

    fn check_health(&self) -> Result<(), AppError> {
        self.record_call();
        if !self.is_healthy.load(Ordering::Relaxed) {
            return Err(AppError::Database(DatabaseError::Connection(
                "Mock database unhealthy".to_string(),
            )));
        }
        self.check_should_fail()
    }

    fn check_should_fail(&self) -> Result<(), AppError> {
        if self.config.should_fail {
            let msg = self
                .config
                .error_message
                .clone()
                .unwrap_or_else(|| "Mock database error".to_string());
            return Err(AppError::Database(DatabaseError::Query(msg)));
        }
        Ok(())
    }
}

fn missing(entity: &str, id: Uuid) -> AppError {
    AppError::Database(DatabaseError::NotFound(format!(
        "{} {} not found",
        entity, id
    )))
}

/// Applies ordering, offset and limit the way the SQL adapter does.
fn paginate<T: Clone>(
    mut rows: Vec<T>,
    page: &Page,
    compare: impl Fn(&T, &T, &str) -> Option<CmpOrdering>,
) -> Vec<T> {
    if let Some(order) = &page.order_by {
        // Unknown fields leave the insertion order untouched.
        let known = rows
            .first()
            .is_some_and(|first| compare(first, first, &order.field).is_some());
        if known {
            rows.sort_by(|a, b| {
                let ord = compare(a, b, &order.field).unwrap_or(CmpOrdering::Equal);
                if order.descending { ord.reverse() } else { ord }
            });
        }
    }

    let offset = page.offset().unwrap_or(0).max(0) as usize;
    let rows = rows.into_iter().skip(offset);
    match page.limit() {
        Some(limit) => rows.take(limit as usize).collect(),
        None => rows.collect(),
    }
}

fn compare_properties(a: &Property, b: &Property, field: &str) -> Option<CmpOrdering> {
    match field {
        "id" => Some(a.id.cmp(&b.id)),
        "property_type" => Some(a.property_type.cmp(&b.property_type)),
        "room_count" => Some(a.room_count.cmp(&b.room_count)),
        "bathroom_count" => Some(a.bathroom_count.cmp(&b.bathroom_count)),
        "rent_value" => a.rent_value.partial_cmp(&b.rent_value),
        "created_at" => Some(a.created_at.cmp(&b.created_at)),
        "updated_at" => Some(a.updated_at.cmp(&b.updated_at)),
        _ => None,
    }
}

fn compare_configurations(
    a: &Configuration,
    b: &Configuration,
    field: &str,
) -> Option<CmpOrdering> {
    match field {
        "id" => Some(a.id.cmp(&b.id)),
        "key" => Some(a.key.cmp(&b.key)),
        "type" => Some(a.kind.as_str().cmp(b.kind.as_str())),
        "created_at" => Some(a.created_at.cmp(&b.created_at)),
        "updated_at" => Some(a.updated_at.cmp(&b.updated_at)),
        _ => None,
    }
}

/// In-memory property repository.
///
/// # Example
///
/// ```ignore
/// use property_listings::test_utils::{MockPropertyRepository, mocks::MockConfig};
///
/// let mock = MockPropertyRepository::new();
/// let failing_mock = MockPropertyRepository::with_config(MockConfig::failure("DB error"));
/// ```
pub struct MockPropertyRepository {
    storage: Mutex<Vec<Property>>,
    control: MockControl,
}

impl MockPropertyRepository {
    /// Creates a new mock with default (success) configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    /// Creates a new mock with the given configuration.
    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            storage: Mutex::new(Vec::new()),
            control: MockControl::new(config),
        }
    }

    /// Creates a mock that always fails.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    /// Gets the number of times any method was called.
    pub fn call_count(&self) -> u64 {
        self.control.call_count.load(Ordering::Relaxed)
    }

    /// Sets the health status.
    pub fn set_healthy(&self, healthy: bool) {
        self.control.is_healthy.store(healthy, Ordering::Relaxed);
    }

    /// Inserts a property directly, bypassing validation.
    pub fn seed(&self, property: Property) {
        self.storage.lock().unwrap().push(property);
    }

    /// Gets all stored properties.
    pub fn get_all(&self) -> Vec<Property> {
        self.storage.lock().unwrap().clone()
    }
}

impl Default for MockPropertyRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PropertyRepository for MockPropertyRepository {
    async fn health_check(&self) -> Result<(), AppError> {
        self.control.check_health()
    }

    async fn create(&self, data: &CreatePropertyRequest) -> Result<Property, AppError> {
        self.control.record_call();
        self.control.check_should_fail()?;

        let property = Property::from_request(data);
        self.storage.lock().unwrap().push(property.clone());
        Ok(property)
    }

    async fn list(&self, filter: &PropertyFilter) -> Result<Vec<Property>, AppError> {
        self.control.record_list();
        self.control.check_should_fail()?;

        let rows: Vec<Property> = self
            .storage
            .lock()
            .unwrap()
            .iter()
            .filter(|p| filter.id_eq.is_none_or(|id| p.id == id))
            .cloned()
            .collect();

        Ok(paginate(rows, &filter.page, compare_properties))
    }

    async fn update(
        &self,
        property: &Property,
        changes: &UpdatePropertyRequest,
    ) -> Result<Property, AppError> {
        self.control.record_call();
        self.control.check_should_fail()?;

        let mut storage = self.storage.lock().unwrap();
        let existing = storage
            .iter_mut()
            .find(|p| p.id == property.id)
            .ok_or_else(|| missing("Property", property.id))?;

        existing.apply(changes);
        Ok(existing.clone())
    }

    async fn delete(&self, property: &Property) -> Result<(), AppError> {
        self.control.record_call();
        self.control.check_should_fail()?;

        let mut storage = self.storage.lock().unwrap();
        let before = storage.len();
        storage.retain(|p| p.id != property.id);
        if storage.len() == before {
            return Err(missing("Property", property.id));
        }
        Ok(())
    }
}

/// In-memory configuration repository.
pub struct MockConfigurationRepository {
    storage: Mutex<Vec<Configuration>>,
    control: MockControl,
}

impl MockConfigurationRepository {
    /// Creates a new mock with default (success) configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    /// Creates a new mock with the given configuration.
    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            storage: Mutex::new(Vec::new()),
            control: MockControl::new(config),
        }
    }

    /// Creates a mock that always fails.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    /// Gets the number of times any method was called.
    pub fn call_count(&self) -> u64 {
        self.control.call_count.load(Ordering::Relaxed)
    }

    /// Gets the number of `list` calls, i.e. catalog lookups.
    pub fn list_count(&self) -> u64 {
        self.control.list_count.load(Ordering::Relaxed)
    }

    /// Sets the health status.
    pub fn set_healthy(&self, healthy: bool) {
        self.control.is_healthy.store(healthy, Ordering::Relaxed);
    }

    /// Inserts a configuration directly, bypassing validation.
    pub fn seed(&self, configuration: Configuration) {
        self.storage.lock().unwrap().push(configuration);
    }

    /// Gets all stored configurations.
    pub fn get_all(&self) -> Vec<Configuration> {
        self.storage.lock().unwrap().clone()
    }
}

impl Default for MockConfigurationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigurationRepository for MockConfigurationRepository {
    async fn health_check(&self) -> Result<(), AppError> {
        self.control.check_health()
    }

    async fn create(&self, data: &CreateConfigurationRequest) -> Result<Configuration, AppError> {
        self.control.record_call();
        self.control.check_should_fail()?;

        let mut configuration = Configuration::new(data.key.clone(), data.kind);
        configuration.value = data.value.clone();
        self.storage.lock().unwrap().push(configuration.clone());
        Ok(configuration)
    }

    async fn list(&self, filter: &ConfigurationFilter) -> Result<Vec<Configuration>, AppError> {
        self.control.record_list();
        self.control.check_should_fail()?;

        let rows: Vec<Configuration> = self
            .storage
            .lock()
            .unwrap()
            .iter()
            .filter(|c| filter.id_eq.is_none_or(|id| c.id == id))
            .filter(|c| filter.matches_key(&c.key))
            .cloned()
            .collect();

        Ok(paginate(rows, &filter.page, compare_configurations))
    }

    async fn update(
        &self,
        configuration: &Configuration,
        changes: &UpdateConfigurationRequest,
    ) -> Result<Configuration, AppError> {
        self.control.record_call();
        self.control.check_should_fail()?;

        let mut storage = self.storage.lock().unwrap();
        let existing = storage
            .iter_mut()
            .find(|c| c.id == configuration.id)
            .ok_or_else(|| missing("Configuration", configuration.id))?;

        *existing = existing.merged(changes);
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn delete(&self, configuration: &Configuration) -> Result<(), AppError> {
        self.control.record_call();
        self.control.check_should_fail()?;

        let mut storage = self.storage.lock().unwrap();
        let before = storage.len();
        storage.retain(|c| c.id != configuration.id);
        if storage.len() == before {
            return Err(missing("Configuration", configuration.id));
        }
        Ok(())
    }
}
