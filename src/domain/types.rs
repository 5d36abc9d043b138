use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Identifier shared by every persisted entity.
pub type EntityId = Uuid;

/// Feature map carried by a [`Property`], keyed by configuration key.
pub type FeatureMap = HashMap<String, FeatureValue>;

/// Value kind of a [`Configuration`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ConfigurationType {
    Select,
    Text,
    Number,
}

impl ConfigurationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigurationType::Select => "select",
            ConfigurationType::Text => "text",
            ConfigurationType::Number => "number",
        }
    }
}

impl fmt::Display for ConfigurationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigurationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "select" => Ok(ConfigurationType::Select),
            "text" => Ok(ConfigurationType::Text),
            "number" => Ok(ConfigurationType::Number),
            other => Err(format!("unknown configuration type '{other}'")),
        }
    }
}

/// A rule describing one recognized attribute key.
///
/// `value` lists the allowed values and is only meaningful for
/// [`ConfigurationType::Select`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Configuration {
    pub id: EntityId,
    pub key: String,
    #[serde(rename = "type")]
    pub kind: ConfigurationType,
    pub value: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Configuration {
    pub fn new(key: impl Into<String>, kind: ConfigurationType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            key: key.into(),
            kind,
            value: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_value<I, S>(mut self, value: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value = Some(value.into_iter().map(Into::into).collect());
        self
    }

    /// Returns a copy with every field supplied in `changes` applied.
    #[must_use]
    pub fn merged(&self, changes: &UpdateConfigurationRequest) -> Self {
        let mut merged = self.clone();
        if let Some(key) = &changes.key {
            merged.key = key.clone();
        }
        if let Some(kind) = changes.kind {
            merged.kind = kind;
        }
        if let Some(value) = &changes.value {
            merged.value = value.clone();
        }
        merged
    }
}

/// Read access to the fields the configuration shape rule inspects.
pub trait ConfigurationShape {
    fn key(&self) -> &str;
    fn kind(&self) -> ConfigurationType;
    fn value(&self) -> Option<&[String]>;
}

impl ConfigurationShape for Configuration {
    fn key(&self) -> &str {
        &self.key
    }

    fn kind(&self) -> ConfigurationType {
        self.kind
    }

    fn value(&self) -> Option<&[String]> {
        self.value.as_deref()
    }
}

/// A single additional-feature value.
///
/// JSON integers decode to `Integer`, or `Unsigned` above `i64::MAX`;
/// numbers with a fraction or exponent decode to `Float`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FeatureValue {
    Null,
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    String(String),
}

impl FeatureValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FeatureValue::Null)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, FeatureValue::Integer(_) | FeatureValue::Unsigned(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FeatureValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Null => f.write_str("null"),
            FeatureValue::Integer(n) => write!(f, "{n}"),
            FeatureValue::Unsigned(n) => write!(f, "{n}"),
            FeatureValue::Float(n) => write!(f, "{n}"),
            FeatureValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FeatureValue {
    fn from(s: &str) -> Self {
        FeatureValue::String(s.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(s: String) -> Self {
        FeatureValue::String(s)
    }
}

impl From<i64> for FeatureValue {
    fn from(n: i64) -> Self {
        FeatureValue::Integer(n)
    }
}

impl From<u64> for FeatureValue {
    fn from(n: u64) -> Self {
        FeatureValue::Unsigned(n)
    }
}

impl From<f64> for FeatureValue {
    fn from(n: f64) -> Self {
        FeatureValue::Float(n)
    }
}

/// Address and coordinates embedded in a [`Property`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct Location {
    #[validate(length(min = 1, message = "Address must not be empty"))]
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Location {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            latitude: None,
            longitude: None,
        }
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }
}

/// A real-estate listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Property {
    pub id: EntityId,
    pub property_type: String,
    pub room_count: i32,
    pub bathroom_count: i32,
    pub additional_features: FeatureMap,
    pub location: Location,
    pub rent_value: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Property {
    /// Builds a new listing from a create request with a fresh identity.
    pub fn from_request(request: &CreatePropertyRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            property_type: request.property_type.clone(),
            room_count: request.room_count,
            bathroom_count: request.bathroom_count,
            additional_features: request.additional_features.clone(),
            location: request.location.clone(),
            rent_value: request.rent_value,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the supplied fields of `changes`, leaving the rest untouched.
    pub fn apply(&mut self, changes: &UpdatePropertyRequest) {
        if let Some(property_type) = &changes.property_type {
            self.property_type = property_type.clone();
        }
        if let Some(room_count) = changes.room_count {
            self.room_count = room_count;
        }
        if let Some(bathroom_count) = changes.bathroom_count {
            self.bathroom_count = bathroom_count;
        }
        if let Some(features) = &changes.additional_features {
            self.additional_features = features.clone();
        }
        if let Some(location) = &changes.location {
            self.location = location.clone();
        }
        if let Some(rent_value) = changes.rent_value {
            self.rent_value = rent_value;
        }
        self.updated_at = Utc::now();
    }
}

/// Request payload for creating a configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateConfigurationRequest {
    #[validate(length(min = 1, message = "Key must not be empty"))]
    pub key: String,
    #[serde(rename = "type")]
    pub kind: ConfigurationType,
    #[serde(default)]
    pub value: Option<Vec<String>>,
}

impl CreateConfigurationRequest {
    pub fn new(key: impl Into<String>, kind: ConfigurationType) -> Self {
        Self {
            key: key.into(),
            kind,
            value: None,
        }
    }

    pub fn with_value<I, S>(mut self, value: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value = Some(value.into_iter().map(Into::into).collect());
        self
    }
}

impl ConfigurationShape for CreateConfigurationRequest {
    fn key(&self) -> &str {
        &self.key
    }

    fn kind(&self) -> ConfigurationType {
        self.kind
    }

    fn value(&self) -> Option<&[String]> {
        self.value.as_deref()
    }
}

/// Partial update of a configuration.
///
/// `value` distinguishes an omitted field (`None`) from an explicit
/// `null` (`Some(None)`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateConfigurationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Key must not be empty"))]
    pub key: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ConfigurationType>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Option<Vec<String>>>,
}

/// Marks a field as present even when its JSON value is `null`.
fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Request payload for creating a property.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePropertyRequest {
    #[validate(length(min = 1, message = "Property type must not be empty"))]
    pub property_type: String,
    #[validate(range(min = 0, message = "Room count must not be negative"))]
    pub room_count: i32,
    #[validate(range(min = 0, message = "Bathroom count must not be negative"))]
    pub bathroom_count: i32,
    #[serde(default)]
    pub additional_features: FeatureMap,
    #[validate(nested)]
    pub location: Location,
    #[validate(range(min = 0.0, message = "Rent value must not be negative"))]
    pub rent_value: f64,
}

impl CreatePropertyRequest {
    pub fn new(property_type: impl Into<String>, location: Location, rent_value: f64) -> Self {
        Self {
            property_type: property_type.into(),
            room_count: 0,
            bathroom_count: 0,
            additional_features: FeatureMap::new(),
            location,
            rent_value,
        }
    }

    pub fn with_rooms(mut self, room_count: i32, bathroom_count: i32) -> Self {
        self.room_count = room_count;
        self.bathroom_count = bathroom_count;
        self
    }

    pub fn with_feature(mut self, key: impl Into<String>, value: impl Into<FeatureValue>) -> Self {
        self.additional_features.insert(key.into(), value.into());
        self
    }
}

/// Partial update of a property; only supplied fields are validated and written.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePropertyRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Property type must not be empty"))]
    pub property_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, message = "Room count must not be negative"))]
    pub room_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, message = "Bathroom count must not be negative"))]
    pub bathroom_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_features: Option<FeatureMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Rent value must not be negative"))]
    pub rent_value: Option<f64>,
}

/// Health check status for services.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Health check response for the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub database: HealthStatus,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn new(database: HealthStatus) -> Self {
        Self {
            status: database,
            database,
            timestamp: Utc::now(),
        }
    }
}

/// Error body returned by the HTTP layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub r#type: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_type_round_trips_through_str() {
        for kind in [
            ConfigurationType::Select,
            ConfigurationType::Text,
            ConfigurationType::Number,
        ] {
            assert_eq!(kind.as_str().parse::<ConfigurationType>(), Ok(kind));
        }
        assert!("SELECT".parse::<ConfigurationType>().is_err());
    }

    #[test]
    fn test_configuration_serializes_type_field() {
        let config =
            Configuration::new("parking", ConfigurationType::Select).with_value(["yes", "no"]);
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["type"], "select");
        assert_eq!(json["value"], serde_json::json!(["yes", "no"]));
    }

    #[test]
    fn test_feature_value_decoding() {
        let features: FeatureMap = serde_json::from_str(
            r#"{"a": null, "b": 3, "c": 3.5, "d": "yes", "e": -7}"#,
        )
        .unwrap();

        assert_eq!(features["a"], FeatureValue::Null);
        assert_eq!(features["b"], FeatureValue::Integer(3));
        assert_eq!(features["c"], FeatureValue::Float(3.5));
        assert_eq!(features["d"], FeatureValue::String("yes".to_string()));
        assert_eq!(features["e"], FeatureValue::Integer(-7));
    }

    #[test]
    fn test_feature_value_keeps_large_integers_exact() {
        let features: FeatureMap = serde_json::from_str(
            r#"{"floor": 9223372036854775808, "max": 18446744073709551615}"#,
        )
        .unwrap();

        assert_eq!(
            features["floor"],
            FeatureValue::Unsigned(9_223_372_036_854_775_808)
        );
        assert_eq!(features["max"], FeatureValue::Unsigned(u64::MAX));
        assert!(features["floor"].is_integer());
        assert_eq!(
            serde_json::to_string(&features["floor"]).unwrap(),
            "9223372036854775808"
        );
    }

    #[test]
    fn test_feature_value_rejects_other_shapes() {
        assert!(serde_json::from_str::<FeatureValue>("true").is_err());
        assert!(serde_json::from_str::<FeatureValue>("[1, 2]").is_err());
        assert!(serde_json::from_str::<FeatureValue>(r#"{"x": 1}"#).is_err());
    }

    #[test]
    fn test_feature_value_display() {
        assert_eq!(FeatureValue::Null.to_string(), "null");
        assert_eq!(FeatureValue::Integer(4).to_string(), "4");
        assert_eq!(FeatureValue::from("maybe").to_string(), "maybe");
    }

    #[test]
    fn test_update_configuration_request_value_states() {
        let omitted: UpdateConfigurationRequest = serde_json::from_str(r#"{"key": "k"}"#).unwrap();
        assert_eq!(omitted.value, None);

        let cleared: UpdateConfigurationRequest =
            serde_json::from_str(r#"{"value": null}"#).unwrap();
        assert_eq!(cleared.value, Some(None));

        let replaced: UpdateConfigurationRequest =
            serde_json::from_str(r#"{"value": ["a"]}"#).unwrap();
        assert_eq!(replaced.value, Some(Some(vec!["a".to_string()])));
    }

    #[test]
    fn test_configuration_merge_keeps_unset_fields() {
        let config =
            Configuration::new("parking", ConfigurationType::Select).with_value(["yes", "no"]);
        let changes = UpdateConfigurationRequest {
            kind: Some(ConfigurationType::Number),
            ..Default::default()
        };

        let merged = config.merged(&changes);

        assert_eq!(merged.id, config.id);
        assert_eq!(merged.key, "parking");
        assert_eq!(merged.kind, ConfigurationType::Number);
        assert_eq!(merged.value, Some(vec!["yes".to_string(), "no".to_string()]));
    }

    #[test]
    fn test_configuration_merge_clears_value() {
        let config = Configuration::new("parking", ConfigurationType::Select).with_value(["yes"]);
        let changes = UpdateConfigurationRequest {
            kind: Some(ConfigurationType::Text),
            value: Some(None),
            ..Default::default()
        };

        let merged = config.merged(&changes);
        assert!(merged.value.is_none());
    }

    #[test]
    fn test_property_apply_partial_update() {
        let request = CreatePropertyRequest::new("house", Location::new("Main St 1"), 1200.0)
            .with_rooms(3, 1)
            .with_feature("parking", "yes");
        let mut property = Property::from_request(&request);

        property.apply(&UpdatePropertyRequest {
            room_count: Some(4),
            ..Default::default()
        });

        assert_eq!(property.room_count, 4);
        assert_eq!(property.bathroom_count, 1);
        assert_eq!(property.property_type, "house");
        assert_eq!(property.additional_features.len(), 1);
    }

    #[test]
    fn test_create_property_request_validation() {
        let valid = CreatePropertyRequest::new("house", Location::new("Main St 1"), 0.0);
        assert!(valid.validate().is_ok());

        let negative_rent = CreatePropertyRequest::new("house", Location::new("Main St 1"), -1.0);
        assert!(negative_rent.validate().is_err());

        let empty_address = CreatePropertyRequest::new("house", Location::new(""), 10.0);
        assert!(empty_address.validate().is_err());

        let negative_rooms =
            CreatePropertyRequest::new("house", Location::new("Main St 1"), 10.0).with_rooms(-1, 0);
        assert!(negative_rooms.validate().is_err());
    }

    #[test]
    fn test_create_property_request_defaults_features() {
        let request: CreatePropertyRequest = serde_json::from_str(
            r#"{
                "property_type": "house",
                "room_count": 1,
                "bathroom_count": 1,
                "location": {"address": "Main St 1"},
                "rent_value": 10.0
            }"#,
        )
        .unwrap();

        assert!(request.additional_features.is_empty());
        assert!(request.location.latitude.is_none());
    }

    #[test]
    fn test_update_property_request_validation() {
        let empty = UpdatePropertyRequest::default();
        assert!(empty.validate().is_ok());

        let bad = UpdatePropertyRequest {
            bathroom_count: Some(-2),
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let bad_location = UpdatePropertyRequest {
            location: Some(Location::new("")),
            ..Default::default()
        };
        assert!(bad_location.validate().is_err());
    }

    #[test]
    fn test_health_response_follows_database() {
        assert_eq!(
            HealthResponse::new(HealthStatus::Healthy).status,
            HealthStatus::Healthy
        );
        assert_eq!(
            HealthResponse::new(HealthStatus::Unhealthy).status,
            HealthStatus::Unhealthy
        );
    }
}
