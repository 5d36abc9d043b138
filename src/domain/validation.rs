//! Rules that decide whether configurations and properties are acceptable.
//!
//! Every function here is pure: callers resolve the relevant
//! [`Configuration`] records first and pass them in.

use super::error::{ConfigurationInvalid, FeatureValidationError, PropertyTypeInvalid};
use super::types::{Configuration, ConfigurationShape, ConfigurationType, FeatureMap, FeatureValue};

/// Only `SELECT` configurations may carry a list of allowed values.
///
/// A `SELECT` configuration without values is accepted.
pub fn validate_configuration<C>(configuration: &C) -> Result<(), ConfigurationInvalid>
where
    C: ConfigurationShape + ?Sized,
{
    if configuration.kind() != ConfigurationType::Select && configuration.value().is_some() {
        return Err(ConfigurationInvalid {
            key: configuration.key().to_string(),
            kind: configuration.kind(),
        });
    }
    Ok(())
}

/// A property type is valid when at least one configuration carries it as key.
///
/// `matches` must already be filtered by key; only its emptiness is checked.
pub fn validate_property_type(
    property_type: &str,
    matches: &[Configuration],
) -> Result<(), PropertyTypeInvalid> {
    if matches.is_empty() {
        return Err(PropertyTypeInvalid {
            property_type: property_type.to_string(),
        });
    }
    Ok(())
}

/// Checks a feature map against the configurations fetched for its keys.
///
/// The key count must equal the number of matched configurations. After
/// that, each configuration is checked in the given order and the first
/// mismatching value is reported.
pub fn validate_additional_features(
    features: &FeatureMap,
    matches: &[Configuration],
) -> Result<(), FeatureValidationError> {
    if features.len() != matches.len() {
        return Err(FeatureValidationError::AllFeaturesInvalid);
    }

    for configuration in matches {
        let value = features
            .get(&configuration.key)
            .unwrap_or(&FeatureValue::Null);

        if !accepts(configuration, value) {
            return Err(FeatureValidationError::InvalidFeatureValue {
                key: configuration.key.clone(),
                value: value.clone(),
            });
        }
    }

    Ok(())
}

fn accepts(configuration: &Configuration, value: &FeatureValue) -> bool {
    match configuration.kind {
        ConfigurationType::Select => {
            let allowed = configuration.value.as_deref().unwrap_or_default();
            value
                .as_str()
                .is_some_and(|v| allowed.iter().any(|candidate| candidate == v))
        }
        ConfigurationType::Number => value.is_integer(),
        // TEXT features carry no payload.
        ConfigurationType::Text => value.is_null(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::CreateConfigurationRequest;

    fn select(key: &str, values: &[&str]) -> Configuration {
        Configuration::new(key, ConfigurationType::Select).with_value(values.iter().copied())
    }

    fn features(pairs: &[(&str, FeatureValue)]) -> FeatureMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_configuration_non_select_with_value_fails() {
        for kind in [ConfigurationType::Text, ConfigurationType::Number] {
            let config = Configuration::new("k", kind).with_value(["a"]);
            let err = validate_configuration(&config).unwrap_err();
            assert_eq!(err.key, "k");
            assert_eq!(err.kind, kind);

            let empty = Configuration::new("k", kind).with_value(Vec::<String>::new());
            assert!(validate_configuration(&empty).is_err());
        }
    }

    #[test]
    fn test_configuration_non_select_without_value_passes() {
        for kind in [ConfigurationType::Text, ConfigurationType::Number] {
            assert!(validate_configuration(&Configuration::new("k", kind)).is_ok());
        }
    }

    #[test]
    fn test_configuration_select_passes_with_or_without_value() {
        assert!(validate_configuration(&select("parking", &["yes", "no"])).is_ok());
        assert!(
            validate_configuration(&Configuration::new("parking", ConfigurationType::Select))
                .is_ok()
        );
    }

    #[test]
    fn test_configuration_rule_applies_to_requests() {
        let request =
            CreateConfigurationRequest::new("floor", ConfigurationType::Number).with_value(["1"]);
        assert!(validate_configuration(&request).is_err());

        let request = CreateConfigurationRequest::new("floor", ConfigurationType::Number);
        assert!(validate_configuration(&request).is_ok());
    }

    #[test]
    fn test_property_type_requires_a_match() {
        let err = validate_property_type("house", &[]).unwrap_err();
        assert_eq!(err.property_type, "house");
    }

    #[test]
    fn test_property_type_checks_existence_only() {
        // The key of the match is not compared against the property type.
        let unrelated = Configuration::new("garden", ConfigurationType::Text);
        assert!(validate_property_type("house", &[unrelated]).is_ok());
    }

    #[test]
    fn test_features_without_matches_are_all_invalid() {
        let result = validate_additional_features(&features(&[("a", "x".into())]), &[]);
        assert_eq!(result, Err(FeatureValidationError::AllFeaturesInvalid));
    }

    #[test]
    fn test_features_extra_match_is_all_invalid() {
        let result = validate_additional_features(
            &features(&[("parking", "yes".into())]),
            &[select("parking", &["yes"]), select("parking", &["no"])],
        );
        assert_eq!(result, Err(FeatureValidationError::AllFeaturesInvalid));
    }

    #[test]
    fn test_empty_features_with_no_matches_pass() {
        assert!(validate_additional_features(&FeatureMap::new(), &[]).is_ok());
    }

    #[test]
    fn test_select_value_membership() {
        let matches = [select("parking", &["x", "y"])];

        let result = validate_additional_features(&features(&[("parking", "z".into())]), &matches);
        assert_eq!(
            result,
            Err(FeatureValidationError::InvalidFeatureValue {
                key: "parking".to_string(),
                value: FeatureValue::from("z"),
            })
        );

        assert!(
            validate_additional_features(&features(&[("parking", "x".into())]), &matches).is_ok()
        );
    }

    #[test]
    fn test_select_rejects_non_string_values() {
        let matches = [select("floors", &["3"])];
        let result = validate_additional_features(&features(&[("floors", 3i64.into())]), &matches);
        assert!(matches!(
            result,
            Err(FeatureValidationError::InvalidFeatureValue { .. })
        ));
    }

    #[test]
    fn test_select_without_allowed_values_rejects_everything() {
        let matches = [Configuration::new("parking", ConfigurationType::Select)];
        let result =
            validate_additional_features(&features(&[("parking", "yes".into())]), &matches);
        assert!(result.is_err());
    }

    #[test]
    fn test_number_requires_integer() {
        let matches = [Configuration::new("floor", ConfigurationType::Number)];

        for rejected in [
            FeatureValue::from("abc"),
            FeatureValue::Float(3.0),
            FeatureValue::Null,
        ] {
            let result =
                validate_additional_features(&features(&[("floor", rejected.clone())]), &matches);
            assert_eq!(
                result,
                Err(FeatureValidationError::InvalidFeatureValue {
                    key: "floor".to_string(),
                    value: rejected,
                })
            );
        }

        for accepted in [3i64.into(), (i64::MAX as u64 + 1).into()] {
            assert!(
                validate_additional_features(&features(&[("floor", accepted)]), &matches).is_ok()
            );
        }
    }

    #[test]
    fn test_text_forbids_any_value() {
        let matches = [Configuration::new("notes", ConfigurationType::Text)];

        let result =
            validate_additional_features(&features(&[("notes", "anything".into())]), &matches);
        assert!(matches!(
            result,
            Err(FeatureValidationError::InvalidFeatureValue { ref key, .. }) if key == "notes"
        ));

        assert!(
            validate_additional_features(&features(&[("notes", FeatureValue::Null)]), &matches)
                .is_ok()
        );
    }

    #[test]
    fn test_first_failure_in_match_order_wins() {
        let matches = [
            Configuration::new("floor", ConfigurationType::Number),
            select("parking", &["yes"]),
        ];
        let result = validate_additional_features(
            &features(&[("parking", "maybe".into()), ("floor", "high".into())]),
            &matches,
        );

        assert!(matches!(
            result,
            Err(FeatureValidationError::InvalidFeatureValue { ref key, .. }) if key == "floor"
        ));
    }

    #[test]
    fn test_mixed_features_pass() {
        let matches = [
            select("parking", &["yes", "no"]),
            Configuration::new("floor", ConfigurationType::Number),
            Configuration::new("notes", ConfigurationType::Text),
        ];
        let result = validate_additional_features(
            &features(&[
                ("parking", "no".into()),
                ("floor", 2i64.into()),
                ("notes", FeatureValue::Null),
            ]),
            &matches,
        );
        assert!(result.is_ok());
    }
}
