// src/config/schema_validator.rs
//! Configuration schema validation

use crate::config::constants::*;
use std::collections::BTreeMap;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub value: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Validation error for '{}': {} (value: {})", self.field, self.message, self.value)
    }
}

impl std::error::Error for ValidationError {}

/// Schema validator for configuration
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    constraints: BTreeMap<String, FieldConstraint>,
}

/// Field validation constraints
#[derive(Debug, Clone)]
pub enum FieldConstraint {
    IntRange { min: i64, max: i64 },
    OneOf(Vec<String>),
    MinLength(usize),
}

impl SchemaValidator {
    /// Create new schema validator with default constraints
    pub fn new() -> Self {
        let mut constraints = BTreeMap::new();

        constraints.insert("acquisition.ingestion_capacity_chunks".to_string(),
                           FieldConstraint::IntRange {
                               min: acquisition::MIN_INGESTION_CAPACITY_CHUNKS as i64,
                               max: acquisition::MAX_INGESTION_CAPACITY_CHUNKS as i64,
                           });

        constraints.insert("acquisition.channel_capacity_chunks".to_string(),
                           FieldConstraint::IntRange {
                               min: acquisition::MIN_CHANNEL_CAPACITY_CHUNKS as i64,
                               max: acquisition::MAX_CHANNEL_CAPACITY_CHUNKS as i64,
                           });

        constraints.insert("serial.read_buffer_size".to_string(),
                           FieldConstraint::IntRange {
                               min: hal::MIN_READ_BUFFER_SIZE as i64,
                               max: hal::MAX_READ_BUFFER_SIZE as i64,
                           });

        constraints.insert("serial.read_timeout_ms".to_string(),
                           FieldConstraint::IntRange {
                               min: hal::MIN_READ_TIMEOUT_MS as i64,
                               max: hal::MAX_READ_TIMEOUT_MS as i64,
                           });

        constraints.insert("serial.port_name".to_string(), FieldConstraint::MinLength(1));

        constraints.insert("logging.level".to_string(),
                           FieldConstraint::OneOf(
                               logging::LEVELS.iter().map(|s| s.to_string()).collect()
                           ));

        Self { constraints }
    }

    /// Whether `field` (dotted path) only accepts strings
    pub fn expects_string(&self, field: &str) -> bool {
        matches!(
            self.constraints.get(field),
            Some(FieldConstraint::OneOf(_) | FieldConstraint::MinLength(_))
        )
    }

    /// Validate a merged TOML document. Missing fields are not errors,
    /// serde defaults fill them in.
    pub fn validate_config(&self, config: &toml::Value) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = self
            .constraints
            .iter()
            .filter_map(|(field, constraint)| {
                lookup(config, field).and_then(|value| check(field, constraint, value))
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn lookup<'a>(config: &'a toml::Value, path: &str) -> Option<&'a toml::Value> {
    path.split('.').try_fold(config, |current, part| current.get(part))
}

fn check(field: &str, constraint: &FieldConstraint, value: &toml::Value) -> Option<ValidationError> {
    let error = |message: String| ValidationError {
        field: field.to_string(),
        message,
        value: value.to_string(),
    };

    match constraint {
        FieldConstraint::IntRange { min, max } => match value.as_integer() {
            Some(v) if (*min..=*max).contains(&v) => None,
            Some(_) => Some(error(format!("must be between {} and {}", min, max))),
            None => Some(error("must be an integer".to_string())),
        },
        FieldConstraint::OneOf(allowed) => match value.as_str() {
            Some(v) if allowed.iter().any(|a| a == v) => None,
            _ => Some(error(format!("must be one of {:?}", allowed))),
        },
        FieldConstraint::MinLength(len) => match value.as_str() {
            Some(v) if v.len() >= *len => None,
            Some(_) => Some(error(format!("must be at least {} characters", len))),
            None => Some(error("must be a string".to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_expects_string() {
        let validator = SchemaValidator::new();
        assert!(validator.expects_string("serial.port_name"));
        assert!(validator.expects_string("logging.level"));
        assert!(!validator.expects_string("serial.read_timeout_ms"));
        assert!(!validator.expects_string("serial.unknown"));
    }

    #[test]
    fn test_empty_document_is_valid() {
        let validator = SchemaValidator::new();
        assert!(validator.validate_config(&parse("")).is_ok());
    }

    #[test]
    fn test_out_of_range_values() {
        let validator = SchemaValidator::new();
        let config = parse(
            r#"
[acquisition]
ingestion_capacity_chunks = 0

[serial]
read_timeout_ms = 5000
"#,
        );

        let errors = validator.validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.field == "acquisition.ingestion_capacity_chunks"));
        assert!(errors.iter().any(|e| e.field == "serial.read_timeout_ms"));
    }

    #[test]
    fn test_wrong_types_and_levels() {
        let validator = SchemaValidator::new();
        let config = parse(
            r#"
[serial]
read_buffer_size = "large"
port_name = ""

[logging]
level = "verbose"
"#,
        );

        let errors = validator.validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        let level = errors.iter().find(|e| e.field == "logging.level").unwrap();
        assert!(level.to_string().contains("verbose"));
    }
}
