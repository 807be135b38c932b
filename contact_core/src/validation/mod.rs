//! Field validation and sanitization for the site's forms

pub mod rules;
pub mod sanitize;
pub mod validators;

pub use rules::*;
pub use sanitize::*;
pub use validators::*;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::{Validate, ValidationError, ValidationErrors};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: HashMap<String, Vec<String>>,
}

pub fn error_message(error: &ValidationError) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None => format!("Validation failed: {}", error.code),
    }
}

impl ValidationResult {
    pub fn success() -> Self {
        Self {
            is_valid: true,
            errors: HashMap::new(),
        }
    }

    pub fn from_validation_errors(errors: ValidationErrors) -> Self {
        let mut result = Self::success();

        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                result.add_error(&field.to_string(), &error_message(error));
            }
        }

        result
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.is_valid = false;
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn first_error(&self, field: &str) -> Option<&str> {
        self.errors
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.is_valid {
            self.is_valid = false;
        }

        for (field, errors) in other.errors {
            self.errors.entry(field).or_default().extend(errors);
        }
    }
}

pub trait Validatable {
    fn validate_comprehensive(&self) -> ValidationResult;
}

impl<T> Validatable for T
where
    T: Validate,
{
    fn validate_comprehensive(&self) -> ValidationResult {
        match self.validate() {
            Ok(_) => ValidationResult::success(),
            Err(errors) => ValidationResult::from_validation_errors(errors),
        }
    }
}

pub type Rule = fn(&str) -> Result<(), ValidationError>;

/// Ordered rules checked against the trimmed raw value, followed by the
/// sanitizer that produces the stored value. Only the first failing rule is
/// reported for a field.
pub struct FieldPipeline {
    pub field: &'static str,
    pub rules: &'static [Rule],
    pub sanitizer: fn(&str) -> String,
}

impl FieldPipeline {
    pub fn run(&self, raw: &str) -> Result<String, ValidationError> {
        let trimmed = raw.trim();
        for rule in self.rules {
            rule(trimmed)?;
        }
        Ok((self.sanitizer)(raw))
    }

    /// Records a failure in `result` instead of returning it.
    pub fn apply(&self, raw: &str, result: &mut ValidationResult) -> Option<String> {
        match self.run(raw) {
            Ok(value) => Some(value),
            Err(error) => {
                result.add_error(self.field, &error_message(&error));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_checks_before_sanitizing() {
        let pipeline = NAME_PIPELINE;

        assert_eq!(pipeline.run("  O'Hara ").unwrap(), "O&#x27;Hara");
        assert!(pipeline.run("<script>").is_err());
    }

    #[test]
    fn test_first_rule_failure_wins() {
        let pipeline = NAME_PIPELINE;

        let mut result = ValidationResult::success();
        assert!(pipeline.apply("1", &mut result).is_none());
        assert!(!result.is_valid);
        assert_eq!(result.errors["name"].len(), 1);
        assert_eq!(result.first_error("name"), Some("Name must be at least 2 characters"));
    }

    #[test]
    fn test_merge_combines_fields() {
        let mut left = ValidationResult::success();
        left.add_error("name", "bad name");

        let mut right = ValidationResult::success();
        right.add_error("email", "bad email");

        left.merge(right);
        assert!(!left.is_valid);
        assert!(left.has_error("name"));
        assert!(left.has_error("email"));
    }
}
