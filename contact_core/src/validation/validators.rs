//! Validators for the contact and newsletter forms

use super::{rules::*, sanitize::*, FieldPipeline, Validatable, ValidationResult};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const NAME_PIPELINE: FieldPipeline = FieldPipeline {
    field: "name",
    rules: &[validate_name_length, validate_name_characters],
    sanitizer: sanitize_text,
};

pub const EMAIL_PIPELINE: FieldPipeline = FieldPipeline {
    field: "email",
    rules: &[
        validate_email_present,
        validate_email_length,
        validate_email_format,
        validate_no_plus_addressing,
    ],
    sanitizer: sanitize_email,
};

pub const MESSAGE_PIPELINE: FieldPipeline = FieldPipeline {
    field: "message",
    rules: &[validate_message_length, validate_no_links, validate_no_script_content],
    sanitizer: sanitize_message,
};

pub const REQUIRED_OTHER_SERVICE_PIPELINE: FieldPipeline = FieldPipeline {
    field: "otherService",
    rules: &[validate_other_service_required],
    sanitizer: sanitize_text,
};

pub const OPTIONAL_OTHER_SERVICE_PIPELINE: FieldPipeline = FieldPipeline {
    field: "otherService",
    rules: &[validate_other_service_max],
    sanitizer: sanitize_text,
};

/// Raw values as captured from the contact form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFields {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub services: Vec<String>,
    pub other_service: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// A contact request whose every field has been checked and sanitized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub services: Vec<String>,
    pub other_service: Option<String>,
    pub message: String,
}

impl ContactFields {
    /// Checks all fields and collects every failure before returning.
    pub fn validate(&self) -> Result<ContactSubmission, ValidationResult> {
        let mut result = ValidationResult::success();

        let name = NAME_PIPELINE.apply(&self.name, &mut result);
        let email = EMAIL_PIPELINE.apply(&self.email, &mut result);
        let services = self.validate_services(&mut result);
        let other_service = self.validate_other_service(&mut result);
        let message = MESSAGE_PIPELINE.apply(&self.message, &mut result);

        match (name, email, services, other_service, message) {
            (Some(name), Some(email), Some(services), Some(other_service), Some(message))
                if result.is_valid =>
            {
                Ok(ContactSubmission {
                    name,
                    email,
                    services,
                    other_service,
                    message,
                })
            }
            _ => Err(result),
        }
    }

    fn selects_other(&self) -> bool {
        self.services
            .iter()
            .any(|service| service.trim() == OTHER_SERVICE)
    }

    fn validate_services(&self, result: &mut ValidationResult) -> Option<Vec<String>> {
        if let Err(error) = validate_service_selection(&self.services) {
            result.add_error("services", &super::error_message(&error));
            return None;
        }

        let mut selected: Vec<String> = Vec::with_capacity(self.services.len());
        for service in &self.services {
            let service = sanitize_text(service);
            if !selected.contains(&service) {
                selected.push(service);
            }
        }

        Some(selected)
    }

    /// `Some(None)` means the field is valid and absent.
    fn validate_other_service(&self, result: &mut ValidationResult) -> Option<Option<String>> {
        let raw = self
            .other_service
            .as_deref()
            .filter(|value| !value.trim().is_empty());

        if self.selects_other() {
            let raw = raw.unwrap_or_default();
            return REQUIRED_OTHER_SERVICE_PIPELINE
                .apply(raw, result)
                .map(Some);
        }

        match raw {
            Some(raw) => OPTIONAL_OTHER_SERVICE_PIPELINE
                .apply(raw, result)
                .map(Some),
            None => Some(None),
        }
    }
}

impl ContactSubmission {
    /// Field list in transport order; `services` repeats once per entry.
    pub fn to_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("name".to_string(), self.name.clone()),
            ("email".to_string(), self.email.clone()),
        ];

        for service in &self.services {
            fields.push(("services".to_string(), service.clone()));
        }

        if let Some(other) = &self.other_service {
            fields.push(("otherService".to_string(), other.clone()));
        }

        fields.push(("message".to_string(), self.message.clone()));
        fields
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewsletterFields {
    #[serde(default)]
    #[validate(custom(function = "validate_contact_email"))]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsletterSignup {
    pub email: String,
}

impl NewsletterFields {
    pub fn check(&self) -> Result<NewsletterSignup, ValidationResult> {
        let result = self.validate_comprehensive();
        if !result.is_valid {
            return Err(result);
        }

        Ok(NewsletterSignup {
            email: sanitize_email(&self.email),
        })
    }
}

impl NewsletterSignup {
    pub fn to_fields(&self) -> Vec<(String, String)> {
        vec![("email".to_string(), self.email.clone())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_fields() -> ContactFields {
        ContactFields {
            name: "Jane Doe".to_string(),
            email: "JANE@Example.com".to_string(),
            services: vec!["research".to_string()],
            other_service: None,
            message: "Interested in AI policy research for our agency.".to_string(),
        }
    }

    #[test]
    fn test_valid_submission_is_sanitized() {
        let submission = valid_fields().validate().unwrap();

        assert_eq!(submission.name, "Jane Doe");
        assert_eq!(submission.email, "jane@example.com");
        assert_eq!(submission.services, vec!["research".to_string()]);
        assert_eq!(submission.other_service, None);
        assert_eq!(submission.message, "Interested in AI policy research for our agency.");
    }

    #[test]
    fn test_name_length_and_whitespace() {
        let mut fields = valid_fields();
        fields.name = "A".to_string();
        let result = fields.validate().unwrap_err();
        assert_eq!(result.first_error("name"), Some("Name must be at least 2 characters"));

        fields.name = "  ".to_string();
        let result = fields.validate().unwrap_err();
        assert!(result.has_error("name"));
    }

    #[test]
    fn test_plus_addressing_is_rejected() {
        let fields = ContactFields {
            name: "Bob".to_string(),
            email: "bob+test@example.com".to_string(),
            services: vec!["research".to_string()],
            other_service: None,
            message: "1234567890".to_string(),
        };

        let result = fields.validate().unwrap_err();
        assert_eq!(result.errors.len(), 1);
        assert!(result.has_error("email"));
    }

    #[test]
    fn test_service_selection_rules() {
        let mut fields = valid_fields();
        fields.services = vec![];
        let result = fields.validate().unwrap_err();
        assert_eq!(result.first_error("services"), Some("Please select at least one service"));

        fields.services = vec!["other".to_string()];
        let result = fields.validate().unwrap_err();
        assert!(result.has_error("otherService"));

        fields.other_service = Some("ab".to_string());
        let result = fields.validate().unwrap_err();
        assert_eq!(
            result.first_error("otherService"),
            Some("Please provide at least 3 characters")
        );

        fields.other_service = Some("Board training".to_string());
        let submission = fields.validate().unwrap();
        assert_eq!(submission.other_service.as_deref(), Some("Board training"));
    }

    #[test]
    fn test_services_are_deduplicated() {
        let mut fields = valid_fields();
        fields.services = vec![
            "research".to_string(),
            "policy".to_string(),
            "research".to_string(),
        ];

        let submission = fields.validate().unwrap();
        assert_eq!(submission.services, vec!["research".to_string(), "policy".to_string()]);
    }

    #[test]
    fn test_optional_other_service_is_bounded() {
        let mut fields = valid_fields();
        fields.other_service = Some("x".repeat(201));
        let result = fields.validate().unwrap_err();
        assert!(result.has_error("otherService"));

        fields.other_service = Some("   ".to_string());
        assert_eq!(fields.validate().unwrap().other_service, None);
    }

    #[test]
    fn test_all_field_errors_are_collected() {
        let fields = ContactFields {
            name: "1".to_string(),
            email: "nope".to_string(),
            services: vec![],
            other_service: None,
            message: "short".to_string(),
        };

        let result = fields.validate().unwrap_err();
        for field in ["name", "email", "services", "message"] {
            assert!(result.has_error(field), "missing error for {}", field);
        }
    }

    #[test]
    fn test_message_refinements() {
        let mut fields = valid_fields();
        fields.message = "Please visit https://example.com for details".to_string();
        assert_eq!(
            fields.validate().unwrap_err().first_error("message"),
            Some("Links are not allowed in messages")
        );

        fields.message = "<script>alert('hello world')</script>".to_string();
        assert!(fields.validate().unwrap_err().has_error("message"));
    }

    #[test]
    fn test_transport_fields_repeat_services() {
        let mut fields = valid_fields();
        fields.services = vec!["research".to_string(), "other".to_string()];
        fields.other_service = Some("Workshops".to_string());

        let names: Vec<String> = fields
            .validate()
            .unwrap()
            .to_fields()
            .into_iter()
            .map(|(name, _)| name)
            .collect();

        assert_eq!(
            names,
            vec!["name", "email", "services", "services", "otherService", "message"]
        );
    }

    #[test]
    fn test_newsletter_fields() {
        let signup = NewsletterFields {
            email: " Reader@Example.com ".to_string(),
        }
        .check()
        .unwrap();
        assert_eq!(signup.email, "reader@example.com");

        let result = NewsletterFields {
            email: "reader+news@example.com".to_string(),
        }
        .check()
        .unwrap_err();
        assert!(result.has_error("email"));
    }
}
