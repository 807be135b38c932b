//! Validation rules and custom validators

use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;
use validator::ValidationError;

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;
pub const EMAIL_MAX_CHARS: usize = 254;
pub const OTHER_SERVICE_MIN_CHARS: usize = 3;
pub const OTHER_SERVICE_MAX_CHARS: usize = 200;
pub const MESSAGE_MIN_CHARS: usize = 10;
pub const MESSAGE_MAX_CHARS: usize = 2000;
pub const MAX_SERVICES: usize = 10;

/// Selecting this service makes `otherService` mandatory.
pub const OTHER_SERVICE: &str = "other";

pub const SERVICE_CATALOG: &[&str] = &[
    "research",
    "strategy",
    "policy",
    "training",
    "implementation",
    "evaluation",
    OTHER_SERVICE,
];

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9._+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"
    ).unwrap();

    static ref NAME_REGEX: Regex = Regex::new(
        r"^[a-zA-Z\s\-'.]+$"
    ).unwrap();

    static ref LINK_REGEX: Regex = Regex::new(r"(?i)https?://").unwrap();

    static ref SCRIPT_CONTENT_REGEX: Regex = Regex::new(r"(?i)script").unwrap();
}

pub(crate) fn rule_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

pub fn validate_name_length(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();

    if len < NAME_MIN_CHARS {
        return Err(rule_error("name_length", "Name must be at least 2 characters"));
    }

    if len > NAME_MAX_CHARS {
        return Err(rule_error("name_length", "Name must be less than 100 characters"));
    }

    Ok(())
}

pub fn validate_name_characters(name: &str) -> Result<(), ValidationError> {
    if !NAME_REGEX.is_match(name) {
        return Err(rule_error(
            "name_characters",
            "Name can only contain letters, spaces, hyphens, apostrophes, and periods",
        ));
    }

    Ok(())
}

pub fn validate_email_present(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(rule_error("email_required", "Email is required"));
    }

    Ok(())
}

pub fn validate_email_length(email: &str) -> Result<(), ValidationError> {
    if email.chars().count() > EMAIL_MAX_CHARS {
        return Err(rule_error("email_length", "Email is too long"));
    }

    Ok(())
}

pub fn validate_email_format(email: &str) -> Result<(), ValidationError> {
    if !EMAIL_REGEX.is_match(email) {
        return Err(rule_error("email_format", "Please enter a valid email address"));
    }

    Ok(())
}

pub fn validate_no_plus_addressing(email: &str) -> Result<(), ValidationError> {
    if email.contains('+') {
        return Err(rule_error(
            "email_plus_addressing",
            "Email addresses containing '+' are not accepted",
        ));
    }

    Ok(())
}

/// Runs the e-mail rules in order and reports the first failure.
pub fn validate_contact_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    validate_email_present(email)?;
    validate_email_length(email)?;
    validate_email_format(email)?;
    validate_no_plus_addressing(email)
}

pub fn validate_message_length(message: &str) -> Result<(), ValidationError> {
    let len = message.chars().count();

    if len < MESSAGE_MIN_CHARS {
        return Err(rule_error("message_length", "Message must be at least 10 characters"));
    }

    if len > MESSAGE_MAX_CHARS {
        return Err(rule_error("message_length", "Message must be less than 2000 characters"));
    }

    Ok(())
}

pub fn validate_no_links(message: &str) -> Result<(), ValidationError> {
    if LINK_REGEX.is_match(message) {
        return Err(rule_error("message_links", "Links are not allowed in messages"));
    }

    Ok(())
}

/// Rejects `script` and therefore also `javascript`.
pub fn validate_no_script_content(message: &str) -> Result<(), ValidationError> {
    if SCRIPT_CONTENT_REGEX.is_match(message) {
        return Err(rule_error("message_content", "Message contains disallowed content"));
    }

    Ok(())
}

pub fn validate_service_selection(services: &[String]) -> Result<(), ValidationError> {
    if services.is_empty() {
        return Err(rule_error("services_required", "Please select at least one service"));
    }

    if services.len() > MAX_SERVICES {
        return Err(rule_error("services_count", "Too many services selected"));
    }

    if services
        .iter()
        .any(|service| !SERVICE_CATALOG.contains(&service.trim()))
    {
        return Err(rule_error("services_unknown", "Unknown service selected"));
    }

    Ok(())
}

pub fn validate_other_service_required(other: &str) -> Result<(), ValidationError> {
    if other.is_empty() {
        return Err(rule_error(
            "other_service_required",
            "Please describe the service you are interested in",
        ));
    }

    if other.chars().count() < OTHER_SERVICE_MIN_CHARS {
        return Err(rule_error(
            "other_service_length",
            "Please provide at least 3 characters",
        ));
    }

    validate_other_service_max(other)
}

pub fn validate_other_service_max(other: &str) -> Result<(), ValidationError> {
    if other.chars().count() > OTHER_SERVICE_MAX_CHARS {
        return Err(rule_error(
            "other_service_length",
            "Service description must be less than 200 characters",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_of(result: Result<(), ValidationError>) -> String {
        result
            .unwrap_err()
            .message
            .map(|m| m.to_string())
            .unwrap_or_default()
    }

    #[test]
    fn test_name_rules() {
        assert!(validate_name_length("Jo").is_ok());
        assert!(validate_name_length("A").is_err());
        assert!(validate_name_length(&"a".repeat(101)).is_err());
        assert!(validate_name_characters("Mary-Jane O'Neil Jr.").is_ok());
        assert!(validate_name_characters("R2D2").is_err());
        assert!(validate_name_characters("<b>").is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_contact_email("jane@example.com").is_ok());
        assert!(validate_contact_email("JANE@Example.com").is_ok());
        assert_eq!(message_of(validate_contact_email("")), "Email is required");
        assert_eq!(
            message_of(validate_contact_email("not-an-email")),
            "Please enter a valid email address"
        );
        assert_eq!(
            message_of(validate_contact_email("bob+test@example.com")),
            "Email addresses containing '+' are not accepted"
        );

        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(message_of(validate_contact_email(&long)), "Email is too long");
    }

    #[test]
    fn test_accepted_email_is_delivered_unchanged() {
        assert_eq!(
            message_of(validate_contact_email("a%b@example.com")),
            "Please enter a valid email address"
        );

        for email in ["jane.doe@example.com", "J_Smith-2@Sub.Example.org"] {
            assert!(validate_contact_email(email).is_ok());
            assert_eq!(crate::validation::sanitize_email(email), email.to_lowercase());
        }
    }

    #[test]
    fn test_message_rules() {
        assert!(validate_message_length("1234567890").is_ok());
        assert!(validate_message_length("123456789").is_err());
        assert!(validate_message_length(&"x".repeat(2001)).is_err());
        assert!(validate_no_links("read HTTPS://example.com").is_err());
        assert!(validate_no_links("plain words only").is_ok());
        assert!(validate_no_script_content("my JavaScript question").is_err());
        assert!(validate_no_script_content("a transcript of the call").is_err());
        assert!(validate_no_script_content("policy research").is_ok());
    }

    #[test]
    fn test_service_rules() {
        assert_eq!(
            message_of(validate_service_selection(&[])),
            "Please select at least one service"
        );
        assert!(validate_service_selection(&["research".to_string()]).is_ok());
        assert!(validate_service_selection(&["astrology".to_string()]).is_err());

        let many: Vec<String> = std::iter::repeat("research".to_string()).take(11).collect();
        assert_eq!(message_of(validate_service_selection(&many)), "Too many services selected");
    }

    #[test]
    fn test_other_service_rules() {
        assert!(validate_other_service_required("").is_err());
        assert!(validate_other_service_required("ab").is_err());
        assert!(validate_other_service_required("abc").is_ok());
        assert!(validate_other_service_max(&"x".repeat(200)).is_ok());
        assert!(validate_other_service_max(&"x".repeat(201)).is_err());
    }
}
