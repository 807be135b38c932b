use crate::validation::{ContactFields, NewsletterFields, ValidationResult};

pub const CONTACT_FORM_NAME: &str = "contact";
pub const NEWSLETTER_FORM_NAME: &str = "newsletter";

/// A form the orchestrator can validate, deliver and reset.
pub trait SubmissionForm: Send {
    fn form_name(&self) -> &'static str;

    /// Sanitized field list, or every field error found.
    fn sanitized_fields(&self) -> Result<Vec<(String, String)>, ValidationResult>;

    /// Resets the in-memory values after a successful delivery.
    fn clear(&mut self);
}

impl SubmissionForm for ContactFields {
    fn form_name(&self) -> &'static str {
        CONTACT_FORM_NAME
    }

    fn sanitized_fields(&self) -> Result<Vec<(String, String)>, ValidationResult> {
        Ok(self.validate()?.to_fields())
    }

    fn clear(&mut self) {
        *self = ContactFields::default();
    }
}

impl SubmissionForm for NewsletterFields {
    fn form_name(&self) -> &'static str {
        NEWSLETTER_FORM_NAME
    }

    fn sanitized_fields(&self) -> Result<Vec<(String, String)>, ValidationResult> {
        Ok(self.check()?.to_fields())
    }

    fn clear(&mut self) {
        *self = NewsletterFields::default();
    }
}
