//! Transport payload shared by the primary and fallback delivery paths

use serde::Serialize;

pub const FORM_NAME_FIELD: &str = "form-name";

/// Hidden field left empty by people; the form backend uses it to spot bots.
pub const HONEYPOT_FIELD: &str = "bot-field";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormPayload {
    form_name: String,
    fields: Vec<(String, String)>,
}

impl FormPayload {
    pub fn new(form_name: &str, sanitized: Vec<(String, String)>) -> Self {
        let mut fields = Vec::with_capacity(sanitized.len() + 2);
        fields.push((FORM_NAME_FIELD.to_string(), form_name.to_string()));
        fields.extend(sanitized);
        fields.push((HONEYPOT_FIELD.to_string(), String::new()));

        Self {
            form_name: form_name.to_string(),
            fields,
        }
    }

    pub fn form_name(&self) -> &str {
        &self.form_name
    }

    /// Every field in wire order, including `form-name` and the honeypot.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn values(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values(name).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_frames_fields() {
        let payload = FormPayload::new(
            "contact",
            vec![
                ("name".to_string(), "Jane".to_string()),
                ("services".to_string(), "research".to_string()),
                ("services".to_string(), "policy".to_string()),
            ],
        );

        assert_eq!(payload.fields().first().unwrap().0, FORM_NAME_FIELD);
        assert_eq!(payload.value(FORM_NAME_FIELD), Some("contact"));
        assert_eq!(payload.value(HONEYPOT_FIELD), Some(""));
        assert_eq!(payload.values("services"), vec!["research", "policy"]);
        assert_eq!(payload.fields().len(), 5);
    }
}
