//! Native (full-page) form submission used when primary delivery fails

use super::payload::FormPayload;
use super::transport::TransportError;
use parking_lot::Mutex;

const FALLBACK_FORM_ID: &str = "contact-fallback-form";

/// A plain HTML form post carrying the same fields as the primary request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeFormPost {
    pub action: String,
    pub fields: Vec<(String, String)>,
}

impl NativeFormPost {
    pub fn from_payload(action: &str, payload: &FormPayload) -> Self {
        Self {
            action: action.to_string(),
            fields: payload.fields().to_vec(),
        }
    }

    /// A document that posts the form as soon as it loads.
    pub fn render_html(&self) -> String {
        let inputs: String = self
            .fields
            .iter()
            .map(|(name, value)| {
                format!(
                    "    <input type=\"hidden\" name=\"{}\" value=\"{}\">\n",
                    escape_attribute(name),
                    escape_attribute(value)
                )
            })
            .collect();

        format!(
            "<!DOCTYPE html>\n\
             <html lang=\"en\">\n\
             <head>\n  <meta charset=\"utf-8\">\n  <title>Sending your message</title>\n</head>\n\
             <body>\n\
             <form id=\"{id}\" method=\"POST\" action=\"{action}\">\n\
             {inputs}\
             \x20   <noscript><button type=\"submit\">Send</button></noscript>\n\
             </form>\n\
             <script>document.getElementById(\"{id}\").submit();</script>\n\
             </body>\n\
             </html>\n",
            id = FALLBACK_FORM_ID,
            action = escape_attribute(&self.action),
            inputs = inputs,
        )
    }
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Fire-and-forget: success here only means the post was handed off, not
/// that the backend accepted it.
pub trait FallbackSubmitter: Send + Sync {
    fn submit_native(&self, form: NativeFormPost) -> Result<(), TransportError>;
}

/// Keeps the rendered document so the HTTP layer can return it to the browser.
#[derive(Default)]
pub struct HtmlFormFallback {
    document: Mutex<Option<String>>,
}

impl HtmlFormFallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_document(&self) -> Option<String> {
        self.document.lock().take()
    }
}

impl FallbackSubmitter for HtmlFormFallback {
    fn submit_native(&self, form: NativeFormPost) -> Result<(), TransportError> {
        if form.action.trim().is_empty() {
            return Err(TransportError::Fallback("no form action configured".to_string()));
        }

        *self.document.lock() = Some(form.render_html());
        Ok(())
    }
}
