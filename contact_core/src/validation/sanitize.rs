//! Input sanitizers for contact and newsletter fields.
//!
//! Every sanitizer is a pure, total function and applying it twice gives the
//! same result as applying it once. Entity encoding runs before any pattern
//! removal, so the removal patterns below match the encoded tag forms.

use lazy_static::lazy_static;
use regex::Regex;

/// Replacement text for links found in free-text messages.
pub const LINK_REMOVED_MARKER: &str = "[LINK REMOVED]";

const KNOWN_ENTITIES: [&str; 5] = ["&amp;", "&lt;", "&gt;", "&quot;", "&#x27;"];

lazy_static! {
    static ref SCRIPT_BLOCK: Regex =
        Regex::new(r"(?is)&lt;\s*script\b.*?&lt;\s*/\s*script\s*&gt;").unwrap();

    static ref JAVASCRIPT_SCHEME: Regex = Regex::new(r"(?i)javascript\s*:").unwrap();

    static ref EVENT_HANDLER: Regex = Regex::new(r"(?i)on\w+\s*=").unwrap();

    static ref EMBEDDED_ELEMENTS: Vec<Regex> = vec![
        Regex::new(r"(?is)&lt;\s*iframe\b.*?&lt;\s*/\s*iframe\s*&gt;").unwrap(),
        Regex::new(r"(?is)&lt;\s*iframe\b.*?&gt;").unwrap(),
        Regex::new(r"(?is)&lt;\s*object\b.*?&lt;\s*/\s*object\s*&gt;").unwrap(),
        Regex::new(r"(?is)&lt;\s*object\b.*?&gt;").unwrap(),
        Regex::new(r"(?is)&lt;\s*embed\b.*?&lt;\s*/\s*embed\s*&gt;").unwrap(),
        Regex::new(r"(?is)&lt;\s*embed\b.*?&gt;").unwrap(),
    ];

    static ref DANGEROUS_SCHEMES: Regex = Regex::new(r"(?i)(?:data|vbscript|file)\s*:").unwrap();

    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();

    static ref EMAIL_DISALLOWED: Regex = Regex::new(r"[^a-zA-Z0-9_@.\-]").unwrap();

    static ref LINK: Regex = Regex::new(r"(?i)https?://\S*").unwrap();

    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}')
}

pub fn strip_control_chars(input: &str) -> String {
    input.chars().filter(|c| !is_stripped_control(*c)).collect()
}

/// Encodes `& < > " '`. An ampersand that already starts one of the entities
/// produced here is kept as is.
pub fn encode_html_entities(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());

    for (index, c) in input.char_indices() {
        match c {
            '&' => {
                let rest = &input[index..];
                if KNOWN_ENTITIES.iter().any(|entity| rest.starts_with(entity)) {
                    encoded.push('&');
                } else {
                    encoded.push_str("&amp;");
                }
            }
            '<' => encoded.push_str("&lt;"),
            '>' => encoded.push_str("&gt;"),
            '"' => encoded.push_str("&quot;"),
            '\'' => encoded.push_str("&#x27;"),
            other => encoded.push(other),
        }
    }

    encoded
}

fn remove_dangerous_patterns(input: &str) -> String {
    let mut text = SCRIPT_BLOCK.replace_all(input, "").into_owned();
    text = JAVASCRIPT_SCHEME.replace_all(&text, "").into_owned();
    text = EVENT_HANDLER.replace_all(&text, "").into_owned();
    for pattern in EMBEDDED_ELEMENTS.iter() {
        text = pattern.replace_all(&text, "").into_owned();
    }
    DANGEROUS_SCHEMES.replace_all(&text, "").into_owned()
}

/// General-purpose sanitizer for names and short free-text fields.
pub fn sanitize_text(input: &str) -> String {
    let stripped = strip_control_chars(input.trim());
    let mut text = encode_html_entities(&stripped);

    // A removal can splice a new match together, e.g. "javajavascript:script:".
    loop {
        let next = remove_dangerous_patterns(&text);
        if next == text {
            break;
        }
        text = next;
    }

    text.trim().to_string()
}

pub fn sanitize_email(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    let stripped = strip_control_chars(&lowered);
    let without_tags = HTML_TAG.replace_all(&stripped, "");
    let without_scheme = JAVASCRIPT_SCHEME.replace_all(&without_tags, "");
    let compact: String = without_scheme.chars().filter(|c| !c.is_whitespace()).collect();

    EMAIL_DISALLOWED.replace_all(&compact, "").into_owned()
}

pub fn sanitize_message(input: &str) -> String {
    let text = sanitize_text(input);
    let without_links = LINK.replace_all(&text, LINK_REMOVED_MARKER);

    WHITESPACE_RUN
        .replace_all(&without_links, " ")
        .trim()
        .to_string()
}
