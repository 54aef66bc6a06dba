use lazy_static::lazy_static;
use regex::Regex;

use crate::error::FormError;

lazy_static! {
    static ref UNSPECIFIED_SUFFIX: Regex = Regex::new(r"(?i)_UNSPECIFIED$").unwrap();
    static ref APP_ID_SEPARATOR:   Regex = Regex::new(r"[_-]").unwrap();
}

pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

pub fn error(msg: &str, line: usize, column: usize) -> FormError {
    FormError::ParseError {
        msg: msg.to_string(),
        line,
        column,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None        => String::new(),
        Some(first) => first.to_uppercase().to_string() + chars.as_str(),
    }
}

/// `invoice_line-item` -> `InvoiceLineItem`. Only the first letter of each
/// segment is touched; the rest keeps its casing.
pub fn to_pascal_case(app_id: &str) -> String {
    APP_ID_SEPARATOR
        .split(app_id)
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect()
}

/// `invoice-app` -> `Invoice App`.
pub fn titleize(app_id: &str) -> String {
    APP_ID_SEPARATOR
        .split(app_id)
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Default display label of a field: `first_name` -> `First name`.
pub fn field_label(name: &str) -> String {
    capitalize(&name.replace('_', " "))
}

/// Default display label of an enum member: `STATUS_ACTIVE` -> `Status Active`,
/// `PENDING_UNSPECIFIED` -> `Pending`.
pub fn enum_label(key: &str) -> String {
    let normalized = UNSPECIFIED_SUFFIX
        .replace(key, "")
        .replace('_', " ")
        .trim()
        .to_lowercase();
    if normalized.is_empty() {
        return key.to_string();
    }
    normalized
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strips one pair of matching surrounding `"` or `'`.
pub fn unquote(text: &str) -> &str {
    for q in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(q) && text.ends_with(q) {
            return &text[1..text.len() - 1];
        }
    }
    text
}
