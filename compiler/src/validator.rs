//! Shape validation of submitted records against a form schema.
//!
//! Empty values (absent, `null`, `""`) are skipped; presence is the write
//! path's concern. The first violation aborts validation.

use protoform_schema::{DomainFieldSchema, DomainFormSchema, FieldType, RuleType, RuntimeFormSchema};
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use crate::traits::FieldShape;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    #[error("must be a string")]
    NotString,
    #[error("must be valid JSON")]
    NotJson,
    #[error("has an unclosed fenced code block")]
    UnbalancedFence,
    #[error("must be an image URL")]
    InvalidImage,
    #[error("item {index} must be an image URL")]
    InvalidImageItem { index: usize },
    #[error("item {index} {violation}")]
    InvalidItem { index: usize, violation: Box<Violation> },
    #[error("must be an array")]
    NotAnArray,
    #[error("must be an object")]
    NotAnObject,
    #[error("row {index} must be an object")]
    RowNotObject { index: usize },
    #[error("does not match pattern {pattern}")]
    PatternMismatch { pattern: String },
    #[error("must be at least {min} characters")]
    TooShort { min: f64 },
    #[error("must be at most {max} characters")]
    TooLong { max: f64 },
    #[error("must be at least {min}")]
    BelowMinimum { min: f64 },
    #[error("must be at most {max}")]
    AboveMaximum { max: f64 },
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{label} ({path}) {violation}")]
pub struct ValidationError {
    /// Dotted / indexed location, e.g. `lines[2].sku`.
    pub path:      String,
    pub label:     String,
    pub violation: Violation,
}

pub fn validate(schema: &DomainFormSchema, data: &Map<String, Value>) -> Result<(), ValidationError> {
    validate_fields(&schema.fields, data, None)
}

pub fn validate_runtime(schema: &RuntimeFormSchema, data: &Map<String, Value>) -> Result<(), ValidationError> {
    validate_fields(&schema.fields, data, None)
}

pub fn validate_fields<F: FieldShape>(
    fields: &[F],
    data: &Map<String, Value>,
    prefix: Option<&str>,
) -> Result<(), ValidationError> {
    for field in fields {
        let path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, field.key()),
            None         => field.key().to_string(),
        };
        let Some(value) = data.get(field.key()).filter(|v| !is_empty(v)) else {
            continue;
        };
        validate_value(field, value, &path).map_err(|violation| ValidationError {
            path: path.clone(),
            label: field.label().to_string(),
            violation,
        })??;
    }
    Ok(())
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null      => true,
        Value::String(s) => s.is_empty(),
        _                => false,
    }
}

/// Outer error: this field is wrong. Inner error: a nested field is wrong and
/// already carries its own path.
fn validate_value<F: FieldShape>(
    field: &F,
    value: &Value,
    path: &str,
) -> Result<Result<(), ValidationError>, Violation> {
    match field.field_type() {
        FieldType::Json        => check_json(value)?,
        FieldType::Markdown    => check_markdown(value)?,
        FieldType::Image       => check_image(value)?,
        FieldType::ArrayImage  => check_image_list(value)?,
        FieldType::Object => {
            let Value::Object(record) = value else {
                return Err(Violation::NotAnObject);
            };
            check_rules(field, value)?;
            return Ok(validate_fields(field.children(), record, Some(path)));
        }
        FieldType::ArrayObject => {
            check_rules(field, value)?;
            return validate_rows(field.children(), value, path);
        }
        _ => {}
    }
    check_rules(field, value)?;
    Ok(Ok(()))
}

/// A bare object stands for a single row at index 0.
fn validate_rows(
    children: &[DomainFieldSchema],
    value: &Value,
    path: &str,
) -> Result<Result<(), ValidationError>, Violation> {
    let rows: Vec<&Value> = match value {
        Value::Array(rows)  => rows.iter().collect(),
        Value::Object(_)    => vec![value],
        _                   => return Err(Violation::NotAnArray),
    };
    for (index, row) in rows.into_iter().enumerate() {
        let Value::Object(record) = row else {
            return Err(Violation::RowNotObject { index });
        };
        let row_path = format!("{}[{}]", path, index);
        if let Err(e) = validate_fields(children, record, Some(&row_path)) {
            return Ok(Err(e));
        }
    }
    Ok(Ok(()))
}

fn check_json(value: &Value) -> Result<(), Violation> {
    let Value::String(text) = value else {
        return Err(Violation::NotString);
    };
    serde_json::from_str::<Value>(text).map(|_| ()).map_err(|_| Violation::NotJson)
}

fn check_markdown(value: &Value) -> Result<(), Violation> {
    let Value::String(text) = value else {
        return Err(Violation::NotString);
    };
    if fences_balanced(text) {
        Ok(())
    } else {
        Err(Violation::UnbalancedFence)
    }
}

fn check_image(value: &Value) -> Result<(), Violation> {
    let candidate = match value {
        Value::String(s)   => Some(s.as_str()),
        Value::Array(list) => match list.first() {
            None                   => return Ok(()),
            Some(Value::String(s)) => Some(s.as_str()),
            Some(_)                => None,
        },
        _ => None,
    };
    match candidate {
        Some(url) if is_image_url(url) => Ok(()),
        _ => Err(Violation::InvalidImage),
    }
}

fn check_image_list(value: &Value) -> Result<(), Violation> {
    let Value::Array(list) = value else {
        return Err(Violation::NotAnArray);
    };
    for (index, item) in list.iter().enumerate() {
        match item {
            Value::String(url) if is_image_url(url) => {}
            _ => return Err(Violation::InvalidImageItem { index }),
        }
    }
    Ok(())
}

fn check_rules<F: FieldShape>(field: &F, value: &Value) -> Result<(), Violation> {
    for rule in field.rules() {
        let bound = rule.value.as_deref().and_then(|v| v.trim().parse::<f64>().ok());
        match (&rule.rule_type, value) {
            (RuleType::Pattern, Value::String(text)) => {
                let Some(pattern) = rule.value.as_deref() else { continue };
                let Ok(re) = Regex::new(pattern) else { continue };
                if !re.is_match(text) {
                    return Err(Violation::PatternMismatch { pattern: pattern.to_string() });
                }
            }
            (RuleType::Min, Value::String(text)) => {
                if let Some(min) = bound.filter(|min| (text.chars().count() as f64) < *min) {
                    return Err(Violation::TooShort { min });
                }
            }
            (RuleType::Max, Value::String(text)) => {
                if let Some(max) = bound.filter(|max| (text.chars().count() as f64) > *max) {
                    return Err(Violation::TooLong { max });
                }
            }
            (RuleType::Min, Value::Number(n)) => {
                if let (Some(min), Some(n)) = (bound, n.as_f64()) {
                    if n < min {
                        return Err(Violation::BelowMinimum { min });
                    }
                }
            }
            (RuleType::Max, Value::Number(n)) => {
                if let (Some(max), Some(n)) = (bound, n.as_f64()) {
                    if n > max {
                        return Err(Violation::AboveMaximum { max });
                    }
                }
            }
            (RuleType::Json, _)     => check_text_rule(value, check_json)?,
            (RuleType::Markdown, _) => check_text_rule(value, check_markdown)?,
            _ => {}
        }
    }
    Ok(())
}

/// Content rules apply to strings and to the string items of a list; other
/// values are left to the field's kind check.
fn check_text_rule(value: &Value, check: fn(&Value) -> Result<(), Violation>) -> Result<(), Violation> {
    match value {
        Value::String(_) => check(value),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                if item.is_string() {
                    check(item).map_err(|violation| Violation::InvalidItem {
                        index,
                        violation: Box::new(violation),
                    })?;
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// `data:image/...`, `blob:...`, a root-relative path, or an absolute
/// `http(s)` URL with a host.
pub fn is_image_url(candidate: &str) -> bool {
    let s = candidate.trim();
    if s.is_empty() {
        return false;
    }
    let lower = s.to_ascii_lowercase();
    if lower.starts_with("data:image/") || lower.starts_with("blob:") {
        return true;
    }
    if s.starts_with('/') {
        return !s.starts_with("//");
    }
    match Url::parse(s) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_)  => false,
    }
}

/// Every ``` / ~~~ fence opened in `text` is closed by a fence of the same
/// character and at least the same length.
pub fn fences_balanced(text: &str) -> bool {
    let mut open: Option<(char, usize)> = None;
    for line in text.lines() {
        let indent = line.len() - line.trim_start_matches(' ').len();
        if indent > 3 {
            continue;
        }
        let rest = &line[indent..];
        let Some(marker) = rest.chars().next().filter(|c| *c == '`' || *c == '~') else {
            continue;
        };
        let run = rest.chars().take_while(|c| *c == marker).count();
        if run < 3 {
            continue;
        }
        match open {
            None => open = Some((marker, run)),
            Some((ch, len)) => {
                let tail = &rest[run..];
                if ch == marker && run >= len && tail.trim().is_empty() {
                    open = None;
                }
            }
        }
    }
    open.is_none()
}
