//! Field and enum-member metadata from `@directive` comments and bracketed
//! `(ui_*)` options.
//!
//! Precedence, weakest first: leading comment lines, trailing comments on the
//! statement's own lines, bracket options.

use lazy_static::lazy_static;
use regex::Regex;

use crate::{statements::Statement, types::FieldMeta, utils::unquote};

fn string_option_regex(key: &str) -> Regex {
    Regex::new(&format!(r#"(?i)\((?:[\w.]+\.)?{}\)\s*=\s*"((?:\\.|[^"])*)""#, key)).unwrap()
}

fn bool_option_regex(key: &str) -> Regex {
    Regex::new(&format!(r"(?i)\((?:[\w.]+\.)?{}\)\s*=\s*(true|false)\b", key)).unwrap()
}

lazy_static! {
    static ref DIRECTIVE:     Regex = Regex::new(r"(?:^|\s)@([A-Za-z_]\w*)").unwrap();
    static ref TRAILING_STAR: Regex = Regex::new(r"\s*\*+\s*$").unwrap();

    static ref UI_LABEL:      Regex = string_option_regex("ui_label");
    static ref UI_PATTERN:    Regex = string_option_regex("ui_pattern");
    static ref UI_WIDGET:     Regex = string_option_regex("ui_widget");
    static ref UI_ENUM_LABEL: Regex = string_option_regex("ui_enum_label");
    static ref UI_ENUM_VALUE: Regex = string_option_regex("ui_enum_value");
    static ref UI_REQUIRED:   Regex = bool_option_regex("ui_required");
    static ref UI_LIST:       Regex = bool_option_regex("ui_list");
    static ref UI_UNIQUE:     Regex = bool_option_regex("ui_unique");
}

/// `(name, value)` for every `@name value` in a comment. The value runs up to
/// the next whitespace-preceded `@name`; a leading `:` or `=` is dropped.
pub fn directives(comment: &str) -> Vec<(String, &str)> {
    let marks: Vec<_> = DIRECTIVE
        .captures_iter(comment)
        .filter_map(|caps| Some((caps.get(0)?, caps.get(1)?)))
        .collect();

    marks
        .iter()
        .enumerate()
        .map(|(i, (_, name))| {
            let end = marks.get(i + 1).map_or(comment.len(), |(whole, _)| whole.start());
            let value = comment[name.end()..end]
                .trim_start()
                .trim_start_matches(&[':', '='][..])
                .trim();
            (name.as_str().to_ascii_lowercase(), value)
        })
        .collect()
}

/// `true|1|yes` / `false|0|no`; anything else (including nothing) means the
/// bare directive, which is `true`.
fn directive_flag(value: &str) -> bool {
    match value.split_whitespace().next().map(str::to_ascii_lowercase).as_deref() {
        Some("false") | Some("0") | Some("no") => false,
        _ => true,
    }
}

/// Collapses doubled backslashes and keeps the pattern only if it compiles.
pub fn normalize_pattern(raw: &str) -> Option<String> {
    let pattern = raw.replace("\\\\", "\\");
    match Regex::new(&pattern) {
        Ok(_) => Some(pattern),
        Err(e) => {
            log::warn!("dropping invalid pattern {:?}: {}", pattern, e);
            None
        }
    }
}

fn first<'a>(found: &'a [(String, &'a str)], names: &[&str]) -> Option<&'a str> {
    found
        .iter()
        .find(|(name, _)| names.contains(&name.as_str()))
        .map(|(_, value)| *value)
}

/// Metadata from one comment attached to a message field.
pub fn field_comment_meta(comment: &str) -> FieldMeta {
    let mut meta = FieldMeta::default();
    let found = directives(comment);
    if found.is_empty() {
        return meta;
    }

    if let Some(raw) = first(&found, &["label"]).filter(|v| !v.is_empty()) {
        if TRAILING_STAR.is_match(raw) {
            meta.required = Some(true);
        }
        let label = unquote(TRAILING_STAR.replace(raw, "").trim()).trim().to_string();
        if !label.is_empty() {
            meta.label = Some(label);
        }
    }

    if let Some(value) = first(&found, &["required", "require"]) {
        meta.required = Some(directive_flag(value));
    }

    if let Some(raw) = first(&found, &["pattern", "regex"]).filter(|v| !v.is_empty()) {
        meta.pattern = normalize_pattern(unquote(raw));
    }

    if let Some(value) = first(&found, &["list", "table", "list_visible"]) {
        meta.list_visible = Some(directive_flag(value));
    }

    if let Some(value) = first(&found, &["unique", "unique_key", "uk"]) {
        meta.unique_key = Some(directive_flag(value));
    }

    meta
}

/// Metadata from one comment attached to an enum member.
pub fn enum_comment_meta(comment: &str) -> FieldMeta {
    let mut meta = FieldMeta::default();
    let found = directives(comment);

    if let Some(label) = first(&found, &["label"]).map(unquote).filter(|v| !v.is_empty()) {
        meta.label = Some(label.to_string());
    }
    if let Some(value) = first(&found, &["value"]).filter(|v| !v.is_empty()) {
        meta.value = Some(unquote(value).to_string());
    }
    meta
}

/// Text between the first `[` and the last `]` before the final `;`.
pub fn options_segment(statement: &str) -> &str {
    let end = statement.rfind(';').unwrap_or(statement.len());
    let Some(open) = statement.find('[') else {
        return "";
    };
    match statement[..end].rfind(']') {
        Some(close) if close > open => &statement[open + 1..close],
        _ => "",
    }
}

fn string_option(options: &str, re: &Regex) -> Option<String> {
    let raw = re.captures(options)?.get(1)?.as_str();
    Some(raw.replace("\\\"", "\"").replace("\\\\", "\\"))
}

fn bool_option(options: &str, re: &Regex) -> Option<bool> {
    let raw = re.captures(options)?.get(1)?.as_str();
    Some(raw.eq_ignore_ascii_case("true"))
}

/// Metadata from the bracket options of a field statement.
pub fn field_option_meta(options: &str) -> FieldMeta {
    let mut meta = FieldMeta::default();
    if options.is_empty() {
        return meta;
    }

    meta.label = string_option(options, &UI_LABEL).filter(|l| !l.is_empty());
    meta.required = bool_option(options, &UI_REQUIRED);
    meta.pattern = string_option(options, &UI_PATTERN)
        .filter(|p| !p.is_empty())
        .and_then(|p| normalize_pattern(&p));
    meta.list_visible = bool_option(options, &UI_LIST);
    meta.unique_key = bool_option(options, &UI_UNIQUE);
    meta.widget = string_option(options, &UI_WIDGET)
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty());
    meta
}

/// Metadata from the bracket options of an enum member.
pub fn enum_option_meta(options: &str) -> FieldMeta {
    let mut meta = FieldMeta::default();
    if options.is_empty() {
        return meta;
    }
    meta.label = string_option(options, &UI_ENUM_LABEL).filter(|l| !l.is_empty());
    meta.value = string_option(options, &UI_ENUM_VALUE);
    meta
}

/// Layers every metadata source of a field statement.
pub fn merge_field_meta(statement: &Statement) -> FieldMeta {
    let pending = statement
        .leading
        .iter()
        .fold(FieldMeta::default(), |acc, c| acc.merge(field_comment_meta(c)));
    let inline = statement
        .trailing
        .iter()
        .fold(FieldMeta::default(), |acc, c| acc.merge(field_comment_meta(c)));
    let options = field_option_meta(options_segment(&statement.text));
    pending.merge(inline).merge(options)
}

/// Layers every metadata source of an enum member statement.
pub fn merge_enum_meta(statement: &Statement) -> FieldMeta {
    let comments = statement
        .leading
        .iter()
        .chain(statement.trailing.iter())
        .fold(FieldMeta::default(), |acc, c| acc.merge(enum_comment_meta(c)));
    comments.merge(enum_option_meta(options_segment(&statement.text)))
}
