use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Component kind of a form field.
///
/// The set is closed for everything the compiler emits; names coming from
/// hand-written or older stored schemas round-trip through [`FieldType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    String,
    Textarea,
    Markdown,
    Json,
    Image,
    ArrayImage,
    Number,
    Switch,
    Checkbox,
    Select,
    CheckboxGroup,
    Object,
    Array,
    ArrayObject,
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::String        => "string",
            FieldType::Textarea      => "textarea",
            FieldType::Markdown      => "markdown",
            FieldType::Json          => "json",
            FieldType::Image         => "image",
            FieldType::ArrayImage    => "array-image",
            FieldType::Number        => "number",
            FieldType::Switch        => "switch",
            FieldType::Checkbox      => "checkbox",
            FieldType::Select        => "select",
            FieldType::CheckboxGroup => "checkbox-group",
            FieldType::Object        => "object",
            FieldType::Array         => "array",
            FieldType::ArrayObject   => "array<object>",
            FieldType::Other(name)   => name,
        }
    }

    /// Components that bind a boolean `checked` prop instead of `value`.
    pub fn binds_checked(&self) -> bool {
        matches!(self, FieldType::Checkbox | FieldType::Switch)
    }
}

impl From<&str> for FieldType {
    fn from(name: &str) -> Self {
        match name {
            "string"         => FieldType::String,
            "textarea"       => FieldType::Textarea,
            "markdown"       => FieldType::Markdown,
            "json"           => FieldType::Json,
            "image"          => FieldType::Image,
            "array-image"    => FieldType::ArrayImage,
            "number"         => FieldType::Number,
            "switch"         => FieldType::Switch,
            "checkbox"       => FieldType::Checkbox,
            "select"         => FieldType::Select,
            "checkbox-group" => FieldType::CheckboxGroup,
            "object"         => FieldType::Object,
            "array"          => FieldType::Array,
            "array<object>"  => FieldType::ArrayObject,
            other            => FieldType::Other(other.to_string()),
        }
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        FieldType::from(name.as_str())
    }
}

impl From<FieldType> for String {
    fn from(ty: FieldType) -> Self {
        ty.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Element type of a scalar `array` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    String,
    Number,
    Boolean,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormStatus {
    Draft,
    #[default]
    Published,
}

impl std::str::FromStr for FormStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "draft"     => Ok(FormStatus::Draft),
            "published" => Ok(FormStatus::Published),
            other       => Err(format!("unknown form status \"{}\"", other)),
        }
    }
}

/// Rule kind. Names outside the built-in set are kept verbatim in
/// [`RuleType::Custom`] so stored schemas round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleType {
    Required,
    Min,
    Max,
    Pattern,
    Json,
    Markdown,
    Custom(String),
}

impl RuleType {
    pub fn as_str(&self) -> &str {
        match self {
            RuleType::Required => "required",
            RuleType::Min      => "min",
            RuleType::Max      => "max",
            RuleType::Pattern  => "pattern",
            RuleType::Json     => "json",
            RuleType::Markdown => "markdown",
            RuleType::Custom(name) => name,
        }
    }
}

// An empty rule name reads as `custom`.
impl From<String> for RuleType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "required" => RuleType::Required,
            "min"      => RuleType::Min,
            "max"      => RuleType::Max,
            "pattern"  => RuleType::Pattern,
            "json"     => RuleType::Json,
            "markdown" => RuleType::Markdown,
            ""         => RuleType::Custom("custom".to_string()),
            _          => RuleType::Custom(name),
        }
    }
}

impl From<RuleType> for String {
    fn from(rule: RuleType) -> Self {
        match rule {
            RuleType::Custom(name) => name,
            other                  => other.as_str().to_string(),
        }
    }
}

/// One validation directive attached to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
}

impl ValidationRule {
    pub fn new(rule_type: RuleType) -> Self {
        ValidationRule { rule_type, value: None, plugin: None }
    }

    pub fn with_value(rule_type: RuleType, value: impl Into<String>) -> Self {
        ValidationRule { rule_type, value: Some(value.into()), plugin: None }
    }
}

/// A choice for `select` / `checkbox-group` fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionItem {
    Labeled { label: String, value: String },
    Plain(String),
}

impl OptionItem {
    pub fn value(&self) -> &str {
        match self {
            OptionItem::Labeled { value, .. } => value,
            OptionItem::Plain(value)          => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    pub expr: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainFieldSchema {
    pub key:            String,
    pub label:          String,
    pub field_type:     FieldType,
    #[serde(default)]
    pub required:       bool,
    #[serde(default)]
    pub list_in_table:  bool,
    #[serde(default)]
    pub unique_key:     bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options:        Option<Vec<OptionItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type:      Option<ItemType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_fields:  Option<Vec<DomainFieldSchema>>,
    #[serde(default)]
    pub rules:          Vec<ValidationRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility:     Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata:       Option<Map<String, Value>>,
}

impl DomainFieldSchema {
    /// A bare field with no options, rules or children.
    pub fn new(key: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        DomainFieldSchema {
            key:           key.into(),
            label:         label.into(),
            field_type,
            required:      false,
            list_in_table: false,
            unique_key:    false,
            options:       None,
            item_type:     None,
            object_fields: None,
            rules:         Vec::new(),
            visibility:    None,
            metadata:      None,
        }
    }

    pub fn has_rule(&self, rule_type: RuleType) -> bool {
        self.rules.iter().any(|r| r.rule_type == rule_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainFormSchema {
    pub form_name:  String,
    pub version:    String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id:  Option<String>,
    #[serde(default)]
    pub status:     FormStatus,
    pub created_at: String,
    pub fields:     Vec<DomainFieldSchema>,
}

impl DomainFormSchema {
    /// Key of the first top-level field flagged as the record's natural key.
    pub fn unique_key_field(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.unique_key)
            .map(|f| f.key.as_str())
    }

    pub fn field(&self, key: &str) -> Option<&DomainFieldSchema> {
        self.fields.iter().find(|f| f.key == key)
    }
}

/// Stringified unique-key value of a record; `null` and absent read as none.
pub fn unique_value(data: &Map<String, Value>, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::Null      => None,
        Value::String(s) => Some(s.clone()),
        other            => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_field_type_round_trips_through_strings() {
        let ty: FieldType = serde_json::from_value(json!("array<object>")).unwrap();
        assert_eq!(ty, FieldType::ArrayObject);
        assert_eq!(serde_json::to_value(&ty).unwrap(), json!("array<object>"));

        let custom: FieldType = serde_json::from_value(json!("date")).unwrap();
        assert_eq!(custom, FieldType::Other("date".into()));
        assert_eq!(custom.to_string(), "date");
    }

    #[test]
    fn test_unknown_rule_type_keeps_its_name() {
        let rule: ValidationRule = serde_json::from_value(json!({ "type": "email" })).unwrap();
        assert_eq!(rule.rule_type, RuleType::Custom("email".into()));
        assert_eq!(rule.value, None);
        assert_eq!(serde_json::to_value(&rule).unwrap(), json!({ "type": "email" }));

        let empty: ValidationRule = serde_json::from_value(json!({ "type": "" })).unwrap();
        assert_eq!(empty.rule_type.as_str(), "custom");
    }

    #[test]
    fn test_domain_field_serializes_camel_case() {
        let mut field = DomainFieldSchema::new("first_name", "First name", FieldType::String);
        field.list_in_table = true;
        field.rules.push(ValidationRule::with_value(RuleType::Pattern, "^[a-z]+$"));

        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(
            value,
            json!({
                "key": "first_name",
                "label": "First name",
                "fieldType": "string",
                "required": false,
                "listInTable": true,
                "uniqueKey": false,
                "rules": [{ "type": "pattern", "value": "^[a-z]+$" }]
            })
        );
    }

    #[test]
    fn test_options_accept_plain_and_labeled_items() {
        let options: Vec<OptionItem> =
            serde_json::from_value(json!(["true", { "label": "Active", "value": "ACTIVE" }])).unwrap();
        assert_eq!(options[0], OptionItem::Plain("true".into()));
        assert_eq!(options[1].value(), "ACTIVE");
    }

    #[test]
    fn test_unique_value_stringifies() {
        let data = json!({ "code": 42, "name": "x", "gone": null });
        let data = data.as_object().unwrap();
        assert_eq!(unique_value(data, "code"), Some("42".to_string()));
        assert_eq!(unique_value(data, "name"), Some("x".to_string()));
        assert_eq!(unique_value(data, "gone"), None);
        assert_eq!(unique_value(data, "missing"), None);
    }
}
