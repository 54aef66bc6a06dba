use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Metadata collected for one field or enum member from comments and options.
///
/// Every attribute is optional so that sources can be layered with
/// [`FieldMeta::merge`]; a later source wins for each attribute it sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMeta {
    pub label:        Option<String>,
    pub required:     Option<bool>,
    pub pattern:      Option<String>,
    pub list_visible: Option<bool>,
    pub unique_key:   Option<bool>,
    pub widget:       Option<String>,
    pub value:        Option<String>,
}

impl FieldMeta {
    pub fn merge(mut self, other: FieldMeta) -> FieldMeta {
        if other.label.is_some()        { self.label        = other.label; }
        if other.required.is_some()     { self.required     = other.required; }
        if other.pattern.is_some()      { self.pattern      = other.pattern; }
        if other.list_visible.is_some() { self.list_visible = other.list_visible; }
        if other.unique_key.is_some()   { self.unique_key   = other.unique_key; }
        if other.widget.is_some()       { self.widget       = other.widget; }
        if other.value.is_some()        { self.value        = other.value; }
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == FieldMeta::default()
    }
}

/// One field occurrence inside a parsed message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedField {
    pub name:         String,
    #[serde(rename = "type")]
    pub type_:        String,
    pub repeated:     bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label:        Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required:     Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern:      Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_key:   Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget:       Option<String>,
}

impl ParsedField {
    pub fn new(name: &str, type_: &str, repeated: bool, meta: FieldMeta) -> Self {
        ParsedField {
            name:         name.to_string(),
            type_:        type_.to_string(),
            repeated,
            label:        meta.label,
            required:     meta.required,
            pattern:      meta.pattern,
            list_visible: meta.list_visible,
            unique_key:   meta.unique_key,
            widget:       meta.widget,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageDef {
    pub name:   String,
    pub fields: Vec<ParsedField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumDef {
    pub name:   String,
    pub values: Vec<EnumValue>,
}

/// Messages keyed by local name, in declaration order.
pub type MessageMap = IndexMap<String, MessageDef>;

/// Enums keyed by local name, in declaration order.
pub type EnumMap = IndexMap<String, EnumDef>;
