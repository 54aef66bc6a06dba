use serde::{Deserialize, Serialize};

use crate::domain::{DomainFieldSchema, FieldType, ItemType, OptionItem, ValidationRule};

/// Props handed to the renderer component of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeProps {
    pub label:         String,
    #[serde(default)]
    pub options:       Vec<OptionItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type:     Option<ItemType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_fields: Option<Vec<DomainFieldSchema>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeFieldSchema {
    pub id:              String,
    pub component_type:  FieldType,
    pub props:           RuntimeProps,
    #[serde(default)]
    pub rules:           Vec<ValidationRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_when:    Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_prop_name: Option<String>,
}

/// Renderer-facing schema. Never persisted; derive it from a
/// [`DomainFormSchema`](crate::DomainFormSchema) whenever it is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeFormSchema {
    pub form_id: String,
    pub version: String,
    pub fields:  Vec<RuntimeFieldSchema>,
}

impl RuntimeFormSchema {
    pub fn field(&self, id: &str) -> Option<&RuntimeFieldSchema> {
        self.fields.iter().find(|f| f.id == id)
    }
}
