//! Turns parsed field declarations into resolved schema fields.

use protoform_schema::{FieldType, ItemType, OptionItem, RuleType, ValidationRule};
use serde::Serialize;

use crate::{
    types::{EnumDef, EnumMap, MessageDef, MessageMap, ParsedField},
    utils::field_label,
};

pub const NUMERIC_TYPES: [&str; 12] = [
    "double", "float", "int32", "int64", "uint32", "uint64",
    "sint32", "sint64", "fixed32", "fixed64", "sfixed32", "sfixed64",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Number,
    Boolean,
}

impl ScalarKind {
    pub fn classify(type_name: &str) -> Option<ScalarKind> {
        match type_name {
            "string" | "bytes"                         => Some(ScalarKind::String),
            "bool"                                     => Some(ScalarKind::Boolean),
            t if NUMERIC_TYPES.contains(&t)            => Some(ScalarKind::Number),
            _                                          => None,
        }
    }
}

/// What a field's declared type refers to.
#[derive(Debug, Clone, Copy)]
pub enum TypeRef<'a> {
    Scalar(ScalarKind),
    Enum(&'a EnumDef),
    Message(&'a MessageDef),
}

impl<'a> TypeRef<'a> {
    /// Scalars first, then enums, then messages.
    pub fn lookup(type_name: &str, messages: &'a MessageMap, enums: &'a EnumMap) -> Option<TypeRef<'a>> {
        if let Some(scalar) = ScalarKind::classify(type_name) {
            return Some(TypeRef::Scalar(scalar));
        }
        if let Some(def) = enums.get(type_name) {
            return Some(TypeRef::Enum(def));
        }
        messages.get(type_name).map(TypeRef::Message)
    }
}

/// `ui_widget` values that change how a string field renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widget {
    Textarea,
    Markdown,
    Json,
    Image,
}

impl Widget {
    pub fn parse(name: &str) -> Option<Widget> {
        match name.trim().to_ascii_lowercase().as_str() {
            "textarea" => Some(Widget::Textarea),
            "markdown" => Some(Widget::Markdown),
            "json"     => Some(Widget::Json),
            "image"    => Some(Widget::Image),
            _          => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FieldKind {
    String,
    Textarea,
    Markdown,
    Json,
    Image,
    ArrayImage,
    Number,
    Switch,
    Select { options: Vec<OptionItem> },
    CheckboxGroup { options: Vec<OptionItem> },
    Object { object_fields: Vec<SchemaField> },
    Array { item_type: ItemType },
    #[serde(rename = "array<object>")]
    ArrayObject { item_object_fields: Vec<SchemaField> },
}

impl FieldKind {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldKind::String              => FieldType::String,
            FieldKind::Textarea            => FieldType::Textarea,
            FieldKind::Markdown            => FieldType::Markdown,
            FieldKind::Json                => FieldType::Json,
            FieldKind::Image               => FieldType::Image,
            FieldKind::ArrayImage          => FieldType::ArrayImage,
            FieldKind::Number              => FieldType::Number,
            FieldKind::Switch              => FieldType::Switch,
            FieldKind::Select { .. }       => FieldType::Select,
            FieldKind::CheckboxGroup { .. } => FieldType::CheckboxGroup,
            FieldKind::Object { .. }       => FieldType::Object,
            FieldKind::Array { .. }        => FieldType::Array,
            FieldKind::ArrayObject { .. }  => FieldType::ArrayObject,
        }
    }
}

/// A field resolved against the messages and enums of its source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaField {
    pub name:         String,
    pub label:        String,
    pub required:     bool,
    pub rules:        Vec<ValidationRule>,
    pub list_visible: bool,
    pub unique_key:   bool,
    #[serde(flatten)]
    pub kind:         FieldKind,
}

fn enum_options(def: &EnumDef) -> Vec<OptionItem> {
    def.values
        .iter()
        .map(|v| OptionItem::Labeled { label: v.label.clone(), value: v.value.clone() })
        .collect()
}

fn boolean_options() -> Vec<OptionItem> {
    vec![OptionItem::Plain("true".into()), OptionItem::Plain("false".into())]
}

fn build_rules(field: &ParsedField, widget: Option<Widget>) -> Vec<ValidationRule> {
    let mut rules = Vec::new();
    if let Some(pattern) = &field.pattern {
        rules.push(ValidationRule::with_value(RuleType::Pattern, pattern.clone()));
    }
    match widget {
        Some(Widget::Json)     => rules.push(ValidationRule::new(RuleType::Json)),
        Some(Widget::Markdown) => rules.push(ValidationRule::new(RuleType::Markdown)),
        _ => {}
    }
    rules
}

/// Resolves fields recursively. Message types already being expanded, or
/// nested deeper than `max_depth`, are dropped like unknown types.
pub struct Resolver<'a> {
    messages:  &'a MessageMap,
    enums:     &'a EnumMap,
    max_depth: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(messages: &'a MessageMap, enums: &'a EnumMap, max_depth: usize) -> Self {
        Resolver { messages, enums, max_depth }
    }

    /// Resolves the fields of `message` with the message itself on the chain.
    pub fn resolve_message(&self, message: &'a MessageDef) -> Vec<SchemaField> {
        let mut chain = vec![message.name.as_str()];
        self.resolve_fields(message, &mut chain)
    }

    /// Resolves a single field; `None` when its type is unknown.
    pub fn resolve(&self, field: &ParsedField) -> Option<SchemaField> {
        let mut chain = Vec::new();
        self.resolve_in(field, &mut chain)
    }

    fn resolve_fields(&self, message: &'a MessageDef, chain: &mut Vec<&'a str>) -> Vec<SchemaField> {
        message
            .fields
            .iter()
            .filter_map(|f| self.resolve_in(f, chain))
            .collect()
    }

    fn expand(&self, field: &ParsedField, message: &'a MessageDef, chain: &mut Vec<&'a str>) -> Option<Vec<SchemaField>> {
        if chain.contains(&message.name.as_str()) {
            log::warn!(
                "dropping field {}: message {} contains itself",
                field.name, message.name
            );
            return None;
        }
        if chain.len() >= self.max_depth {
            log::warn!(
                "dropping field {}: nesting deeper than {} levels",
                field.name, self.max_depth
            );
            return None;
        }
        chain.push(message.name.as_str());
        let fields = self.resolve_fields(message, chain);
        chain.pop();
        Some(fields)
    }

    fn resolve_in(&self, field: &ParsedField, chain: &mut Vec<&'a str>) -> Option<SchemaField> {
        let Some(type_ref) = TypeRef::lookup(&field.type_, self.messages, self.enums) else {
            log::debug!("dropping field {}: unknown type {}", field.name, field.type_);
            return None;
        };
        let widget = field.widget.as_deref().and_then(Widget::parse);

        let kind = match (type_ref, field.repeated) {
            (TypeRef::Scalar(ScalarKind::String), false) => match widget {
                Some(Widget::Textarea) => FieldKind::Textarea,
                Some(Widget::Markdown) => FieldKind::Markdown,
                Some(Widget::Json)     => FieldKind::Json,
                Some(Widget::Image)    => FieldKind::Image,
                None                   => FieldKind::String,
            },
            (TypeRef::Scalar(ScalarKind::String), true) => match widget {
                Some(Widget::Image) => FieldKind::ArrayImage,
                _                   => FieldKind::Array { item_type: ItemType::String },
            },
            (TypeRef::Scalar(ScalarKind::Number), false)  => FieldKind::Number,
            (TypeRef::Scalar(ScalarKind::Number), true)   => FieldKind::Array { item_type: ItemType::Number },
            (TypeRef::Scalar(ScalarKind::Boolean), false) => FieldKind::Switch,
            (TypeRef::Scalar(ScalarKind::Boolean), true)  => FieldKind::CheckboxGroup { options: boolean_options() },
            (TypeRef::Enum(def), false) => FieldKind::Select { options: enum_options(def) },
            (TypeRef::Enum(def), true)  => FieldKind::CheckboxGroup { options: enum_options(def) },
            (TypeRef::Message(def), false) => FieldKind::Object {
                object_fields: self.expand(field, def, chain)?,
            },
            (TypeRef::Message(def), true) => FieldKind::ArrayObject {
                item_object_fields: self.expand(field, def, chain)?,
            },
        };

        Some(SchemaField {
            name:         field.name.clone(),
            label:        field.label.clone().unwrap_or_else(|| field_label(&field.name)),
            required:     field.required.unwrap_or(false),
            rules:        build_rules(field, widget),
            list_visible: field.list_visible.unwrap_or(false),
            unique_key:   field.unique_key.unwrap_or(false),
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_schema;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::types::FieldMeta;

    fn resolve_root(text: &str, root: &str) -> Vec<SchemaField> {
        let schema = parse_schema(text);
        let resolver = Resolver::new(&schema.messages, &schema.enums, 16);
        resolver.resolve_message(&schema.messages[root])
    }

    #[test]
    fn test_resolve_single_field() {
        let schema = parse_schema(
            "
            enum Tone { WARM = 0; COLD = 1; }
            message Swatch { string hex = 1; }
            ",
        );
        let resolver = Resolver::new(&schema.messages, &schema.enums, 16);

        let unknown = ParsedField::new("x", "Missing", false, FieldMeta::default());
        assert_eq!(resolver.resolve(&unknown), None);

        let tones = resolver
            .resolve(&ParsedField::new("tones", "Tone", true, FieldMeta::default()))
            .unwrap();
        assert_eq!(tones.kind.field_type(), FieldType::CheckboxGroup);
        assert_eq!(tones.label, "Tones");

        let meta = FieldMeta { label: Some("Main colour".into()), required: Some(true), ..FieldMeta::default() };
        let swatch = resolver.resolve(&ParsedField::new("swatch", "Swatch", false, meta)).unwrap();
        assert_eq!(swatch.label, "Main colour");
        assert!(swatch.required);
        match swatch.kind {
            FieldKind::Object { object_fields } => assert_eq!(object_fields[0].name, "hex"),
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_scalar_resolution_table() {
        let fields = resolve_root(
            "
            message M {
              string a = 1;
              bytes b = 2;
              sfixed64 c = 3;
              bool d = 4;
              repeated string e = 5;
              repeated double f = 6;
              repeated bool g = 7;
              string h = 8 [(ui_widget) = \"textarea\"];
              repeated string i = 9 [(ui_widget) = \"image\"];
              string j = 10 [(ui_widget) = \"unknown\"];
            }
            ",
            "M",
        );
        let kinds: Vec<_> = fields.iter().map(|f| f.kind.field_type().to_string()).collect();
        assert_eq!(
            kinds,
            vec![
                "string", "string", "number", "switch", "array", "array",
                "checkbox-group", "textarea", "array-image", "string",
            ]
        );
        assert_eq!(fields[4].kind, FieldKind::Array { item_type: ItemType::String });
        assert_eq!(fields[5].kind, FieldKind::Array { item_type: ItemType::Number });
        assert_eq!(fields[6].kind, FieldKind::CheckboxGroup { options: boolean_options() });
    }

    #[test]
    fn test_unknown_types_are_dropped() {
        let fields = resolve_root("message M { Missing a = 1; string b = 2; }", "M");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "b");
    }

    #[test]
    fn test_widget_rules() {
        let fields = resolve_root(
            "message M {
               string doc = 1 [(ui_widget) = \"json\"]; // @pattern ^\\{
               string notes = 2 [(ui_widget) = \"markdown\"];
             }",
            "M",
        );
        let value = serde_json::to_value(&fields).unwrap();
        assert_eq!(value[0]["rules"], json!([{ "type": "pattern", "value": "^\\{" }, { "type": "json" }]));
        assert_eq!(value[1]["rules"], json!([{ "type": "markdown" }]));
    }

    #[test]
    fn test_enum_and_message_fields() {
        let fields = resolve_root(
            "
            enum Color { COLOR_UNSPECIFIED = 0; RED = 1; }
            message Tag { string name = 1; }
            message M {
              Color main = 1;
              repeated Color others = 2;
              Tag tag = 3;
              repeated Tag tags = 4;
            }
            ",
            "M",
        );
        let value = serde_json::to_value(&fields).unwrap();
        assert_eq!(value[0]["type"], "select");
        assert_eq!(value[0]["options"], json!([
            { "label": "Color", "value": "COLOR_UNSPECIFIED" },
            { "label": "Red", "value": "RED" },
        ]));
        assert_eq!(value[1]["type"], "checkbox-group");
        assert_eq!(value[2]["type"], "object");
        assert_eq!(value[2]["object_fields"][0]["name"], "name");
        assert_eq!(value[3]["type"], "array<object>");
        assert_eq!(value[3]["item_object_fields"][0]["label"], "Name");
        assert_eq!(value[3]["list_visible"], false);
    }

    #[test]
    fn test_self_reference_terminates() {
        let fields = resolve_root(
            "
            message Node {
              string value = 1;
              Node parent = 2;
              repeated Child children = 3;
            }
            message Child {
              Node back = 1;
              string label = 2;
            }
            ",
            "Node",
        );
        assert_eq!(fields.len(), 2);
        match &fields[1].kind {
            FieldKind::ArrayObject { item_object_fields } => {
                let names: Vec<_> = item_object_fields.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["label"]);
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_depth_limit() {
        let schema = parse_schema(
            "message A { B b = 1; } message B { C c = 1; } message C { string x = 1; }",
        );
        let shallow = Resolver::new(&schema.messages, &schema.enums, 2);
        let fields = shallow.resolve_message(&schema.messages["A"]);
        match &fields[0].kind {
            FieldKind::Object { object_fields } => assert!(object_fields.is_empty()),
            other => panic!("unexpected kind {:?}", other),
        }
    }
}
