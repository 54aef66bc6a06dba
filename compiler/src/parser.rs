use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    annotations::{merge_enum_meta, merge_field_meta},
    blocks::{extract_blocks, remove_inner_blocks, strip_block_comments, BlockKind},
    statements::{assemble_statements, Statement},
    types::{EnumDef, EnumMap, EnumValue, MessageDef, MessageMap, ParsedField},
    utils::enum_label,
};

lazy_static! {
    static ref FIELD:      Regex = Regex::new(r"^(repeated\s+)?([A-Za-z_][\w.]*)\s+([A-Za-z_]\w*)\s*=\s*\d+\s*(?:\[.*\])?\s*;$").unwrap();
    static ref ENUM_VALUE: Regex = Regex::new(r"^([A-Z][A-Z0-9_]*)\s*=\s*-?\d+\s*(?:\[.*\])?\s*;$").unwrap();
}

/// Messages and enums of one IDL source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSchema {
    pub messages: MessageMap,
    pub enums:    EnumMap,
}

/// `[repeated] Type name = tag [options];`. A package-qualified type keeps
/// only its last segment.
pub fn parse_field(statement: &Statement) -> Option<ParsedField> {
    let caps = FIELD.captures(&statement.text)?;
    let repeated = caps.get(1).is_some();
    let type_ = caps.get(2)?.as_str().rsplit('.').next()?;
    let name = caps.get(3)?.as_str();
    Some(ParsedField::new(name, type_, repeated, merge_field_meta(statement)))
}

/// `NAME = tag [options];`
pub fn parse_enum_value(statement: &Statement) -> Option<EnumValue> {
    let caps = ENUM_VALUE.captures(&statement.text)?;
    let key = caps.get(1)?.as_str();
    let meta = merge_enum_meta(statement);
    Some(EnumValue {
        label: meta.label.unwrap_or_else(|| enum_label(key)),
        value: meta.value.unwrap_or_else(|| key.to_string()),
    })
}

fn parse_body<T>(body: &str, parse: impl Fn(&Statement) -> Option<T>) -> Vec<T> {
    assemble_statements(&remove_inner_blocks(body))
        .iter()
        .filter_map(|statement| {
            let parsed = parse(statement);
            if parsed.is_none() {
                log::debug!("skipping statement {}", statement.text);
            }
            parsed
        })
        .collect()
}

/// Expects block comments to be stripped already.
pub fn parse_messages(text: &str) -> MessageMap {
    let mut out = MessageMap::new();
    for block in extract_blocks(text, BlockKind::Message) {
        let fields = parse_body(block.body, parse_field);
        out.insert(block.name.to_string(), MessageDef { name: block.name.to_string(), fields });
    }
    out
}

/// Expects block comments to be stripped already.
pub fn parse_enums(text: &str) -> EnumMap {
    let mut out = EnumMap::new();
    for block in extract_blocks(text, BlockKind::Enum) {
        let values = parse_body(block.body, parse_enum_value);
        out.insert(block.name.to_string(), EnumDef { name: block.name.to_string(), values });
    }
    out
}

pub fn parse_schema(text: &str) -> ParsedSchema {
    let clean = strip_block_comments(text);
    ParsedSchema {
        messages: parse_messages(&clean),
        enums:    parse_enums(&clean),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn statement(text: &str) -> Statement {
        Statement { text: text.into(), ..Statement::default() }
    }

    #[test]
    fn test_parse_field_grammar() {
        let f = parse_field(&statement("repeated common.v1.Address addresses = 4 [(ui_list) = true];")).unwrap();
        assert_eq!(f.name, "addresses");
        assert_eq!(f.type_, "Address");
        assert!(f.repeated);
        assert_eq!(f.list_visible, Some(true));

        assert!(parse_field(&statement("option (x) = 1;")).is_none());
        assert!(parse_field(&statement("message Inner ;")).is_none());
        assert!(parse_field(&statement("map<string, string> m = 1;")).is_none());
    }

    #[test]
    fn test_parse_enum_value_defaults() {
        let v = parse_enum_value(&statement("STATUS_ACTIVE = 1;")).unwrap();
        assert_eq!(v, EnumValue { label: "Status Active".into(), value: "STATUS_ACTIVE".into() });

        assert!(parse_enum_value(&statement("option allow_alias = true;")).is_none());
        assert!(parse_enum_value(&statement("lower = 1;")).is_none());
    }

    #[test]
    fn test_nested_messages_are_flattened() {
        let schema = parse_schema(
            "
            message Order {
              message Line {
                string sku = 1;
              }
              repeated Line lines = 1;
              string note = 2;
            }
            ",
        );
        let names: Vec<_> = schema.messages.keys().cloned().collect();
        assert_eq!(names, vec!["Order".to_string(), "Line".to_string()]);

        let order = &schema.messages["Order"];
        let fields: Vec<_> = order.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["lines", "note"]);
        assert_eq!(schema.messages["Line"].fields[0].name, "sku");
    }

    #[test]
    fn test_block_comments_are_stripped_first() {
        let schema = parse_schema(
            "
            /* message Hidden { string h = 1; } */
            message Shown {
              string a = 1; /* inline */
            }
            ",
        );
        assert_eq!(schema.messages.len(), 1);
        assert_eq!(schema.messages["Shown"].fields.len(), 1);
    }
}
