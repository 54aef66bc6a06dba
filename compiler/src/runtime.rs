//! Domain schema -> renderer-facing runtime schema.

use protoform_schema::{
    DomainFieldSchema, DomainFormSchema, RuleType, RuntimeFieldSchema, RuntimeFormSchema, RuntimeProps,
    ValidationRule,
};

pub fn to_runtime_schema(domain: &DomainFormSchema) -> RuntimeFormSchema {
    RuntimeFormSchema {
        form_id: domain.form_name.clone(),
        version: domain.version.clone(),
        fields:  domain.fields.iter().map(to_runtime_field).collect(),
    }
}

pub fn to_runtime_field(field: &DomainFieldSchema) -> RuntimeFieldSchema {
    let mut rules = field.rules.clone();
    // the boolean flag alone must still reach the renderer as a rule
    if field.required && !field.has_rule(RuleType::Required) {
        rules.insert(0, ValidationRule::new(RuleType::Required));
    }

    RuntimeFieldSchema {
        id:              field.key.clone(),
        component_type:  field.field_type.clone(),
        props:           RuntimeProps {
            label:         field.label.clone(),
            options:       field.options.clone().unwrap_or_default(),
            item_type:     field.item_type,
            object_fields: field.object_fields.clone(),
        },
        rules,
        visible_when:    field.visibility.as_ref().map(|v| v.expr.clone()),
        value_prop_name: field.field_type.binds_checked().then(|| "checked".to_string()),
    }
}
