use protoform_schema::{DomainFieldSchema, FieldType, RuntimeFieldSchema, ValidationRule};

/// The parts of a schema field the record validator needs. Domain and runtime
/// fields both qualify; nested fields are always domain fields.
pub trait FieldShape {
    fn key(&self) -> &str;
    fn label(&self) -> &str;
    fn field_type(&self) -> &FieldType;
    fn rules(&self) -> &[ValidationRule];
    fn children(&self) -> &[DomainFieldSchema];
}

impl FieldShape for DomainFieldSchema {
    fn key(&self) -> &str {
        &self.key
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    fn rules(&self) -> &[ValidationRule] {
        &self.rules
    }

    fn children(&self) -> &[DomainFieldSchema] {
        self.object_fields.as_deref().unwrap_or_default()
    }
}

impl FieldShape for RuntimeFieldSchema {
    fn key(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.props.label
    }

    fn field_type(&self) -> &FieldType {
        &self.component_type
    }

    fn rules(&self) -> &[ValidationRule] {
        &self.rules
    }

    fn children(&self) -> &[DomainFieldSchema] {
        self.props.object_fields.as_deref().unwrap_or_default()
    }
}
