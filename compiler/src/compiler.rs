use chrono::{SecondsFormat, Utc};
use protoform_schema::{DomainFieldSchema, DomainFormSchema, FormStatus};

use crate::{
    error::FormError,
    parser::{parse_schema, ParsedSchema},
    resolver::{FieldKind, Resolver, SchemaField},
    root::{pick_root, EXCLUDED_ROOTS},
    verifier::{verify_schema, Diagnostic},
};

pub const DEFAULT_VERSION: &str = "1.0.0";
pub const DEFAULT_MAX_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    /// Status stamped on every compiled schema.
    pub status:         FormStatus,
    /// Version stamped on every compiled schema; never bumped by the compiler.
    pub version:        String,
    /// Deepest message nesting expanded before a field is dropped.
    pub max_depth:      usize,
    /// Messages never picked as the fallback root.
    pub excluded_roots: Vec<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            status:         FormStatus::Published,
            version:        DEFAULT_VERSION.to_string(),
            max_depth:      DEFAULT_MAX_DEPTH,
            excluded_roots: EXCLUDED_ROOTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Everything one compilation run learned about a source.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub parsed:      ParsedSchema,
    pub root:        Option<String>,
    pub fields:      Vec<SchemaField>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn compile_source(app_id: &str, text: &str, options: &CompileOptions) -> Compilation {
    let parsed = parse_schema(text);
    let diagnostics = verify_schema(&parsed.messages, &parsed.enums);
    for diagnostic in &diagnostics {
        log::debug!("{}: {}", app_id, diagnostic);
    }

    let root = pick_root(app_id, &parsed.messages, &options.excluded_roots).map(str::to_string);
    let fields = match root.as_deref().and_then(|name| parsed.messages.get(name)) {
        Some(message) => {
            Resolver::new(&parsed.messages, &parsed.enums, options.max_depth).resolve_message(message)
        }
        None => {
            log::warn!("{}: no root message found", app_id);
            Vec::new()
        }
    };

    Compilation { parsed, root, fields, diagnostics }
}

/// Compiles `text` for `app_id`; `None` when no root message can be chosen.
pub fn compile(app_id: &str, text: &str) -> Option<DomainFormSchema> {
    compile_with(app_id, text, &CompileOptions::default())
}

pub fn compile_with(app_id: &str, text: &str, options: &CompileOptions) -> Option<DomainFormSchema> {
    let compilation = compile_source(app_id, text, options);
    let root = compilation.root?;
    Some(assemble_domain(&root, &compilation.fields, options))
}

/// Like [`compile_with`], reporting a missing root as an error.
pub fn try_compile(app_id: &str, text: &str, options: &CompileOptions) -> Result<DomainFormSchema, FormError> {
    compile_with(app_id, text, options).ok_or_else(|| FormError::NoRootMessage(app_id.to_string()))
}

pub fn assemble_domain(form_name: &str, fields: &[SchemaField], options: &CompileOptions) -> DomainFormSchema {
    DomainFormSchema {
        form_name:  form_name.to_string(),
        version:    options.version.clone(),
        tenant_id:  None,
        status:     options.status,
        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        fields:     fields.iter().map(to_domain_field).collect(),
    }
}

pub fn to_domain_field(field: &SchemaField) -> DomainFieldSchema {
    let mut out = DomainFieldSchema::new(field.name.clone(), field.label.clone(), field.kind.field_type());
    out.required = field.required;
    out.list_in_table = field.list_visible;
    out.unique_key = field.unique_key;
    out.rules = field.rules.clone();

    match &field.kind {
        FieldKind::Select { options } | FieldKind::CheckboxGroup { options } => {
            out.options = Some(options.clone());
        }
        FieldKind::Array { item_type } => {
            out.item_type = Some(*item_type);
        }
        FieldKind::Object { object_fields } => {
            out.object_fields = Some(object_fields.iter().map(to_domain_field).collect());
        }
        FieldKind::ArrayObject { item_object_fields } => {
            out.object_fields = Some(item_object_fields.iter().map(to_domain_field).collect());
        }
        FieldKind::String
        | FieldKind::Textarea
        | FieldKind::Markdown
        | FieldKind::Json
        | FieldKind::Image
        | FieldKind::ArrayImage
        | FieldKind::Number
        | FieldKind::Switch => {}
    }
    out
}
