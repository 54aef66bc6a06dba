//! protoform
//!
//! Runtime support around compiled forms:
//!
//! - compiler entry points and schema types (re-exported),
//! - the injected component registry (`registry`),
//! - the form store collaborator and resync driver (`store`, `sync`),
//! - IDL source discovery and the app manifest (`manifest`).

pub mod manifest;
pub mod registry;
pub mod store;
pub mod sync;

pub use protoform_compiler::{
    compile, compile_with, evaluate, pick_root, to_runtime_schema, try_compile, validate, validate_runtime,
    CompileOptions, FormError, ValidationError, Violation,
};
pub use protoform_schema::{DomainFieldSchema, DomainFormSchema, FieldType, RuntimeFormSchema};

use serde_json::{Map, Value};

/// Parses a submitted record; anything but a JSON object is rejected.
/// `origin` names the record in the error.
pub fn parse_record(origin: &str, text: &str) -> Result<Map<String, Value>, FormError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(record) => Ok(record),
        _ => Err(FormError::InvalidRecord(origin.to_string())),
    }
}

/// Compiles one source straight to its pretty-printed runtime schema.
pub fn compile_to_runtime_json(app_id: &str, text: &str, options: &CompileOptions) -> Result<String, FormError> {
    let domain = try_compile(app_id, text, options)?;
    Ok(serde_json::to_string_pretty(&to_runtime_schema(&domain))?)
}

pub mod error {
    pub use protoform_compiler::error::FormError;
    pub use protoform_compiler::validator::{ValidationError, Violation};
}

pub mod schema {
    pub use protoform_schema::*;
}
