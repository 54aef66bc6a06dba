//! Form schema definitions shared by the protoform compiler, the record
//! validator and renderers.
//!
//! Two shapes live here:
//!
//! - [`DomainFormSchema`]: the versioned, persisted form produced by compiling
//!   an IDL source.
//! - [`RuntimeFormSchema`]: the renderer-facing projection derived from a
//!   domain schema on demand.
//!
//! ```
//! use protoform_schema::*;
//!
//! let schema: DomainFormSchema = serde_json::from_str(r#"{
//!     "formName": "InvoiceForm",
//!     "version": "1.0.0",
//!     "status": "published",
//!     "createdAt": "2024-01-01T00:00:00Z",
//!     "fields": [{ "key": "number", "label": "Number", "fieldType": "string", "uniqueKey": true }]
//! }"#).unwrap();
//!
//! assert_eq!(schema.fields[0].field_type, FieldType::String);
//! assert_eq!(schema.unique_key_field(), Some("number"));
//! ```

pub mod domain;
pub mod runtime;

pub use domain::*;
pub use runtime::*;
