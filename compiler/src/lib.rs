//! protoform-compiler
//!
//! This crate implements:
//!  1) Block extraction and statement assembly for `.proto` form sources,
//!  2) Field / enum-value parsing with comment and option annotations,
//!  3) Type resolution into renderer-ready schema fields, plus a verifier
//!     (name collisions, unknown types, recursive messages),
//!  4) Root selection and domain / runtime schema assembly,
//!  5) A recursive record validator and the `visibleWhen` expression language,
//!  6) Error types (`FormError`) and the `FieldShape` trait.

pub mod error;
pub mod types;
pub mod utils;
pub mod blocks;
pub mod statements;
pub mod annotations;
pub mod parser;
pub mod resolver;
pub mod verifier;
pub mod root;
pub mod compiler;
pub mod runtime;
pub mod traits;
pub mod validator;
pub mod tokenizer;
pub mod visibility;

pub use compiler::{compile, compile_source, compile_with, try_compile, CompileOptions, Compilation};
pub use error::FormError;
pub use parser::parse_schema;
pub use root::pick_root;
pub use runtime::to_runtime_schema;
pub use validator::{validate, validate_runtime, ValidationError, Violation};
pub use visibility::evaluate;
