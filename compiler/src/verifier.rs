use std::collections::HashMap;
use std::fmt;

use crate::{
    resolver::TypeRef,
    types::{EnumMap, MessageMap},
    utils::quote,
};

/// A problem found in a parsed source. Compilation still proceeds; resolution
/// drops whatever a diagnostic points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    UnknownType { message: String, field: String, type_: String },
    RecursiveMessage { name: String },
    NameCollision { name: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownType { message, field, type_ } => write!(
                f,
                "The type {} is not defined for field {} of {}",
                quote(type_), quote(field), quote(message)
            ),
            Diagnostic::RecursiveMessage { name } => {
                write!(f, "Recursive nesting of {} is not supported", quote(name))
            }
            Diagnostic::NameCollision { name } => {
                write!(f, "The type {} is defined both as a message and an enum", quote(name))
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

pub fn verify_schema(messages: &MessageMap, enums: &EnumMap) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    // 1) Names used by both an enum and a message
    for name in messages.keys() {
        if enums.contains_key(name) {
            diagnostics.push(Diagnostic::NameCollision { name: name.clone() });
        }
    }

    // 2) Field types that resolve to nothing
    for message in messages.values() {
        for field in &message.fields {
            if TypeRef::lookup(&field.type_, messages, enums).is_none() {
                diagnostics.push(Diagnostic::UnknownType {
                    message: message.name.clone(),
                    field:   field.name.clone(),
                    type_:   field.type_.clone(),
                });
            }
        }
    }

    // 3) Messages that contain themselves, directly or transitively
    fn check_recursion(
        name: &str,
        messages: &MessageMap,
        enums: &EnumMap,
        state: &mut HashMap<String, Visit>,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        match state.get(name) {
            Some(Visit::InProgress) => {
                let diagnostic = Diagnostic::RecursiveMessage { name: name.to_string() };
                if !diagnostics.contains(&diagnostic) {
                    diagnostics.push(diagnostic);
                }
                return;
            }
            Some(Visit::Done) => return,
            None => {}
        }
        let Some(message) = messages.get(name) else {
            return;
        };
        state.insert(name.to_string(), Visit::InProgress);
        for field in &message.fields {
            // enums shadow messages of the same name during resolution
            if let Some(TypeRef::Message(def)) = TypeRef::lookup(&field.type_, messages, enums) {
                check_recursion(&def.name, messages, enums, state, diagnostics);
            }
        }
        state.insert(name.to_string(), Visit::Done);
    }

    let mut state = HashMap::new();
    for name in messages.keys() {
        check_recursion(name, messages, enums, &mut state, &mut diagnostics);
    }

    diagnostics
}
