//! The renderer's component-type lookup, injected rather than global.

use std::collections::HashMap;

use protoform_schema::{DomainFieldSchema, RuntimeFormSchema};

/// Component types the stock renderer registers at startup.
pub const DEFAULT_COMPONENT_TYPES: [&str; 14] = [
    "string",
    "textarea",
    "markdown",
    "json",
    "number",
    "select",
    "checkbox",
    "checkbox-group",
    "switch",
    "object",
    "array",
    "array<object>",
    "image",
    "array-image",
];

pub fn default_component_types() -> &'static [&'static str] {
    &DEFAULT_COMPONENT_TYPES
}

pub trait ComponentRegistry {
    fn has_component(&self, component_type: &str) -> bool;
}

/// Component-type name -> widget of the host renderer.
#[derive(Debug, Clone)]
pub struct MapRegistry<C> {
    components: HashMap<String, C>,
}

impl<C> Default for MapRegistry<C> {
    fn default() -> Self {
        MapRegistry { components: HashMap::new() }
    }
}

impl<C> MapRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the component previously registered under `component_type`.
    pub fn register(&mut self, component_type: impl Into<String>, component: C) -> Option<C> {
        self.components.insert(component_type.into(), component)
    }

    pub fn get(&self, component_type: &str) -> Option<&C> {
        self.components.get(component_type)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl<C: Clone> MapRegistry<C> {
    /// Registers `component` under every default component type.
    pub fn with_defaults(component: C) -> Self {
        let mut registry = Self::new();
        for ty in default_component_types() {
            registry.register(*ty, component.clone());
        }
        registry
    }
}

impl<C> ComponentRegistry for MapRegistry<C> {
    fn has_component(&self, component_type: &str) -> bool {
        self.components.contains_key(component_type)
    }
}

fn collect_nested<R: ComponentRegistry + ?Sized>(fields: &[DomainFieldSchema], registry: &R, out: &mut Vec<String>) {
    for field in fields {
        let ty = field.field_type.as_str();
        if !registry.has_component(ty) && !out.iter().any(|m| m == ty) {
            out.push(ty.to_string());
        }
        if let Some(children) = &field.object_fields {
            collect_nested(children, registry, out);
        }
    }
}

/// Component types used by `runtime` (nested object fields included) that
/// `registry` cannot render, in first-use order.
pub fn missing_components<R: ComponentRegistry + ?Sized>(runtime: &RuntimeFormSchema, registry: &R) -> Vec<String> {
    let mut out = Vec::new();
    for field in &runtime.fields {
        let ty = field.component_type.as_str();
        if !registry.has_component(ty) && !out.iter().any(|m| m == ty) {
            out.push(ty.to_string());
        }
        if let Some(children) = &field.props.object_fields {
            collect_nested(children, registry, &mut out);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use protoform_compiler::{compile, to_runtime_schema};

    #[test]
    fn test_register_and_get() {
        let mut registry = MapRegistry::new();
        assert!(registry.register("string", "Input").is_none());
        assert_eq!(registry.register("string", "TextInput"), Some("Input"));
        assert_eq!(registry.get("string"), Some(&"TextInput"));
        assert!(registry.has_component("string"));
        assert!(!registry.has_component("json"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_with_defaults_registers_each_default_type() {
        let registry = MapRegistry::with_defaults(0u8);
        assert_eq!(registry.len(), default_component_types().len());
        for ty in default_component_types() {
            assert!(registry.has_component(ty), "{} not registered", ty);
        }
        assert!(!registry.has_component("date"));
    }

    #[test]
    fn test_defaults_cover_every_compiled_kind() {
        let idl = r#"
        enum Tag { A = 0; B = 1; }
        message Inner { string note = 1 [(ui_widget) = "markdown"]; }
        message KitchenSinkForm {
          string a = 1;
          int64 b = 2;
          bool c = 3;
          Tag d = 4;
          repeated Tag e = 5;
          Inner f = 6;
          repeated Inner g = 7;
          repeated string h = 8 [(ui_widget) = "image"];
          string i = 9 [(ui_widget) = "json"];
        }
        "#;
        let runtime = to_runtime_schema(&compile("kitchen-sink", idl).unwrap());
        let registry = MapRegistry::with_defaults(());
        assert!(missing_components(&runtime, &registry).is_empty());
    }

    #[test]
    fn test_missing_components_recurse_into_objects() {
        let idl = r#"
        message Inner { string note = 1 [(ui_widget) = "markdown"]; bool on = 2; }
        message OuterForm { string title = 1; Inner inner = 2; }
        "#;
        let runtime = to_runtime_schema(&compile("outer", idl).unwrap());
        let mut registry = MapRegistry::new();
        registry.register("string", ());
        assert_eq!(
            missing_components(&runtime, &registry),
            vec!["object".to_string(), "markdown".to_string(), "switch".to_string()]
        );
    }
}
