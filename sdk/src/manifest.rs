//! IDL source discovery and the app catalogue built from it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use lazy_static::lazy_static;
use protoform_compiler::resolver::SchemaField;
use protoform_compiler::utils::titleize;
use protoform_compiler::{compile_source, CompileOptions, FormError};
use protoform_schema::FormStatus;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    static ref APP_NAME:        Regex = file_option_regex("app_name");
    static ref APP_DESCRIPTION: Regex = file_option_regex("app_description");
    static ref PROTO_EXTENSION: Regex = Regex::new(r"(?i)\.proto$").unwrap();
}

fn file_option_regex(key: &str) -> Regex {
    Regex::new(&format!(r#"(?i)\((?:[\w.]+\.)?{}\)\s*=\s*"((?:\\.|[^"])*)""#, key)).unwrap()
}

/// One `.proto` file; the app id is the file name without its extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdlSource {
    pub app_id:    String,
    pub file_name: String,
    pub text:      String,
}

impl IdlSource {
    pub fn new(file_name: impl Into<String>, text: impl Into<String>) -> Self {
        let file_name = file_name.into();
        IdlSource {
            app_id: PROTO_EXTENSION.replace(&file_name, "").into_owned(),
            file_name,
            text: text.into(),
        }
    }

    pub fn read(path: &Path) -> Result<Self, FormError> {
        let text = fs::read_to_string(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(IdlSource::new(file_name, text))
    }

    /// `common.*` files hold shared types, not apps.
    pub fn is_shared(&self) -> bool {
        self.file_name.starts_with("common.")
    }
}

/// Every app source in `dir`, sorted by file name.
pub fn discover_sources(dir: &Path) -> Result<Vec<IdlSource>, FormError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_proto = path
            .file_name()
            .map(|n| PROTO_EXTENSION.is_match(&n.to_string_lossy()))
            .unwrap_or(false);
        if path.is_file() && is_proto {
            paths.push(path);
        }
    }
    paths.sort();

    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        let source = IdlSource::read(&path)?;
        if source.is_shared() {
            log::debug!("skipping shared source {}", source.file_name);
            continue;
        }
        sources.push(source);
    }
    Ok(sources)
}

fn file_option(text: &str, re: &Regex) -> Option<String> {
    let raw = re.captures(text)?.get(1)?.as_str();
    Some(raw.replace("\\\"", "\"").replace("\\\\", "\\"))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppEntry {
    pub app_id:      String,
    pub name:        String,
    pub description: String,
    pub proto_file:  String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestSchema {
    pub fields: Vec<SchemaField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestForm {
    #[serde(rename = "_id")]
    pub id:        String,
    pub app_id:    String,
    pub form_name: String,
    pub version:   String,
    pub status:    FormStatus,
    pub schema:    ManifestSchema,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub apps:         Vec<AppEntry>,
    pub forms_by_app: BTreeMap<String, Vec<ManifestForm>>,
}

/// Catalogue entry and root form of each source, apps sorted by id. Sources
/// without a root message are left out.
pub fn build_manifest(sources: &[IdlSource], options: &CompileOptions) -> Manifest {
    let mut manifest = Manifest::default();

    for source in sources.iter().filter(|s| !s.is_shared()) {
        let compilation = compile_source(&source.app_id, &source.text, options);
        let Some(root) = compilation.root else {
            continue;
        };

        manifest.apps.push(AppEntry {
            app_id:      source.app_id.clone(),
            name:        file_option(&source.text, &APP_NAME).unwrap_or_else(|| titleize(&source.app_id)),
            description: file_option(&source.text, &APP_DESCRIPTION)
                .unwrap_or_else(|| format!("Generated from {}", source.file_name)),
            proto_file:  source.file_name.clone(),
        });
        manifest.forms_by_app.insert(
            source.app_id.clone(),
            vec![ManifestForm {
                id:        format!("generated-{}-{}", source.app_id, root),
                app_id:    source.app_id.clone(),
                form_name: root,
                version:   options.version.clone(),
                status:    options.status,
                schema:    ManifestSchema { fields: compilation.fields },
            }],
        );
    }

    manifest.apps.sort_by(|a, b| a.app_id.cmp(&b.app_id));
    manifest
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_app_id_from_file_name() {
        let source = IdlSource::new("invoice-app.proto", "");
        assert_eq!(source.app_id, "invoice-app");
        assert!(!source.is_shared());
        assert!(IdlSource::new("common.types.proto", "").is_shared());
    }

    #[test]
    fn test_manifest_entries() {
        let sources = vec![
            IdlSource::new(
                "zoo.proto",
                r#"
                option (app_name) = "Zoo \"Keeper\"";
                option (lowcode.app_description) = "Animals";
                message ZooForm { string name = 1; }
                "#,
            ),
            IdlSource::new("blog_post.proto", "message Post { string title = 1; }"),
            IdlSource::new("empty.proto", "enum E { A = 0; }"),
            IdlSource::new("common.proto", "message Shared { string x = 1; }"),
        ];
        let manifest = build_manifest(&sources, &CompileOptions::default());

        let apps: Vec<_> = manifest
            .apps
            .iter()
            .map(|a| (a.app_id.as_str(), a.name.as_str(), a.description.as_str()))
            .collect();
        assert_eq!(
            apps,
            vec![
                ("blog_post", "Blog Post", "Generated from blog_post.proto"),
                ("zoo", "Zoo \"Keeper\"", "Animals"),
            ]
        );

        let rendered = serde_json::to_value(&manifest).unwrap();
        assert_eq!(
            rendered["formsByApp"]["blog_post"][0],
            json!({
                "_id": "generated-blog_post-Post",
                "appId": "blog_post",
                "formName": "Post",
                "version": "1.0.0",
                "status": "published",
                "schema": { "fields": [{
                    "name": "title",
                    "label": "Title",
                    "required": false,
                    "rules": [],
                    "list_visible": false,
                    "unique_key": false,
                    "type": "string"
                }]}
            })
        );
    }

    #[test]
    fn test_discover_sources_sorted_and_filtered() {
        let dir = std::env::temp_dir().join(format!("protoform-discover-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("b.proto"), "message B { string x = 1; }").unwrap();
        fs::write(dir.join("a.proto"), "message A { string x = 1; }").unwrap();
        fs::write(dir.join("common.proto"), "message C { string x = 1; }").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let sources = discover_sources(&dir).unwrap();
        let ids: Vec<_> = sources.iter().map(|s| s.app_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        fs::remove_dir_all(&dir).unwrap();
    }
}
