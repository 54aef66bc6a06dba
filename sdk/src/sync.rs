//! Recompiles every app source and brings the form store in line with it.

use std::collections::BTreeMap;

use protoform_compiler::{compile_with, CompileOptions};
use serde::Serialize;

use crate::manifest::IdlSource;
use crate::store::FormStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedForm {
    pub app_id:    String,
    pub form_name: String,
    pub version:   String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFailure {
    pub app_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub synced:  Vec<SyncedForm>,
    /// Apps that produced no schema; their stored rows are untouched.
    pub skipped: Vec<String>,
    pub failed:  Vec<SyncFailure>,
    /// Stale rows deleted across all apps.
    pub removed: usize,
}

/// Sources are processed in order and independently: a failing app is
/// recorded and the rest continue. Rerunning with the same sources converges
/// to the same store contents.
pub fn sync<S: FormStore + ?Sized>(
    tenant: &str,
    sources: &[IdlSource],
    store: &mut S,
    options: &CompileOptions,
) -> SyncReport {
    let mut report = SyncReport::default();
    let mut synced_by_app: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for source in sources {
        let Some(schema) = compile_with(&source.app_id, &source.text, options) else {
            report.skipped.push(source.app_id.clone());
            continue;
        };

        if let Err(e) = store.upsert(tenant, &source.app_id, &schema) {
            log::error!("Failed to sync {}: {}", source.file_name, e);
            report.failed.push(SyncFailure { app_id: source.app_id.clone(), reason: e.to_string() });
            continue;
        }

        log::info!("Synced form {}/{}@{}", source.app_id, schema.form_name, schema.version);
        synced_by_app
            .entry(source.app_id.clone())
            .or_default()
            .push(schema.form_name.clone());
        report.synced.push(SyncedForm {
            app_id:    source.app_id.clone(),
            form_name: schema.form_name,
            version:   schema.version,
        });
    }

    for (app_id, names) in &synced_by_app {
        match store.keep_only(tenant, app_id, names) {
            Ok(removed) => {
                if removed > 0 {
                    log::info!("Removed {} stale form(s) of {}", removed, app_id);
                }
                report.removed += removed;
            }
            Err(e) => {
                log::error!("Failed to prune forms of {}: {}", app_id, e);
                report.failed.push(SyncFailure { app_id: app_id.clone(), reason: e.to_string() });
            }
        }
    }

    report
}
