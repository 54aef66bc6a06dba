//! Persistence of compiled forms, one row per (tenant, app, form name).

use std::collections::BTreeMap;

use protoform_compiler::FormError;
use protoform_schema::{DomainFormSchema, FormStatus};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredForm {
    pub tenant_id: String,
    pub app_id:    String,
    pub form_name: String,
    pub version:   String,
    pub status:    FormStatus,
    pub schema:    DomainFormSchema,
}

pub trait FormStore {
    /// Inserts or replaces the row for `(tenant, app, form.form_name)`,
    /// taking over its version, status and schema.
    fn upsert(&mut self, tenant: &str, app: &str, form: &DomainFormSchema) -> Result<(), FormError>;

    /// Deletes every form of `(tenant, app)` whose name is not in `names`.
    /// Returns how many rows were removed.
    fn keep_only(&mut self, tenant: &str, app: &str, names: &[String]) -> Result<usize, FormError>;
}

type RowKey = (String, String, String);

#[derive(Debug, Clone, Default)]
pub struct MemoryFormStore {
    rows: BTreeMap<RowKey, StoredForm>,
}

impl MemoryFormStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tenant: &str, app: &str, form_name: &str) -> Option<&StoredForm> {
        self.rows.get(&(tenant.to_string(), app.to_string(), form_name.to_string()))
    }

    /// Forms of one app, ordered by name.
    pub fn forms<'s>(&'s self, tenant: &'s str, app: &'s str) -> impl Iterator<Item = &'s StoredForm> + 's {
        self.rows
            .values()
            .filter(move |row| row.tenant_id == tenant && row.app_id == app)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FormStore for MemoryFormStore {
    fn upsert(&mut self, tenant: &str, app: &str, form: &DomainFormSchema) -> Result<(), FormError> {
        let mut schema = form.clone();
        schema.tenant_id = Some(tenant.to_string());
        let row = StoredForm {
            tenant_id: tenant.to_string(),
            app_id:    app.to_string(),
            form_name: form.form_name.clone(),
            version:   form.version.clone(),
            status:    form.status,
            schema,
        };
        self.rows
            .insert((tenant.to_string(), app.to_string(), form.form_name.clone()), row);
        Ok(())
    }

    fn keep_only(&mut self, tenant: &str, app: &str, names: &[String]) -> Result<usize, FormError> {
        let before = self.rows.len();
        self.rows
            .retain(|(t, a, name), _| t != tenant || a != app || names.contains(name));
        Ok(before - self.rows.len())
    }
}
