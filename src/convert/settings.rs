//! Organization-level conversion settings — field-mapping configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::form::path;

/// Mapping tables from target-field names to dot-paths into the session's
/// form tree. Absence of a table disables that half of the conversion.
///
/// Read-only to the core; owned by the organization's template and persisted
/// as a raw JSON blob.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_mapping: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_mapping: Option<HashMap<String, String>>,
}

impl ConversionSettings {
    /// Parse settings from their persisted form. `None` means the template
    /// carries no mapping configuration at all.
    pub fn from_raw(raw: Option<&Value>) -> Result<Self, serde_json::Error> {
        match raw {
            Some(value) => serde_json::from_value(value.clone()),
            None => Ok(Self::default()),
        }
    }
}

/// Resolve a target field against a mapping table and the form tree.
///
/// Uses the table's dot-path for the field when one is configured, falling
/// back to a same-named top-level path otherwise. Absence is `None`.
pub fn lookup<'a>(
    mapping: &HashMap<String, String>,
    tree: &'a Value,
    field: &str,
) -> Option<&'a Value> {
    let mapped = mapping.get(field).map(String::as_str).unwrap_or(field);
    path::get(tree, mapped)
}

/// [`lookup`] narrowed to nonempty strings, trimmed.
pub fn lookup_str<'a>(
    mapping: &HashMap<String, String>,
    tree: &'a Value,
    field: &str,
) -> Option<&'a str> {
    lookup(mapping, tree, field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
