//! Structural validation: the minimum precondition before any merge or
//! import proceeds.

use serde_json::Value;

use crate::{FormatError, FormatResult};

/// Checks the raw manifest JSON: must be an object with a non-empty
/// `version` string.
pub(crate) fn check_manifest_value(value: &Value) -> FormatResult<()> {
    let version = value
        .get("version")
        .and_then(Value::as_str)
        .ok_or_else(|| FormatError::InvalidManifest("missing version field".into()))?;
    if version.is_empty() {
        return Err(FormatError::InvalidManifest("empty version field".into()));
    }
    Ok(())
}

/// Checks the raw account JSON (when present): must carry a non-empty id.
pub(crate) fn check_account_value(value: &Value) -> FormatResult<()> {
    let id = value
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| FormatError::Validation("account record has no id".into()))?;
    if id.is_empty() {
        return Err(FormatError::Validation("account record has empty id".into()));
    }
    Ok(())
}

/// Checks the raw project index JSON: must be an array.
pub(crate) fn check_project_index_value(value: &Value) -> FormatResult<()> {
    if !value.is_array() {
        return Err(FormatError::Validation("projects is not an array".into()));
    }
    Ok(())
}

/// Validates an in-memory bundle before it is merged or imported.
///
/// A bundle is structurally valid iff the manifest carries a non-empty
/// version string and every indexed project id is unique.
pub fn validate_bundle(bundle: &folio_types::Bundle) -> FormatResult<()> {
    if bundle.manifest.version.is_empty() {
        return Err(FormatError::InvalidManifest("empty version field".into()));
    }
    let mut seen = std::collections::HashSet::new();
    for project in &bundle.projects {
        if !seen.insert(project.id) {
            return Err(FormatError::Validation(format!(
                "duplicate project id {} in bundle",
                project.id
            )));
        }
    }
    Ok(())
}
