//! Reading documents from disk or from already-parsed JSON.

use serde_json::Value;
use std::path::Path;

use crate::document::Document;
use crate::error::Error;

const KNOWN_METHODS: [&str; 8] = [
    "get", "post", "put", "delete", "patch", "options", "head", "trace",
];

/// Drop path-item keys that are neither HTTP verbs, structural fields nor
/// vendor extensions. Converters occasionally emit custom verbs that the
/// typed model has no slot for; they would otherwise leak into `extra` and
/// reappear on serialization.
fn strip_unknown_path_keys(value: &mut Value) {
    let Some(paths) = value.get_mut("paths").and_then(Value::as_object_mut) else {
        return;
    };
    for item in paths.values_mut() {
        let Some(obj) = item.as_object_mut() else {
            continue;
        };
        let keys: Vec<String> = obj.keys().cloned().collect();
        for key in keys {
            let lower = key.to_ascii_lowercase();
            let keep = matches!(
                lower.as_str(),
                "summary" | "description" | "servers" | "parameters" | "$ref"
            ) || KNOWN_METHODS.contains(&lower.as_str())
                || key.starts_with("x-");
            if !keep {
                obj.remove(&key);
            }
        }
    }
}

/// Build a [`Document`] from an already-parsed JSON value.
pub fn document_from_value(mut value: Value) -> Result<Document, Error> {
    strip_unknown_path_keys(&mut value);
    Ok(serde_json::from_value(value)?)
}

/// Load a document from a `.yaml`/`.yml` or `.json` file.
pub fn load_document(file_path: impl AsRef<Path>) -> Result<Document, Error> {
    let file_path = file_path.as_ref();
    let content = std::fs::read_to_string(file_path)?;
    let is_yaml = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    let value: Value = if is_yaml {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    document_from_value(value)
}
