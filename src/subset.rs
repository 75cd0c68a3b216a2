//! Building a subset document from matched operations, including the
//! transitive reference closure over its components.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::document::{collect_refs, Document, Info, Operation, OperationKind};
use crate::error::Error;
use crate::filter::{find_operations, Predicate};

/// Name under which the subset's OAuth2 scheme is registered.
pub const SECURITY_SCHEME_NAME: &str = "azureaadv2";
const AUTHORIZATION_URL: &str = "https://login.microsoftonline.com/common/oauth2/v2.0/authorize";
const TOKEN_URL: &str = "https://login.microsoftonline.com/common/oauth2/v2.0/token";

fn service_url(label: &str) -> String {
    format!("https://graph.microsoft.com/{}/", label)
}

/// Matches `name={param}` placeholder assignments inside a path key.
static FUNCTION_PARAMETER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z0-9_.-]+)=\{([A-Za-z0-9_.-]+)\}")
        .expect("function parameter pattern is valid")
});

/// Build a new document holding every operation of `source` accepted by
/// `predicate`, plus every component transitively referenced from them.
///
/// The source is never mutated. Zero matched operations is a not-found
/// error; a reference that resolves nowhere in the source is fatal.
pub fn build_subset(
    source: &Document,
    predicate: &Predicate,
    label: &str,
) -> Result<Document, Error> {
    let mut target = subset_skeleton(source, label);

    let matched = find_operations(source, predicate);
    for (path, method, operation) in &matched {
        let key = if operation.kind() == Some(OperationKind::Function) {
            format_function_path(path, operation)
        } else {
            (*path).to_string()
        };
        target
            .paths
            .entry(key)
            .or_default()
            .set_operation(method, (*operation).clone());
    }
    if target.paths.is_empty() {
        return Err(Error::NotFound(
            "no operations matched the requested filter".to_string(),
        ));
    }

    copy_references(source, &mut target)?;
    info!(
        operations = matched.len(),
        paths = target.paths.len(),
        schemas = target.components.schemas.len(),
        "built subset document"
    );
    Ok(target)
}

/// The empty target document: source title/version, the fixed OAuth2
/// scheme, its document-level requirement and one label-derived server.
fn subset_skeleton(source: &Document, label: &str) -> Document {
    let mut target = Document {
        openapi: source.openapi.clone(),
        info: Info {
            title: source.info.title.clone(),
            version: source.info.version.clone(),
            extra: Map::new(),
        },
        ..Document::default()
    };
    target.servers.push(json!({ "url": service_url(label) }));
    target.components.security_schemes.insert(
        SECURITY_SCHEME_NAME.to_string(),
        json!({
            "type": "oauth2",
            "flows": {
                "authorizationCode": {
                    "authorizationUrl": AUTHORIZATION_URL,
                    "tokenUrl": TOKEN_URL,
                    "scopes": {}
                }
            }
        }),
    );
    target.security.push(json!({ SECURITY_SCHEME_NAME: [] }));
    target
}

/// Rewrite `name={param}` to `name='{param}'` in a function path key for
/// every placeholder whose operation parameter is a plain string (no
/// `format`). Each placeholder is evaluated independently.
pub fn format_function_path(path: &str, operation: &Operation) -> String {
    FUNCTION_PARAMETER
        .replace_all(path, |caps: &regex::Captures<'_>| {
            let placeholder = &caps[2];
            if is_plain_string_parameter(operation, placeholder) {
                format!("{}='{{{}}}'", &caps[1], placeholder)
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

fn is_plain_string_parameter(operation: &Operation, name: &str) -> bool {
    operation.parameters.iter().any(|parameter| {
        parameter.name.as_deref() == Some(name)
            && parameter.schema.as_ref().is_some_and(|schema| {
                schema.get("type").and_then(Value::as_str) == Some("string")
                    && schema.get("format").is_none()
            })
    })
}

/// Copy every component `target` references out of `source`, repeating the
/// full scan until a pass adds nothing: newly copied schemas can reference
/// further schemas.
pub fn copy_references(source: &Document, target: &mut Document) -> Result<(), Error> {
    let mut passes = 0usize;
    loop {
        let snapshot = serde_json::to_value(&*target)?;
        let mut wanted = BTreeSet::new();
        collect_refs(&snapshot, &mut wanted);

        let mut added = 0usize;
        for (kind, name) in wanted {
            if target.components.by_kind(kind).contains_key(&name) {
                continue;
            }
            let Some(component) = source.components.by_kind(kind).get(&name) else {
                return Err(Error::Inconsistent(format!(
                    "reference to undefined {} '{}'",
                    kind, name
                )));
            };
            target
                .components
                .by_kind_mut(kind)
                .insert(name, component.clone());
            added += 1;
        }
        passes += 1;
        if added == 0 {
            break;
        }
    }
    debug!(passes, "reference closure reached fixed point");
    Ok(())
}
