//! Output style profiles.
//!
//! A styled document is always produced from a deep copy; the input is never
//! mutated. Rewriting runs through one generic traversal parameterized by
//! per-node-kind callbacks, so each profile is just a table of closures plus
//! a handful of document-level fixups.

use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;
use std::str::FromStr;
use tracing::{info, warn};

use crate::document::{collect_refs, ComponentKind, Document, Operation};
use crate::error::Error;

/// The four output-shaping profiles, each tailored to one downstream
/// generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// No structural change beyond the subset itself.
    Plain,
    /// Cmdlet generator: compositions flattened, operation ids synthesized,
    /// version normalized, root path dropped.
    PowerShell,
    /// Low-code connector generator: composition flattening only.
    PowerPlatform,
    /// Interactive autocomplete: optionally stripped of request/response
    /// bodies.
    GeAutocomplete,
}

impl FromStr for Style {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Error> {
        match value.to_ascii_lowercase().as_str() {
            "plain" => Ok(Style::Plain),
            "powershell" => Ok(Style::PowerShell),
            "powerplatform" => Ok(Style::PowerPlatform),
            "geautocomplete" => Ok(Style::GeAutocomplete),
            _ => Err(Error::UnknownStyle(value.to_string())),
        }
    }
}

impl std::fmt::Display for Style {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Style::Plain => "Plain",
            Style::PowerShell => "PowerShell",
            Style::PowerPlatform => "PowerPlatform",
            Style::GeAutocomplete => "GEAutocomplete",
        };
        write!(f, "{}", name)
    }
}

/// Knobs honored by individual styles.
#[derive(Debug, Clone)]
pub struct StyleOptions {
    /// GEAutocomplete only: keep request/response bodies. Defaults to true.
    pub include_request_body: bool,
}

impl Default for StyleOptions {
    fn default() -> Self {
        StyleOptions {
            include_request_body: true,
        }
    }
}

static VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d\.\d").expect("version pattern is valid"));

// One-off description fix carried over from the upstream service: this
// property's description contains a bare `<#>` token that breaks the cmdlet
// generator's doc parser. Recorded technical debt, not a general rule.
const POUND_FIX_SCHEMA: &str = "microsoft.graph.workbookRangeView";
const POUND_FIX_PROPERTY: &str = "cellAddresses";

/// Apply `style` to a deep copy of `source`.
///
/// Fails with a not-found error if the styled result has zero paths (the
/// PowerShell root-path removal can eliminate the only matched path).
pub fn apply_style(
    source: &Document,
    style: Style,
    options: &StyleOptions,
) -> Result<Document, Error> {
    let mut doc = source.clone();
    match style {
        Style::Plain => {}
        Style::PowerPlatform => {
            let mut flatten = |schema: &mut Value| flatten_compositions(schema);
            walk_document(&mut doc, Some(&mut flatten), None);
        }
        Style::PowerShell => {
            let mut used_ids: BTreeSet<String> = BTreeSet::new();
            let mut flatten = |schema: &mut Value| flatten_compositions(schema);
            let mut rename = |method: &Method, path: &str, operation: &mut Operation| {
                if let Some(id) = format_operation_id(method, path, operation) {
                    operation.operation_id = Some(dedupe_id(id, &mut used_ids));
                }
            };
            walk_document(&mut doc, Some(&mut flatten), Some(&mut rename));
            if !VERSION_PATTERN.is_match(&doc.info.version) {
                doc.info.version = format!("v1.0-{}", doc.info.version);
            }
            doc.paths.remove("/");
            escape_pound_token(&mut doc);
        }
        Style::GeAutocomplete => {
            if !options.include_request_body {
                let mut strip = |_: &Method, _: &str, operation: &mut Operation| {
                    strip_operation_content(operation);
                };
                walk_document(&mut doc, None, Some(&mut strip));
                for body in doc.components.request_bodies.values_mut() {
                    remove_content(body);
                }
                for response in doc.components.responses.values_mut() {
                    remove_content(response);
                }
                prune_unreachable_components(&mut doc)?;
            }
        }
    }
    if doc.paths.is_empty() {
        return Err(Error::NotFound(format!(
            "styling '{}' produced a document with no paths",
            style
        )));
    }
    info!(style = %style, paths = doc.paths.len(), "applied style");
    Ok(doc)
}

/// One traversal over every rewritable site of a document. `on_operation`
/// runs once per (verb, path, operation); `on_schema` runs for every schema
/// reachable from any schema site, nested members included.
fn walk_document(
    doc: &mut Document,
    mut on_schema: Option<&mut dyn FnMut(&mut Value)>,
    mut on_operation: Option<&mut dyn FnMut(&Method, &str, &mut Operation)>,
) {
    for (path, item) in doc.paths.iter_mut() {
        if let Some(callback) = on_schema.as_deref_mut() {
            for parameter in item.parameters.iter_mut() {
                if let Some(schema) = parameter.get_mut("schema") {
                    visit_schema(schema, callback);
                }
            }
        }
        for (method, operation) in item.operations_mut() {
            if let Some(callback) = on_operation.as_deref_mut() {
                callback(&method, path, operation);
            }
            if let Some(callback) = on_schema.as_deref_mut() {
                for parameter in operation.parameters.iter_mut() {
                    if let Some(schema) = parameter.schema.as_mut() {
                        visit_schema(schema, callback);
                    }
                }
                if let Some(body) = operation.request_body.as_mut() {
                    visit_content_schemas(body, callback);
                }
                for response in operation.responses.values_mut() {
                    visit_content_schemas(response, callback);
                }
            }
        }
    }
    if let Some(callback) = on_schema.as_deref_mut() {
        for schema in doc.components.schemas.values_mut() {
            visit_schema(schema, callback);
        }
        for parameter in doc.components.parameters.values_mut() {
            if let Some(schema) = parameter.get_mut("schema") {
                visit_schema(schema, callback);
            }
        }
        for body in doc.components.request_bodies.values_mut() {
            visit_content_schemas(body, callback);
        }
        for response in doc.components.responses.values_mut() {
            visit_content_schemas(response, callback);
        }
    }
}

/// Recurse into nested schema positions, then apply the callback to the
/// enclosing schema (post-order, so parents see already-rewritten members).
fn visit_schema(value: &mut Value, on_schema: &mut dyn FnMut(&mut Value)) {
    if let Some(obj) = value.as_object_mut() {
        if let Some(properties) = obj.get_mut("properties").and_then(Value::as_object_mut) {
            for property in properties.values_mut() {
                visit_schema(property, on_schema);
            }
        }
        if let Some(items) = obj.get_mut("items") {
            visit_schema(items, on_schema);
        }
        if let Some(additional) = obj.get_mut("additionalProperties") {
            if additional.is_object() {
                visit_schema(additional, on_schema);
            }
        }
        for keyword in ["allOf", "anyOf", "oneOf"] {
            if let Some(members) = obj.get_mut(keyword).and_then(Value::as_array_mut) {
                for member in members.iter_mut() {
                    visit_schema(member, on_schema);
                }
            }
        }
    }
    on_schema(value);
}

fn visit_content_schemas(value: &mut Value, on_schema: &mut dyn FnMut(&mut Value)) {
    if let Some(content) = value.get_mut("content").and_then(Value::as_object_mut) {
        for media in content.values_mut() {
            if let Some(schema) = media.get_mut("schema") {
                visit_schema(schema, on_schema);
            }
        }
    }
}

/// Collapse `anyOf`/`oneOf` on one schema.
///
/// The first member that is not a nullable wrapper is retained: its `$ref`,
/// `type` and `format` are hoisted onto the parent (without overwriting
/// anything the parent already states), and the parent becomes nullable when
/// any member was. A nullable wrapper is a member that is nullable itself
/// and carries no properties, no reference, no composition and no array
/// shape.
fn flatten_compositions(schema: &mut Value) {
    let Some(obj) = schema.as_object_mut() else {
        return;
    };
    for keyword in ["anyOf", "oneOf"] {
        let Some(removed) = obj.remove(keyword) else {
            continue;
        };
        let Value::Array(members) = removed else {
            continue;
        };
        if members.is_empty() {
            continue;
        }
        let nullable = members.iter().any(|member| {
            member
                .get("nullable")
                .and_then(Value::as_bool)
                .unwrap_or(false)
        });
        let retained = members
            .iter()
            .find(|member| !is_nullable_wrapper(member))
            .or_else(|| members.first());
        if let Some(Value::Object(member)) = retained {
            for key in ["$ref", "type", "format"] {
                if !obj.contains_key(key) {
                    if let Some(value) = member.get(key) {
                        obj.insert(key.to_string(), value.clone());
                    }
                }
            }
        }
        if nullable {
            obj.insert("nullable".to_string(), Value::Bool(true));
        }
    }
}

fn is_nullable_wrapper(member: &Value) -> bool {
    let Some(obj) = member.as_object() else {
        return false;
    };
    obj.get("nullable").and_then(Value::as_bool).unwrap_or(false)
        && !obj.contains_key("properties")
        && !obj.contains_key("$ref")
        && !obj.contains_key("items")
        && obj.get("type").and_then(Value::as_str) != Some("array")
        && !obj.contains_key("allOf")
        && !obj.contains_key("anyOf")
        && !obj.contains_key("oneOf")
}

/// Synthesize a cmdlet-friendly operation id from verb and path shape.
///
/// Plain paths get a dotted prefix of their literal segments, with the
/// singular form inserted after an indexed collection, and a
/// `<Verb><Target>` suffix. Bound actions/functions keep their short name
/// under the undotted prefix; `$ref` navigations gain a `ByRef` suffix.
fn format_operation_id(method: &Method, path: &str, operation: &Operation) -> Option<String> {
    let segments: Vec<&str> = path
        .trim_start_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    let last = *segments.last()?;

    if last == "$ref" {
        let literals: Vec<&str> = segments[..segments.len() - 1]
            .iter()
            .copied()
            .filter(|segment| !is_parameter(segment))
            .collect();
        let navigation = literals.last()?;
        let verb = verb_fragment(method, is_collection(navigation));
        let suffix = format!("{}{}ByRef", verb, capitalize(navigation));
        return Some(join_id(&literals[..literals.len() - 1].join("."), &suffix));
    }

    let bound = operation.kind().is_some()
        || (!is_parameter(last) && qualified_short_name(last).is_some());
    if bound && !is_parameter(last) {
        let short = qualified_short_name(last).unwrap_or(last);
        let prefix: Vec<&str> = segments[..segments.len() - 1]
            .iter()
            .copied()
            .filter(|segment| !is_parameter(segment))
            .collect();
        return Some(join_id(&prefix.join("."), short));
    }

    let mut parts: Vec<String> = Vec::new();
    let mut index = 0;
    while index < segments.len() {
        let segment = segments[index];
        if is_parameter(segment) {
            index += 1;
            continue;
        }
        parts.push(segment.to_string());
        if segments
            .get(index + 1)
            .is_some_and(|next| is_parameter(next))
        {
            parts.push(singularize(segment));
        }
        index += 1;
    }

    if is_parameter(last) {
        let target = capitalize(parts.last()?);
        let verb = verb_fragment(method, false);
        let prefix = parts.join(".");
        return Some(join_id(&prefix, &format!("{}{}", verb, target)));
    }

    let segment = parts.pop()?;
    let singular = singularize(&segment);
    let collection = singular != segment;
    let verb = verb_fragment(method, collection);
    let target = capitalize(if collection { &singular } else { &segment });
    let prefix = if parts.is_empty() {
        segment.clone()
    } else {
        parts.join(".")
    };
    Some(join_id(&prefix, &format!("{}{}", verb, target)))
}

fn join_id(prefix: &str, suffix: &str) -> String {
    if prefix.is_empty() {
        suffix.to_string()
    } else {
        format!("{}_{}", prefix, suffix)
    }
}

fn is_parameter(segment: &str) -> bool {
    segment.starts_with('{') && segment.ends_with('}')
}

fn is_collection(segment: &str) -> bool {
    singularize(segment) != segment
}

/// The short name of a namespace-qualified action/function segment, e.g.
/// `microsoft.graph.restore` → `restore` (any parameter list stripped).
fn qualified_short_name(segment: &str) -> Option<&str> {
    let name = segment.split('(').next().unwrap_or(segment);
    if name.contains('.') {
        name.rsplit('.').next()
    } else {
        None
    }
}

fn verb_fragment(method: &Method, collection: bool) -> String {
    match method.as_str() {
        "GET" => if collection { "List" } else { "Get" }.to_string(),
        "POST" => "Create".to_string(),
        "PATCH" => "Update".to_string(),
        "PUT" => "Set".to_string(),
        "DELETE" => "Remove".to_string(),
        other => capitalize(&other.to_ascii_lowercase()),
    }
}

fn singularize(word: &str) -> String {
    use cruet::*;
    let singular = word.to_singular();
    if singular.is_empty() {
        word.to_string()
    } else {
        singular
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Operation ids must stay unique in the styled output; collisions get a
/// numeric suffix.
fn dedupe_id(id: String, used: &mut BTreeSet<String>) -> String {
    if used.insert(id.clone()) {
        return id;
    }
    let mut counter = 1usize;
    loop {
        let candidate = format!("{}_{}", id, counter);
        if used.insert(candidate.clone()) {
            warn!(id = %id, renamed = %candidate, "operation id collision after restyling");
            return candidate;
        }
        counter += 1;
    }
}

fn escape_pound_token(doc: &mut Document) {
    let Some(description) = doc
        .components
        .schemas
        .get_mut(POUND_FIX_SCHEMA)
        .and_then(|schema| schema.get_mut("properties"))
        .and_then(|properties| properties.get_mut(POUND_FIX_PROPERTY))
        .and_then(|property| property.get_mut("description"))
    else {
        return;
    };
    if let Some(text) = description.as_str() {
        if text.contains("<#>") {
            *description = Value::String(text.replace("<#>", "<#/>"));
        }
    }
}

fn strip_operation_content(operation: &mut Operation) {
    if let Some(body) = operation.request_body.as_mut() {
        remove_content(body);
    }
    for response in operation.responses.values_mut() {
        remove_content(response);
    }
}

fn remove_content(value: &mut Value) {
    if let Some(obj) = value.as_object_mut() {
        obj.remove("content");
    }
}

/// Drop components no longer reachable from the path section, chasing
/// references transitively through the components that stay. Security
/// schemes are referenced by name, not `$ref`, and are kept as-is.
fn prune_unreachable_components(doc: &mut Document) -> Result<(), Error> {
    let paths_value = serde_json::to_value(&doc.paths)?;
    let mut reachable = BTreeSet::new();
    collect_refs(&paths_value, &mut reachable);

    let mut queue: Vec<(ComponentKind, String)> = reachable.iter().cloned().collect();
    while let Some((kind, name)) = queue.pop() {
        if let Some(component) = doc.components.by_kind(kind).get(&name) {
            let mut nested = BTreeSet::new();
            collect_refs(component, &mut nested);
            for entry in nested {
                if reachable.insert(entry.clone()) {
                    queue.push(entry);
                }
            }
        }
    }

    for kind in [
        ComponentKind::Schema,
        ComponentKind::Parameter,
        ComponentKind::Response,
        ComponentKind::RequestBody,
    ] {
        doc.components
            .by_kind_mut(kind)
            .retain(|name, _| reachable.contains(&(kind, name.clone())));
    }
    Ok(())
}
