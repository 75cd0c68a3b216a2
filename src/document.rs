//! In-memory model of an API document.
//!
//! The model is deliberately partial: only the fields the engine inspects are
//! typed, and every struct keeps the rest of its object in a flattened
//! `extra` map. Serialize → deserialize round-trips are therefore lossless,
//! which the engine relies on when it rewrites documents it only partially
//! understands (vendor extensions, `nullable`, descriptions and so on all
//! survive untouched).

use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::error::Error;

/// Vendor extension marking an operation as an OData bound action/function.
pub const OPERATION_TYPE_EXTENSION: &str = "x-ms-docs-operation-type";

/// HTTP verbs a path item can carry, in specification order.
pub const METHODS: [Method; 8] = [
    Method::GET,
    Method::PUT,
    Method::POST,
    Method::DELETE,
    Method::OPTIONS,
    Method::HEAD,
    Method::PATCH,
    Method::TRACE,
];

/// Root aggregate: ordered paths plus reusable components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub openapi: String,
    pub info: Info,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Value>,
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    #[serde(default, skip_serializing_if = "Components::is_empty")]
    pub components: Components,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One path template entry: at most one operation per HTTP verb.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PathItem {
    /// Iterate the defined operations in specification verb order.
    pub fn operations(&self) -> impl Iterator<Item = (Method, &Operation)> {
        [
            (Method::GET, self.get.as_ref()),
            (Method::PUT, self.put.as_ref()),
            (Method::POST, self.post.as_ref()),
            (Method::DELETE, self.delete.as_ref()),
            (Method::OPTIONS, self.options.as_ref()),
            (Method::HEAD, self.head.as_ref()),
            (Method::PATCH, self.patch.as_ref()),
            (Method::TRACE, self.trace.as_ref()),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.map(|op| (method, op)))
    }

    pub fn operations_mut(&mut self) -> impl Iterator<Item = (Method, &mut Operation)> {
        [
            (Method::GET, self.get.as_mut()),
            (Method::PUT, self.put.as_mut()),
            (Method::POST, self.post.as_mut()),
            (Method::DELETE, self.delete.as_mut()),
            (Method::OPTIONS, self.options.as_mut()),
            (Method::HEAD, self.head.as_mut()),
            (Method::PATCH, self.patch.as_mut()),
            (Method::TRACE, self.trace.as_mut()),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.map(|op| (method, op)))
    }

    pub fn operation(&self, method: &Method) -> Option<&Operation> {
        self.operations()
            .find(|(m, _)| m == method)
            .map(|(_, op)| op)
    }

    /// Store `operation` under `method`. Verbs outside [`METHODS`] are
    /// ignored; path items cannot carry them.
    pub fn set_operation(&mut self, method: &Method, operation: Operation) {
        let slot = match method.as_str() {
            "GET" => &mut self.get,
            "PUT" => &mut self.put,
            "POST" => &mut self.post,
            "DELETE" => &mut self.delete,
            "OPTIONS" => &mut self.options,
            "HEAD" => &mut self.head,
            "PATCH" => &mut self.patch,
            "TRACE" => &mut self.trace,
            _ => return,
        };
        *slot = Some(operation);
    }

    pub fn is_empty(&self) -> bool {
        self.operations().next().is_none()
    }
}

/// One HTTP-verb-specific endpoint definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub responses: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// OData binding kind of an operation, read from its vendor extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Action,
    Function,
}

impl Operation {
    pub fn kind(&self) -> Option<OperationKind> {
        match self.extra.get(OPERATION_TYPE_EXTENSION)?.as_str()? {
            "action" => Some(OperationKind::Action),
            "function" => Some(OperationKind::Function),
            _ => None,
        }
    }
}

/// An operation or path-item parameter. Every field is optional so that
/// `$ref`-shaped entries still round-trip through the typed model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reusable component maps, keyed by name. Bodies stay raw [`Value`]s; all
/// schema inspection in this crate happens at the JSON level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub responses: BTreeMap<String, Value>,
    #[serde(
        rename = "requestBodies",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub request_bodies: BTreeMap<String, Value>,
    #[serde(
        rename = "securitySchemes",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub security_schemes: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Components {
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
            && self.parameters.is_empty()
            && self.responses.is_empty()
            && self.request_bodies.is_empty()
            && self.security_schemes.is_empty()
            && self.extra.is_empty()
    }

    pub fn by_kind(&self, kind: ComponentKind) -> &BTreeMap<String, Value> {
        match kind {
            ComponentKind::Schema => &self.schemas,
            ComponentKind::Parameter => &self.parameters,
            ComponentKind::Response => &self.responses,
            ComponentKind::RequestBody => &self.request_bodies,
            ComponentKind::SecurityScheme => &self.security_schemes,
        }
    }

    pub fn by_kind_mut(&mut self, kind: ComponentKind) -> &mut BTreeMap<String, Value> {
        match kind {
            ComponentKind::Schema => &mut self.schemas,
            ComponentKind::Parameter => &mut self.parameters,
            ComponentKind::Response => &mut self.responses,
            ComponentKind::RequestBody => &mut self.request_bodies,
            ComponentKind::SecurityScheme => &mut self.security_schemes,
        }
    }
}

/// The five reference kinds a `$ref` can point at within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentKind {
    Schema,
    Parameter,
    Response,
    RequestBody,
    SecurityScheme,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 5] = [
        ComponentKind::Schema,
        ComponentKind::Parameter,
        ComponentKind::Response,
        ComponentKind::RequestBody,
        ComponentKind::SecurityScheme,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            ComponentKind::Schema => "#/components/schemas/",
            ComponentKind::Parameter => "#/components/parameters/",
            ComponentKind::Response => "#/components/responses/",
            ComponentKind::RequestBody => "#/components/requestBodies/",
            ComponentKind::SecurityScheme => "#/components/securitySchemes/",
        }
    }

    /// Split a `$ref` string into kind and component name.
    ///
    /// References without a recognized `#/components/…` prefix (external
    /// files, nested pointers) return `None` and are left alone by the
    /// engine.
    pub fn parse_ref(reference: &str) -> Option<(ComponentKind, &str)> {
        ComponentKind::ALL.into_iter().find_map(|kind| {
            reference
                .strip_prefix(kind.prefix())
                .map(|name| (kind, name))
        })
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ComponentKind::Schema => "schema",
            ComponentKind::Parameter => "parameter",
            ComponentKind::Response => "response",
            ComponentKind::RequestBody => "request body",
            ComponentKind::SecurityScheme => "security scheme",
        };
        write!(f, "{}", name)
    }
}

/// Collect every resolvable `$ref` in a JSON value into `out`.
pub fn collect_refs(value: &Value, out: &mut BTreeSet<(ComponentKind, String)>) {
    match value {
        Value::Object(obj) => {
            if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
                if let Some((kind, name)) = ComponentKind::parse_ref(reference) {
                    out.insert((kind, name.to_string()));
                }
            }
            for nested in obj.values() {
                collect_refs(nested, out);
            }
        }
        Value::Array(items) => {
            for nested in items {
                collect_refs(nested, out);
            }
        }
        _ => {}
    }
}

/// Check the closure invariant: every reference used anywhere in `doc` must
/// resolve to a component of the matching kind in `doc` itself.
pub fn validate_references(doc: &Document) -> Result<(), Error> {
    let value = serde_json::to_value(doc)?;
    let mut refs = BTreeSet::new();
    collect_refs(&value, &mut refs);
    for (kind, name) in refs {
        if !doc.components.by_kind(kind).contains_key(&name) {
            return Err(Error::Inconsistent(format!(
                "reference to undefined {} '{}'",
                kind, name
            )));
        }
    }
    Ok(())
}
