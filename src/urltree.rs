//! URL segment trie over one or more labeled documents.
//!
//! Each node represents one path segment. Literal children are matched
//! case-insensitively; `{x}`-shaped segments collapse into a single
//! parameter child per node, so `/users/{user-id}` and `/users/12345`
//! resolve to the same node. Lookup is O(number of segments) with no
//! backtracking beyond a one-step parameter fallback.

use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::io::Write;
use tracing::debug;

use crate::document::{Document, Operation, PathItem};
use crate::error::Error;

/// One node of the trie. The root node carries the segment `"/"`.
#[derive(Debug, Clone)]
pub struct UrlTreeNode {
    /// Segment text as it appeared in the first path that created the node.
    pub segment: String,
    /// Children keyed by lowercased segment text, so iteration order is
    /// segment-ascending and literal matching is case-insensitive.
    children: BTreeMap<String, UrlTreeNode>,
    /// Path items recorded at this exact node, per source label.
    items: BTreeMap<String, PathItem>,
    pub is_parameter: bool,
}

impl UrlTreeNode {
    fn new(segment: String, is_parameter: bool) -> Self {
        UrlTreeNode {
            segment,
            children: BTreeMap::new(),
            items: BTreeMap::new(),
            is_parameter,
        }
    }

    /// An empty tree rooted at `"/"`.
    pub fn root() -> Self {
        UrlTreeNode::new("/".to_string(), false)
    }

    /// Build a tree over several labeled source documents.
    pub fn from_documents<'a, I>(sources: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a Document)>,
    {
        let mut root = UrlTreeNode::root();
        for (label, doc) in sources {
            root.attach(doc, label);
        }
        root
    }

    /// Register every path of `doc` under `label`.
    pub fn attach(&mut self, doc: &Document, label: &str) {
        for (path, item) in &doc.paths {
            self.attach_path(path, item.clone(), label);
        }
        debug!(label = %label, paths = doc.paths.len(), "attached document to url tree");
    }

    fn attach_path(&mut self, path: &str, item: PathItem, label: &str) {
        let mut node = self;
        for segment in split_segments(path) {
            let is_parameter = is_parameter_segment(segment);
            node = node.child_entry(segment, is_parameter);
        }
        node.items.insert(label.to_string(), item);
    }

    /// Walk into (creating on demand) the child for `segment`. A node keeps
    /// at most one parameter child: later templates reuse it whatever their
    /// placeholder name.
    fn child_entry(&mut self, segment: &str, is_parameter: bool) -> &mut UrlTreeNode {
        let key = if is_parameter {
            self.children
                .iter()
                .find(|(_, child)| child.is_parameter)
                .map(|(key, _)| key.clone())
                .unwrap_or_else(|| segment.to_ascii_lowercase())
        } else {
            segment.to_ascii_lowercase()
        };
        self.children
            .entry(key)
            .or_insert_with(|| UrlTreeNode::new(segment.to_string(), is_parameter))
    }

    /// Resolve `relative_url` to a node.
    ///
    /// At each step a case-insensitive literal match is tried first, falling
    /// back to the node's parameter child, except that a miss on the first
    /// segment aborts immediately, and two consecutive parameter fallbacks
    /// abort as well.
    pub fn resolve(&self, relative_url: &str) -> Option<&UrlTreeNode> {
        if relative_url == "/" {
            return Some(self);
        }
        let mut node = self;
        let mut previous_was_fallback = false;
        for (index, segment) in split_segments(relative_url).enumerate() {
            match node.children.get(&segment.to_ascii_lowercase()) {
                Some(child) => {
                    node = child;
                    previous_was_fallback = false;
                }
                None => {
                    if index == 0 || previous_was_fallback {
                        return None;
                    }
                    node = node.children.values().find(|child| child.is_parameter)?;
                    previous_was_fallback = true;
                }
            }
        }
        Some(node)
    }

    /// Operations recorded for `label` at the node `relative_url` resolves
    /// to. Both "node not found" and "node without operations" come back as
    /// `None`: callers require at least one operation.
    pub fn get_operations(&self, relative_url: &str, label: &str) -> Option<Vec<&Operation>> {
        let node = self.resolve(relative_url)?;
        let item = node.items.get(label)?;
        let operations: Vec<&Operation> = item.operations().map(|(_, op)| op).collect();
        if operations.is_empty() {
            None
        } else {
            Some(operations)
        }
    }

    /// Path item recorded at this node for `label`, if any.
    pub fn item(&self, label: &str) -> Option<&PathItem> {
        self.items.get(label)
    }

    /// Serialize the tree as JSON to `sink`:
    /// `{segment, labels: [{name, methods: [...]}], children: [...]}`,
    /// children ordered by segment text ascending.
    pub fn write_json<W: Write>(&self, sink: &mut W) -> Result<(), Error> {
        let value = self.to_json_value();
        serde_json::to_writer(&mut *sink, &value)?;
        Ok(())
    }

    fn to_json_value(&self) -> Value {
        let labels: Vec<Value> = self
            .items
            .iter()
            .map(|(label, item)| {
                let methods: Vec<String> = item
                    .operations()
                    .map(|(method, _)| method.as_str().to_string())
                    .collect();
                json!({ "name": label, "methods": methods })
            })
            .collect();
        let children: Vec<Value> = self
            .children
            .values()
            .map(UrlTreeNode::to_json_value)
            .collect();
        json!({
            "segment": self.segment,
            "labels": labels,
            "children": children,
        })
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.trim_start_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
}

fn is_parameter_segment(segment: &str) -> bool {
    segment.starts_with('{') && segment.ends_with('}')
}
