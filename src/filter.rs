//! Filter criteria and operation predicates.
//!
//! A caller supplies exactly one of operation ids, tags or a url; the
//! predicate built from it is then evaluated against every operation of the
//! source document.

use http::Method;
use regex::Regex;
use std::collections::BTreeSet;
use tracing::debug;

use crate::document::{Document, Operation};
use crate::error::Error;
use crate::urltree::UrlTreeNode;

/// Raw filter input, exactly one field of which must be set.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    /// Comma-separated operation ids, or `"*"` for all operations.
    pub operation_ids: Option<String>,
    /// A single regex token, or a comma-separated exact tag list.
    pub tags: Option<String>,
    /// A concrete or templated url resolved through the url tree.
    pub url: Option<String>,
}

impl FilterCriteria {
    pub fn from_operation_ids(ids: impl Into<String>) -> Self {
        FilterCriteria {
            operation_ids: Some(ids.into()),
            ..Default::default()
        }
    }

    pub fn from_tags(tags: impl Into<String>) -> Self {
        FilterCriteria {
            tags: Some(tags.into()),
            ..Default::default()
        }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        FilterCriteria {
            url: Some(url.into()),
            ..Default::default()
        }
    }
}

/// A compiled boolean test over operations.
#[derive(Debug)]
pub enum Predicate {
    /// Accept every operation (`operationIds == "*"`).
    All,
    /// Exact operation-id membership.
    OperationIds(BTreeSet<String>),
    /// Single-token tag filter, compiled as a regular expression and matched
    /// against each tag name.
    TagPattern(Regex),
    /// Multi-token tag filter: exact membership.
    TagSet(BTreeSet<String>),
}

impl Predicate {
    /// Validate `criteria` and compile the matching predicate.
    ///
    /// For url filters the tree is built over `source` under `label` and the
    /// predicate becomes id membership in the resolved operations.
    pub fn build(
        source: &Document,
        criteria: &FilterCriteria,
        label: &str,
    ) -> Result<Predicate, Error> {
        let ids = criteria.operation_ids.as_deref();
        let tags = criteria.tags.as_deref();
        let url = criteria.url.as_deref();

        if url.is_some() && (ids.is_some() || tags.is_some()) {
            return Err(Error::UrlConflict);
        }
        if ids.is_some() && tags.is_some() {
            return Err(Error::IdsTagsConflict);
        }

        if let Some(ids) = ids {
            if ids.trim() == "*" {
                debug!("compiled accept-all predicate");
                return Ok(Predicate::All);
            }
            let set: BTreeSet<String> = split_list(ids).collect();
            debug!(ids = set.len(), "compiled operation-id predicate");
            return Ok(Predicate::OperationIds(set));
        }

        if let Some(tags) = tags {
            let tokens: Vec<String> = split_list(tags).collect();
            if tokens.len() == 1 {
                let pattern = &tokens[0];
                let regex = Regex::new(pattern).map_err(|source| Error::InvalidTagPattern {
                    pattern: pattern.clone(),
                    source,
                })?;
                debug!(pattern = %regex, "compiled tag-pattern predicate");
                return Ok(Predicate::TagPattern(regex));
            }
            debug!(tags = tokens.len(), "compiled tag-set predicate");
            return Ok(Predicate::TagSet(tokens.into_iter().collect()));
        }

        if let Some(url) = url {
            let relative = strip_label_prefix(normalize_url(url), label);
            let tree = UrlTreeNode::from_documents([(label, source)]);
            let operations = tree.get_operations(&relative, label).ok_or_else(|| {
                Error::NotFound(format!("no operations found for url '{}'", relative))
            })?;
            let set: BTreeSet<String> = operations
                .iter()
                .filter_map(|op| op.operation_id.clone())
                .collect();
            debug!(url = %relative, ids = set.len(), "compiled url predicate");
            return Ok(Predicate::OperationIds(set));
        }

        Err(Error::MissingCriteria)
    }

    pub fn matches(&self, operation: &Operation) -> bool {
        match self {
            Predicate::All => true,
            Predicate::OperationIds(ids) => operation
                .operation_id
                .as_deref()
                .is_some_and(|id| ids.contains(id)),
            Predicate::TagPattern(regex) => {
                operation.tags.iter().any(|tag| regex.is_match(tag))
            }
            Predicate::TagSet(tags) => operation.tags.iter().any(|tag| tags.contains(tag)),
        }
    }
}

/// Walk `doc` in path order collecting the operations `predicate` accepts.
pub fn find_operations<'a>(
    doc: &'a Document,
    predicate: &Predicate,
) -> Vec<(&'a str, Method, &'a Operation)> {
    doc.paths
        .iter()
        .flat_map(|(path, item)| {
            item.operations()
                .filter(|(_, op)| predicate.matches(op))
                .map(move |(method, op)| (path.as_str(), method, op))
        })
        .collect()
}

fn split_list(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(String::from)
}

/// Absolute service urls keep their version segment after [`normalize_url`];
/// cut it off when it names the label being queried.
fn strip_label_prefix(path: String, label: &str) -> String {
    let prefix = format!("/{}", label);
    if path == prefix {
        return "/".to_string();
    }
    match path.strip_prefix(&format!("{}/", prefix)) {
        Some(rest) => format!("/{}", rest),
        None => path,
    }
}

/// Reduce a caller-supplied url to the tree's convention: path only, query
/// cut off, quoted placeholders (`='{x}'`) unquoted.
fn normalize_url(url: &str) -> String {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split('?').next().unwrap_or(url).to_string(),
    };
    let path = path.replace("='{", "={").replace("}'", "}");
    if path.starts_with('/') {
        path
    } else {
        format!("/{}", path)
    }
}
