//! Batched document normalization.
//!
//! The upstream metadata conversion can hand over documents whose in-memory
//! reference graph is transiently inconsistent. Round-tripping a document
//! through serialization and a validating re-parse yields a self-consistent
//! graph; because whole-document round-trips are expensive for very large
//! documents, the work is batched over fixed-size groups of path entries.
//! Batches run strictly in sequence: each batch's normalized metadata feeds
//! the next batch.

use std::collections::BTreeMap;
use tracing::debug;

use crate::document::{validate_references, Document};
use crate::error::Error;

/// Default number of path entries per batch.
pub const DEFAULT_BATCH_SIZE: usize = 4000;

/// Normalize with the default batch size.
pub fn normalize(source: &Document) -> Result<Document, Error> {
    normalize_batched(source, DEFAULT_BATCH_SIZE)
}

/// Re-build `source` batch by batch until the accumulated path count equals
/// the source path count. Each batch is a temporary document carrying the
/// same metadata plus only that batch's paths, round-tripped through the
/// parser and merged into the accumulator (an explicit loop, so the depth
/// does not grow with the number of batches).
pub fn normalize_batched(source: &Document, batch_size: usize) -> Result<Document, Error> {
    let batch_size = batch_size.max(1);
    let mut result = Document {
        openapi: source.openapi.clone(),
        info: source.info.clone(),
        servers: source.servers.clone(),
        paths: BTreeMap::new(),
        components: source.components.clone(),
        security: source.security.clone(),
        extra: source.extra.clone(),
    };

    let entries: Vec<(&String, &crate::document::PathItem)> = source.paths.iter().collect();
    for (index, chunk) in entries.chunks(batch_size).enumerate() {
        let batch = Document {
            openapi: result.openapi.clone(),
            info: result.info.clone(),
            servers: result.servers.clone(),
            paths: chunk
                .iter()
                .map(|(path, item)| ((*path).clone(), (*item).clone()))
                .collect(),
            components: result.components.clone(),
            security: result.security.clone(),
            extra: result.extra.clone(),
        };
        let round_tripped: Document = serde_json::from_value(serde_json::to_value(&batch)?)?;
        validate_references(&round_tripped)?;

        result.info = round_tripped.info;
        result.servers = round_tripped.servers;
        result.components = round_tripped.components;
        result.security = round_tripped.security;
        result.extra = round_tripped.extra;
        result.paths.extend(round_tripped.paths);
        debug!(
            batch = index,
            accumulated = result.paths.len(),
            total = source.paths.len(),
            "normalized batch"
        );
    }

    if result.paths.len() != source.paths.len() {
        return Err(Error::Inconsistent(format!(
            "normalization lost paths: {} of {}",
            result.paths.len(),
            source.paths.len()
        )));
    }
    Ok(result)
}
