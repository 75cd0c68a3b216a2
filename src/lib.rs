//! # openapi-slicer
//!
//! Filter a large, machine-generated OpenAPI document down to a small,
//! consumer-specific slice and reshape it for a particular downstream code
//! generator.
//!
//! The engine takes an immutable source [`Document`] plus one filter
//! criterion - explicit operation ids, a tag expression, or a concrete or
//! templated url - extracts the matching operations together with every
//! transitively referenced component, and then applies one of four output
//! styles (`Plain`, `PowerShell`, `PowerPlatform`, `GEAutocomplete`).
//!
//! ## Architecture
//!
//! - **[`document`]** - lossless serde model of an API document
//! - **[`urltree`]** - segment trie resolving concrete or templated urls to
//!   operations across labeled sources
//! - **[`filter`]** - criteria validation and predicate construction
//! - **[`subset`]** - subset extraction with transitive reference closure
//! - **[`style`]** - the four rewrite profiles over a generic walker
//! - **[`normalize`]** - batched round-trip normalization for transiently
//!   inconsistent converter output
//! - **[`load`]** - reading documents from YAML/JSON files
//!
//! The engine is synchronous and stateless: sources are never mutated, so
//! many concurrent slice calls may safely share one cached document.
//! Caching, transport and serialization of the result belong to the caller.
//!
//! ## Example
//!
//! ```no_run
//! use openapi_slicer::{slice, FilterCriteria, Style, StyleOptions};
//!
//! let source = openapi_slicer::load::load_document("openapi.yaml")?;
//! let sliced = slice(
//!     &source,
//!     &FilterCriteria::from_url("/users/{user-id}/messages"),
//!     "v1.0",
//!     Style::PowerShell,
//!     &StyleOptions::default(),
//! )?;
//! # Ok::<(), openapi_slicer::Error>(())
//! ```

pub mod document;
pub mod error;
pub mod filter;
pub mod load;
pub mod normalize;
pub mod style;
pub mod subset;
pub mod urltree;

pub use document::{Components, Document, Info, Operation, OperationKind, Parameter, PathItem};
pub use error::{Error, ErrorKind};
pub use filter::{FilterCriteria, Predicate};
pub use style::{Style, StyleOptions};
pub use urltree::UrlTreeNode;

use tracing::info;

/// Filter `source` by `criteria` and restyle the result.
///
/// Equivalent to [`Predicate::build`] → [`subset::build_subset`] →
/// [`style::apply_style`]; the source document is never mutated.
pub fn slice(
    source: &Document,
    criteria: &FilterCriteria,
    label: &str,
    style: Style,
    options: &StyleOptions,
) -> Result<Document, Error> {
    let predicate = Predicate::build(source, criteria, label)?;
    let subset = subset::build_subset(source, &predicate, label)?;
    let styled = style::apply_style(&subset, style, options)?;
    info!(
        label = %label,
        style = %style,
        paths = styled.paths.len(),
        "sliced document"
    );
    Ok(styled)
}
