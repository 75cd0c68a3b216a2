use thiserror::Error;

/// Errors produced by the slicing engine.
///
/// Every failure is synchronous and whole-operation: no partial document is
/// ever returned alongside an error, and nothing is retried internally.
#[derive(Debug, Error)]
pub enum Error {
    /// No filter criterion was supplied at all.
    #[error("no filter supplied: provide one of operation ids, tags or a url")]
    MissingCriteria,

    /// A url criterion was combined with operation ids or tags.
    #[error("conflicting filter: a url cannot be combined with operation ids or tags")]
    UrlConflict,

    /// Operation ids and tags were supplied together.
    #[error("conflicting filter: operation ids cannot be combined with tags")]
    IdsTagsConflict,

    /// A single-token tag filter did not compile as a regular expression.
    #[error("invalid tag pattern '{pattern}': {source}")]
    InvalidTagPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The requested output style name is not one of the supported profiles.
    #[error("unknown style '{0}'")]
    UnknownStyle(String),

    /// A url resolved to nothing, a predicate matched nothing, or styling
    /// removed every path.
    #[error("{0}")]
    NotFound(String),

    /// The source document is internally inconsistent (e.g. a reference that
    /// resolves nowhere). Fatal; surfaced unmodified.
    #[error("inconsistent document: {0}")]
    Inconsistent(String),

    #[error("document serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("could not read document: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse document: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Coarse classification for boundary layers mapping errors to client-facing
/// status semantics, so they never have to match on message strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller asked for something malformed ("bad request").
    Configuration,
    /// The caller asked for something that does not exist ("not found").
    NotFound,
    /// The engine or its input is broken; not expected in normal operation.
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingCriteria
            | Error::UrlConflict
            | Error::IdsTagsConflict
            | Error::InvalidTagPattern { .. }
            | Error::UnknownStyle(_)
            | Error::Io(_)
            | Error::Parse(_) => ErrorKind::Configuration,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Inconsistent(_) | Error::Serialize(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::MissingCriteria.kind(), ErrorKind::Configuration);
        assert_eq!(Error::IdsTagsConflict.kind(), ErrorKind::Configuration);
        assert_eq!(
            Error::NotFound("nothing matched".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::Inconsistent("dangling reference".into()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_conflict_messages_are_distinct() {
        let url = Error::UrlConflict.to_string();
        let ids = Error::IdsTagsConflict.to_string();
        assert_ne!(url, ids);
        assert!(url.contains("url"));
        assert!(ids.contains("tags"));
    }
}
