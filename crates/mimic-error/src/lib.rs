//! Error taxonomy for MimicDB operations.
//!
//! One structured enum covers every failure the engine can surface. All
//! errors are synchronous and final: there is no I/O behind them, so nothing
//! is ever retried internally. Missing relation-table state during predicate
//! evaluation is deliberately *not* an error — an unknown relation resolves
//! to "no match" (see `mimic-core::predicate`).

use thiserror::Error;

/// Primary error type for MimicDB operations.
#[derive(Error, Debug)]
pub enum MimicError {
    // === Fetch Errors ===
    /// A single-result fetch matched zero records. Also raised when removing
    /// a record reference that is not present in its store slice, or a
    /// relation member that was never added.
    #[error("no record found for entity '{entity}'")]
    NotFound { entity: String },

    /// A single-result fetch matched more than one record.
    #[error("expected one record for entity '{entity}', found {count}")]
    MultipleResults { entity: String, count: usize },

    // === Predicate Errors ===
    /// A predicate or ordering key named a field the record does not carry.
    #[error("no such field: {field} (entity '{entity}')")]
    NoSuchField { entity: String, field: String },

    /// A nested lookup path tried to traverse a field that does not hold a
    /// record reference.
    #[error("field '{field}' does not hold a record reference")]
    NotARecord { field: String },

    /// A condition group used a connector the engine does not evaluate.
    /// Predicate lists compose as an implicit AND; OR groups are rejected
    /// up front instead of being silently mis-evaluated.
    #[error("unsupported group connector: {connector}")]
    UnsupportedConnector { connector: String },
}

impl MimicError {
    /// True for the zero-result fetch case, which `get_or_create` treats as
    /// its miss path rather than a failure.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, MimicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = MimicError::NotFound {
            entity: "artist".to_owned(),
        };
        assert_eq!(err.to_string(), "no record found for entity 'artist'");

        let err = MimicError::MultipleResults {
            entity: "artist".to_owned(),
            count: 3,
        };
        assert_eq!(
            err.to_string(),
            "expected one record for entity 'artist', found 3"
        );

        let err = MimicError::NoSuchField {
            entity: "track".to_owned(),
            field: "tempo".to_owned(),
        };
        assert_eq!(err.to_string(), "no such field: tempo (entity 'track')");
    }

    #[test]
    fn test_is_not_found() {
        let err = MimicError::NotFound {
            entity: "artist".to_owned(),
        };
        assert!(err.is_not_found());

        let err = MimicError::MultipleResults {
            entity: "artist".to_owned(),
            count: 2,
        };
        assert!(!err.is_not_found());
    }
}
