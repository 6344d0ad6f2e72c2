//! Ward error types.

use thiserror::Error;

use crate::intent::IntentStatus;

/// Errors surfaced by ward components.
///
/// Gate denials are deliberately *not* errors: a denial is an answer, not a
/// fault, and lives in the [`Denied`](crate::gate::GateDecision::Denied)
/// variant of the gate result. `WardError` covers the faults, meaning
/// lifecycle violations and the handful of I/O paths that are allowed to
/// propagate (catalog lifecycle writes).
#[derive(Debug, Error)]
pub enum WardError {
    /// A lifecycle transition outside the allowed table.
    #[error("illegal intent transition {from} -> {to} for '{intent_id}'")]
    IllegalTransition {
        /// Intent being transitioned.
        intent_id: String,
        /// Status the intent currently has.
        from: IntentStatus,
        /// Status that was requested.
        to: IntentStatus,
    },

    /// The intent id is not present in the catalog.
    #[error("intent '{0}' not found in the catalog")]
    IntentNotFound(String),

    /// The catalog file could not be parsed in a context where failing open
    /// is not acceptable (lifecycle writes).
    #[error("catalog parse error: {0}")]
    CatalogParse(String),

    /// A field rewrite could not locate its target inside the catalog text.
    #[error("catalog edit failed for '{intent_id}': {message}")]
    CatalogEdit {
        /// Intent whose block was being edited.
        intent_id: String,
        /// What went wrong.
        message: String,
    },

    /// Filesystem failure on a path that is allowed to propagate.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_transition_display() {
        let err = WardError::IllegalTransition {
            intent_id: "INT-001".into(),
            from: IntentStatus::Complete,
            to: IntentStatus::InProgress,
        };
        assert_eq!(
            err.to_string(),
            "illegal intent transition COMPLETE -> IN_PROGRESS for 'INT-001'"
        );
    }

    #[test]
    fn intent_not_found_display() {
        let err = WardError::IntentNotFound("INT-404".into());
        assert!(err.to_string().contains("INT-404"));
    }
}
