use std::fmt;
use thiserror::Error as ThisError;

///
/// LinkError
/// Structured runtime error with a stable internal classification.
/// Domain code never produces these; only the gateway surface, the
/// transactional boundary, and snapshot validation do.
///

#[derive(Clone, Debug, ThisError)]
#[error("{message}")]
pub struct LinkError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl LinkError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Connection loss, constraint violations, aborted statements.
    pub fn io(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Io, origin, message)
    }

    /// Snapshot state that contradicts the nesting or state-tuple rules.
    pub fn invariant(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, origin, message)
    }

    /// Second-phase commit failed after the first phase committed.
    ///
    /// Non-recoverable within the current invocation; the next
    /// reconciliation pass restores the persisted invariants.
    pub fn partial_commit(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::PartialCommit, ErrorOrigin::Transaction, message)
    }

    #[must_use]
    pub const fn is_partial_commit(&self) -> bool {
        matches!(self.class, ErrorClass::PartialCommit)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Io,
    Conflict,
    Internal,
    Unsupported,
    InvariantViolation,
    PartialCommit,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Io => "io",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
            Self::Unsupported => "unsupported",
            Self::InvariantViolation => "invariant_violation",
            Self::PartialCommit => "partial_commit",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Snapshot,
    Apply,
    Reconcile,
    Transaction,
    Service,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Snapshot => "snapshot",
            Self::Apply => "apply",
            Self::Reconcile => "reconcile",
            Self::Transaction => "transaction",
            Self::Service => "service",
        };
        write!(f, "{label}")
    }
}
