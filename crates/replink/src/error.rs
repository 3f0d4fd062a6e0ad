use replink_core::error::{
    ErrorClass as CoreErrorClass, ErrorOrigin as CoreErrorOrigin, LinkError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable class + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    #[must_use]
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// True for the non-recoverable second-phase commit failure.
    #[must_use]
    pub const fn is_partial_commit(&self) -> bool {
        matches!(self.class, ErrorClass::PartialCommit)
    }
}

impl From<LinkError> for Error {
    fn from(err: LinkError) -> Self {
        Self {
            class: err.class.into(),
            origin: err.origin.into(),
            message: err.message,
        }
    }
}

///
/// ErrorClass
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorClass {
    Io,
    Conflict,
    Internal,
    Unsupported,
    InvariantViolation,
    PartialCommit,
}

impl From<CoreErrorClass> for ErrorClass {
    fn from(class: CoreErrorClass) -> Self {
        match class {
            CoreErrorClass::Io => Self::Io,
            CoreErrorClass::Conflict => Self::Conflict,
            CoreErrorClass::Internal => Self::Internal,
            CoreErrorClass::Unsupported => Self::Unsupported,
            CoreErrorClass::InvariantViolation => Self::InvariantViolation,
            CoreErrorClass::PartialCommit => Self::PartialCommit,
        }
    }
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Snapshot,
    Apply,
    Reconcile,
    Transaction,
    Service,
    Config,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Snapshot => Self::Snapshot,
            CoreErrorOrigin::Apply => Self::Apply,
            CoreErrorOrigin::Reconcile => Self::Reconcile,
            CoreErrorOrigin::Transaction => Self::Transaction,
            CoreErrorOrigin::Service => Self::Service,
        }
    }
}
