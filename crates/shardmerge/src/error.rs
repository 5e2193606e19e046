use derive_more::Display;
use serde::{Deserialize, Serialize};
use shardmerge_config::ConfigError;
use shardmerge_core::error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    /// Whether retrying against fresh shard cursors could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::ShardIo)
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        Self::new(err.class.into(), err.origin.into(), err.message)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorKind::Config, ErrorOrigin::Config, err.to_string())
    }
}

///
/// ErrorKind
/// Public error taxonomy for merge callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    /// A shard cursor failed to deliver rows.
    ShardIo,

    /// Shards disagree on column types.
    SchemaMismatch,

    /// The caller used the merge API outside its preconditions.
    ContractViolation,

    /// Shard input broke an ordering guarantee the merge relies on.
    InvariantViolation,

    /// The in-memory group merge hit its configured group limit.
    BudgetExceeded,

    Config,
}

impl From<ErrorClass> for ErrorKind {
    fn from(class: ErrorClass) -> Self {
        match class {
            ErrorClass::ShardIo => Self::ShardIo,
            ErrorClass::SchemaMismatch => Self::SchemaMismatch,
            ErrorClass::ContractViolation => Self::ContractViolation,
            ErrorClass::InvariantViolation => Self::InvariantViolation,
            ErrorClass::BudgetExceeded => Self::BudgetExceeded,
            ErrorClass::Config => Self::Config,
        }
    }
}

///
/// ErrorOrigin
/// Public origin taxonomy for merge callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Shard,
    Selector,
    Comparator,
    Merge,
    Aggregate,
    Cursor,
    Config,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Shard => Self::Shard,
            CoreErrorOrigin::Selector => Self::Selector,
            CoreErrorOrigin::Comparator => Self::Comparator,
            CoreErrorOrigin::Merge => Self::Merge,
            CoreErrorOrigin::Aggregate => Self::Aggregate,
            CoreErrorOrigin::Cursor => Self::Cursor,
            CoreErrorOrigin::Config => Self::Config,
        }
    }
}
