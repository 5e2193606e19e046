use shardmerge_config::ConfigError;
use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Not a stable API; the facade crate maps it onto the public error type.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl InternalError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct a shard-origin I/O failure.
    ///
    /// Shard cursor implementations use this to surface communication or
    /// protocol failures; the merge propagates it unchanged.
    pub fn shard_io(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::ShardIo, ErrorOrigin::Shard, message)
    }

    /// Construct a shard-origin contract violation (bad column index, read
    /// before advance, and so on).
    pub fn shard_contract(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::ContractViolation, ErrorOrigin::Shard, message)
    }

    pub(crate) fn selector_contract(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::ContractViolation, ErrorOrigin::Selector, message)
    }

    pub(crate) fn cursor_contract(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::ContractViolation, ErrorOrigin::Cursor, message)
    }

    pub(crate) fn comparator_schema_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::SchemaMismatch, ErrorOrigin::Comparator, message)
    }

    pub(crate) fn aggregate_schema_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::SchemaMismatch, ErrorOrigin::Aggregate, message)
    }

    pub(crate) fn merge_invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, ErrorOrigin::Merge, message)
    }

    pub(crate) fn merge_budget_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::BudgetExceeded, ErrorOrigin::Merge, message)
    }

    pub(crate) fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Config, ErrorOrigin::Config, message)
    }

    #[must_use]
    pub const fn is_shard_io(&self) -> bool {
        matches!(self.class, ErrorClass::ShardIo)
    }

    #[must_use]
    pub const fn is_contract_violation(&self) -> bool {
        matches!(self.class, ErrorClass::ContractViolation)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::config_invalid(err.to_string())
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    ShardIo,
    SchemaMismatch,
    ContractViolation,
    InvariantViolation,
    BudgetExceeded,
    Config,
}

impl ErrorClass {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ShardIo => "shard_io",
            Self::SchemaMismatch => "schema_mismatch",
            Self::ContractViolation => "contract_violation",
            Self::InvariantViolation => "invariant_violation",
            Self::BudgetExceeded => "budget_exceeded",
            Self::Config => "config",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Shard,
    Selector,
    Comparator,
    Merge,
    Aggregate,
    Cursor,
    Config,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Shard => "shard",
            Self::Selector => "selector",
            Self::Comparator => "comparator",
            Self::Merge => "merge",
            Self::Aggregate => "aggregate",
            Self::Cursor => "cursor",
            Self::Config => "config",
        };
        write!(f, "{label}")
    }
}
