//! Module: merge::dialect
//! Responsibility: per-dialect merge policy (null default, pagination
//! decorator, default schema).
//! Does not own: SQL syntax; this is a lookup table only.

use crate::{
    error::InternalError,
    merge::{PaginationKind, statement::NullsOrder},
};
use std::fmt;

///
/// DialectKind
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum DialectKind {
    #[default]
    MySql,
    PostgreSql,
    OpenGauss,
    Oracle,
    SqlServer,
    Other,
}

///
/// DialectTraits
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct DialectTraits {
    default_nulls: NullsOrder,
    pagination: Option<PaginationKind>,
    public_schema: bool,
}

impl DialectKind {
    const fn traits(self) -> DialectTraits {
        match self {
            Self::MySql => DialectTraits {
                default_nulls: NullsOrder::First,
                pagination: Some(PaginationKind::Limit),
                public_schema: false,
            },
            Self::PostgreSql | Self::OpenGauss => DialectTraits {
                default_nulls: NullsOrder::Last,
                pagination: Some(PaginationKind::Limit),
                public_schema: true,
            },
            Self::Oracle => DialectTraits {
                default_nulls: NullsOrder::Last,
                pagination: Some(PaginationKind::RowNumber),
                public_schema: false,
            },
            Self::SqlServer => DialectTraits {
                default_nulls: NullsOrder::First,
                pagination: Some(PaginationKind::TopAndRowNumber),
                public_schema: false,
            },
            Self::Other => DialectTraits {
                default_nulls: NullsOrder::First,
                pagination: None,
                public_schema: false,
            },
        }
    }

    /// Resolve a configured dialect name.
    ///
    /// Branch dialects map onto their trunk (MariaDB merges like MySQL).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Self::MySql,
            "postgresql" | "postgres" => Self::PostgreSql,
            "opengauss" => Self::OpenGauss,
            "oracle" => Self::Oracle,
            "sqlserver" | "mssql" => Self::SqlServer,
            "sql92" | "h2" | "other" => Self::Other,
            _ => return None,
        };

        Some(kind)
    }

    pub(crate) fn parse_config(name: &str) -> Result<Self, InternalError> {
        Self::from_name(name)
            .ok_or_else(|| InternalError::config_invalid(format!("unknown dialect '{name}'")))
    }

    /// Null placement used when an order item has no explicit NULLS clause.
    #[must_use]
    pub const fn default_nulls(self) -> NullsOrder {
        self.traits().default_nulls
    }

    /// Pagination decorator selected for this protocol dialect, if any.
    #[must_use]
    pub const fn pagination_kind(self) -> Option<PaginationKind> {
        self.traits().pagination
    }

    /// Schema assumed when the statement names none.
    #[must_use]
    pub fn default_schema(self, database: &str) -> String {
        if self.traits().public_schema {
            "public".to_string()
        } else {
            database.to_string()
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MySql => "MySQL",
            Self::PostgreSql => "PostgreSQL",
            Self::OpenGauss => "openGauss",
            Self::Oracle => "Oracle",
            Self::SqlServer => "SQLServer",
            Self::Other => "SQL92",
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

///
/// TESTS
///
