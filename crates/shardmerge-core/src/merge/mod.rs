//! Module: merge
//! Responsibility: combining per-shard SELECT results into one logical cursor.
//! Does not own: SQL parsing, routing, or shard execution.
//! Boundary: `DqlMerger::merge` is the only entrypoint; everything below it
//! is a `MergedCursor` composed from shard cursors.

pub(crate) mod columns;
pub(crate) mod compare;
pub(crate) mod cursor;
pub(crate) mod dialect;
pub(crate) mod groupby;
pub(crate) mod iterator;
pub(crate) mod orderby;
pub(crate) mod pagination;
pub(crate) mod selector;
pub(crate) mod shard;
pub(crate) mod statement;

use std::fmt;

// re-exports
pub use columns::ColumnIndexMap;
pub use cursor::{MergedCursor, MergedResult};
pub use dialect::DialectKind;
pub use selector::{DqlMerger, MergeOptions};
pub use shard::{MemoryShardCursor, ShardCursor};
pub use statement::{
    AggregateKind, AggregationProjection, AvgDerivedColumns, ColumnSource, Direction, GroupItem,
    NullsOrder, OrderItem, PaginationSpec, SchemaCatalog, SelectContext, StatementContext,
    StatementKind, TableColumn,
};

///
/// MergeStrategy
/// Base merge chosen by the selector, before any pagination decorator.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MergeStrategy {
    Passthrough,
    OrderByStream,
    GroupByStream,
    GroupByMemory,
}

impl MergeStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Passthrough => "passthrough",
            Self::OrderByStream => "order_by_stream",
            Self::GroupByStream => "group_by_stream",
            Self::GroupByMemory => "group_by_memory",
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

///
/// PaginationKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PaginationKind {
    Limit,
    RowNumber,
    TopAndRowNumber,
}

impl PaginationKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Limit => "limit",
            Self::RowNumber => "row_number",
            Self::TopAndRowNumber => "top_and_row_number",
        }
    }
}

impl fmt::Display for PaginationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
