//! Core runtime for shardmerge: the cell value model, row comparators, the
//! merge strategies, pagination decorators, and the selector that composes
//! them into one logical cursor over many shard results.

// public exports are one module level down
pub mod error;
pub mod merge;
pub mod obs;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary needed to describe a merge.
/// Errors and metrics are reached through their modules.
///

pub mod prelude {
    pub use crate::{
        merge::{
            AggregationProjection, DialectKind, Direction, DqlMerger, MemoryShardCursor,
            MergedCursor, MergedResult, NullsOrder, OrderItem, PaginationSpec, SelectContext,
            ShardCursor, StatementContext,
        },
        value::Cell,
    };
}
