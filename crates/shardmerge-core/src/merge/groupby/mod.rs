//! Module: merge::groupby
//! Responsibility: GROUP BY / DISTINCT / aggregation merges.
//! Does not own: ordering or shard interleaving (see `merge::orderby`).
//! Boundary: `stream` folds adjacent groups of an order-by merge, `memory`
//! buckets every shard row by group key and emits after materializing.

mod aggregate;
mod memory;
mod stream;

#[cfg(test)]
mod tests;

use crate::{
    error::InternalError,
    merge::{compare::KeyExtractor, cursor::CursorState},
    value::Cell,
};

// re-exports
pub(crate) use aggregate::{AggregationUnit, GroupAggregates};
pub(crate) use memory::GroupByMemoryMerge;
pub(crate) use stream::GroupByStreamMerge;

///
/// GroupPlan
///
/// Resolved grouping inputs shared by the stream and memory merges.
///

pub(crate) struct GroupPlan {
    keys: KeyExtractor,
    units: Vec<AggregationUnit>,
    column_count: usize,
}

impl GroupPlan {
    pub(crate) const fn new(
        keys: KeyExtractor,
        units: Vec<AggregationUnit>,
        column_count: usize,
    ) -> Self {
        Self {
            keys,
            units,
            column_count,
        }
    }

    /// Aggregation without GROUP BY still yields one row over zero input.
    fn emits_empty_aggregate(&self) -> bool {
        self.keys.is_empty() && !self.units.is_empty()
    }

    // All non-aggregate columns are NULL; COUNT is 0, other aggregates NULL.
    fn empty_aggregate_row(&self) -> Result<Vec<Cell>, InternalError> {
        let mut row = vec![Cell::Null; self.column_count];
        GroupAggregates::new(&self.units).finalize_into(&mut row)?;

        Ok(row)
    }
}

/// Read one column of a materialized group row.
fn group_row_value(
    state: CursorState,
    row: Option<&[Cell]>,
    column: usize,
) -> Result<Cell, InternalError> {
    state.require_row()?;
    let row = row.ok_or_else(|| InternalError::merge_invariant("group merge has no current row"))?;

    column
        .checked_sub(1)
        .and_then(|slot| row.get(slot))
        .cloned()
        .ok_or_else(|| {
            InternalError::cursor_contract(format!(
                "column index {column} out of range 1..={}",
                row.len()
            ))
        })
}
