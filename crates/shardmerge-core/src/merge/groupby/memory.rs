use crate::{
    error::InternalError,
    merge::{
        MergeStrategy,
        compare::KeyExtractor,
        cursor::{CursorState, MergedCursor, read_row},
        groupby::{GroupAggregates, GroupPlan, group_row_value},
        shard::ShardCursor,
    },
    obs::sink::{self, MetricsEvent},
    value::{Cell, StableHash},
};
use std::{collections::HashMap, sync::Arc};

///
/// MemoryGroup
///

struct MemoryGroup {
    key: Vec<Cell>,
    row: Vec<Cell>,
    aggregates: GroupAggregates,
}

///
/// GroupByMemoryMerge
///
/// Drains every shard on the first `advance`, buckets rows by stable group
/// key hash (collisions resolved by key equality), then emits groups in
/// ORDER BY order or, without one, in first-seen order.
///

pub(crate) struct GroupByMemoryMerge<S> {
    shards: Vec<S>,
    plan: GroupPlan,
    order: Option<KeyExtractor>,
    max_groups: u64,
    rows: std::vec::IntoIter<Vec<Cell>>,
    current: Option<Vec<Cell>>,
    state: CursorState,
}

impl<S: ShardCursor> GroupByMemoryMerge<S> {
    pub(crate) fn new(
        shards: Vec<S>,
        plan: GroupPlan,
        order: Option<KeyExtractor>,
        max_groups: u64,
    ) -> Self {
        Self {
            shards,
            plan,
            order,
            max_groups,
            rows: Vec::new().into_iter(),
            current: None,
            state: CursorState::Unstarted,
        }
    }

    fn materialize(&mut self) -> Result<Vec<Vec<Cell>>, InternalError> {
        let mut buckets: HashMap<StableHash, Vec<usize>> = HashMap::new();
        let mut groups: Vec<MemoryGroup> = Vec::new();

        for shard in &mut self.shards {
            while shard.advance()? {
                let shard = &*shard;
                let key = self.plan.keys.extract(|column| shard.value(column))?;
                let bucket = buckets.entry(self.plan.keys.group_hash(&key)).or_default();
                let existing = bucket.iter().copied().find(|&index| {
                    groups
                        .get(index)
                        .is_some_and(|group| self.plan.keys.same_group(&group.key, &key))
                });

                let index = if let Some(index) = existing {
                    index
                } else {
                    if u64::try_from(groups.len()).unwrap_or(u64::MAX) >= self.max_groups {
                        return Err(InternalError::merge_budget_exceeded(format!(
                            "group-by memory merge exceeded {} groups",
                            self.max_groups
                        )));
                    }
                    groups.push(MemoryGroup {
                        key,
                        row: read_row(self.plan.column_count, |column| shard.value(column))?,
                        aggregates: GroupAggregates::new(&self.plan.units),
                    });
                    bucket.push(groups.len() - 1);
                    groups.len() - 1
                };

                groups
                    .get_mut(index)
                    .ok_or_else(|| InternalError::merge_invariant("memory group index dangling"))?
                    .aggregates
                    .accumulate(|column| shard.value(column))?;
            }
        }

        let mut rows = groups
            .into_iter()
            .map(|group| {
                let mut row = group.row;
                group.aggregates.finalize_into(&mut row)?;
                Ok(row)
            })
            .collect::<Result<Vec<_>, InternalError>>()?;
        if rows.is_empty() && self.plan.emits_empty_aggregate() {
            rows.push(self.plan.empty_aggregate_row()?);
        }

        sink::record(MetricsEvent::GroupsMaterialized {
            strategy: MergeStrategy::GroupByMemory,
            groups: u64::try_from(rows.len()).unwrap_or(u64::MAX),
        });

        match self.order.as_mut() {
            Some(order) => sort_rows(order, rows),
            None => Ok(rows),
        }
    }
}

// Stable sort, so equal ORDER BY keys keep first-seen group order.
fn sort_rows(
    order: &mut KeyExtractor,
    rows: Vec<Vec<Cell>>,
) -> Result<Vec<Vec<Cell>>, InternalError> {
    let mut keyed = rows
        .into_iter()
        .map(|row| Ok((order.extract_from_row(&row)?, row)))
        .collect::<Result<Vec<_>, InternalError>>()?;
    let comparator = Arc::clone(order.comparator());
    keyed.sort_by(|(left, _), (right, _)| comparator.compare_keys(left, right));

    Ok(keyed.into_iter().map(|(_, row)| row).collect())
}

impl<S: ShardCursor> MergedCursor for GroupByMemoryMerge<S> {
    fn advance(&mut self) -> Result<bool, InternalError> {
        match self.state {
            CursorState::Exhausted => return Ok(false),
            CursorState::Unstarted => {
                self.rows = self.materialize()?.into_iter();
            }
            CursorState::HasRow | CursorState::Failed => {}
        }

        self.current = self.rows.next();
        self.state = CursorState::after_advance(self.current.is_some());

        Ok(self.current.is_some())
    }

    fn value(&self, column: usize) -> Result<Cell, InternalError> {
        group_row_value(self.state, self.current.as_deref(), column)
    }
}
