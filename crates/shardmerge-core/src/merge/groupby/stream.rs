use crate::{
    error::InternalError,
    merge::{
        MergeStrategy,
        cursor::{CursorState, MergedCursor, read_row},
        groupby::{GroupAggregates, GroupPlan, group_row_value},
        orderby::OrderByStreamMerge,
        shard::ShardCursor,
    },
    obs::sink::{self, MetricsEvent},
    value::Cell,
};

///
/// GroupByStreamMerge
///
/// Folds consecutive rows of a globally ordered stream into groups. Valid
/// only when the group keys are a prefix of the order keys, so equal group
/// keys arrive adjacent. The first row of each group supplies the
/// non-aggregate columns.
///

pub(crate) struct GroupByStreamMerge<S> {
    inner: OrderByStreamMerge<S>,
    plan: GroupPlan,
    inner_has_row: bool,
    current: Option<Vec<Cell>>,
    state: CursorState,
    groups: u64,
}

impl<S: ShardCursor> GroupByStreamMerge<S> {
    pub(crate) const fn new(inner: OrderByStreamMerge<S>, plan: GroupPlan) -> Self {
        Self {
            inner,
            plan,
            inner_has_row: false,
            current: None,
            state: CursorState::Unstarted,
            groups: 0,
        }
    }

    fn emit(&mut self, row: Vec<Cell>) -> bool {
        self.current = Some(row);
        self.state = CursorState::HasRow;
        self.groups = self.groups.saturating_add(1);

        true
    }

    fn exhaust(&mut self) -> bool {
        self.current = None;
        self.state = CursorState::Exhausted;
        sink::record(MetricsEvent::GroupsMaterialized {
            strategy: MergeStrategy::GroupByStream,
            groups: self.groups,
        });

        false
    }

    // Inner cursor sits on the first row of a group; consume the whole group.
    fn fold_group(&mut self) -> Result<Vec<Cell>, InternalError> {
        let inner = &self.inner;
        let key = self.plan.keys.extract(|column| inner.value(column))?;
        let mut row = read_row(self.plan.column_count, |column| inner.value(column))?;
        let mut aggregates = GroupAggregates::new(&self.plan.units);
        aggregates.accumulate(|column| inner.value(column))?;

        loop {
            self.inner_has_row = self.inner.advance()?;
            if !self.inner_has_row {
                break;
            }

            let inner = &self.inner;
            let next = self.plan.keys.extract(|column| inner.value(column))?;
            if !self.plan.keys.same_group(&key, &next) {
                break;
            }
            aggregates.accumulate(|column| inner.value(column))?;
        }

        aggregates.finalize_into(&mut row)?;

        Ok(row)
    }
}

impl<S: ShardCursor> MergedCursor for GroupByStreamMerge<S> {
    fn advance(&mut self) -> Result<bool, InternalError> {
        match self.state {
            CursorState::Exhausted => return Ok(false),
            CursorState::Unstarted => {
                self.inner_has_row = self.inner.advance()?;
                if !self.inner_has_row {
                    if self.plan.emits_empty_aggregate() {
                        let row = self.plan.empty_aggregate_row()?;
                        return Ok(self.emit(row));
                    }
                    return Ok(self.exhaust());
                }
            }
            CursorState::HasRow | CursorState::Failed => {}
        }

        if !self.inner_has_row {
            return Ok(self.exhaust());
        }
        let row = self.fold_group()?;

        Ok(self.emit(row))
    }

    fn value(&self, column: usize) -> Result<Cell, InternalError> {
        group_row_value(self.state, self.current.as_deref(), column)
    }
}
