use crate::{
    error::InternalError,
    merge::{
        cursor::{CursorState, MergedCursor},
        shard::ShardCursor,
    },
    value::Cell,
};

///
/// IteratorStreamMerge
///
/// Concatenates shards in their given order without reordering. Each shard
/// is drained fully before the next one is touched.
///

pub(crate) struct IteratorStreamMerge<S> {
    shards: Vec<S>,
    current: usize,
    state: CursorState,
}

impl<S: ShardCursor> IteratorStreamMerge<S> {
    pub(crate) const fn new(shards: Vec<S>) -> Self {
        Self {
            shards,
            current: 0,
            state: CursorState::Unstarted,
        }
    }
}

impl<S: ShardCursor> MergedCursor for IteratorStreamMerge<S> {
    fn advance(&mut self) -> Result<bool, InternalError> {
        if self.state == CursorState::Exhausted {
            return Ok(false);
        }

        while let Some(shard) = self.shards.get_mut(self.current) {
            if shard.advance()? {
                self.state = CursorState::HasRow;
                return Ok(true);
            }
            self.current += 1;
        }
        self.state = CursorState::Exhausted;

        Ok(false)
    }

    fn value(&self, column: usize) -> Result<Cell, InternalError> {
        self.state.require_row()?;
        let shard = self
            .shards
            .get(self.current)
            .ok_or_else(|| InternalError::merge_invariant("iterator merge lost its shard"))?;

        shard.value(column)
    }
}

///
/// TESTS
///
