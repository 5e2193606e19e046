//! Module: merge::shard
//! Responsibility: the per-shard cursor contract consumed by every merge.
//! Does not own: query execution or connection handling.
//! Boundary: merges read shard rows only through `ShardCursor`.

use crate::{error::InternalError, value::Cell};

///
/// ShardCursor
///
/// Forward-only cursor over the rows one physical shard returned.
/// Column indexes are 1-based. `value` is only meaningful after `advance`
/// returned `true`; communication failures surface as shard I/O errors.
///

pub trait ShardCursor {
    fn column_count(&self) -> usize;

    fn column_label(&self, index: usize) -> Result<String, InternalError>;

    fn advance(&mut self) -> Result<bool, InternalError>;

    fn value(&self, index: usize) -> Result<Cell, InternalError>;
}

impl<T> ShardCursor for Box<T>
where
    T: ShardCursor + ?Sized,
{
    fn column_count(&self) -> usize {
        self.as_ref().column_count()
    }

    fn column_label(&self, index: usize) -> Result<String, InternalError> {
        self.as_ref().column_label(index)
    }

    fn advance(&mut self) -> Result<bool, InternalError> {
        self.as_mut().advance()
    }

    fn value(&self, index: usize) -> Result<Cell, InternalError> {
        self.as_ref().value(index)
    }
}

///
/// MemoryShardCursor
///
/// Adapter that exposes one materialized shard result through the
/// `ShardCursor` interface.
///

#[derive(Clone, Debug)]
pub struct MemoryShardCursor {
    labels: Vec<String>,
    rows: Vec<Vec<Cell>>,
    position: Option<usize>,
}

impl MemoryShardCursor {
    #[must_use]
    pub fn new<L: Into<String>>(labels: impl IntoIterator<Item = L>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            rows,
            position: None,
        }
    }

    #[must_use]
    pub const fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn current_row(&self) -> Result<&[Cell], InternalError> {
        self.position
            .and_then(|position| self.rows.get(position))
            .map(Vec::as_slice)
            .ok_or_else(|| InternalError::shard_contract("shard cursor is not positioned on a row"))
    }
}

impl ShardCursor for MemoryShardCursor {
    fn column_count(&self) -> usize {
        self.labels.len()
    }

    fn column_label(&self, index: usize) -> Result<String, InternalError> {
        index
            .checked_sub(1)
            .and_then(|slot| self.labels.get(slot))
            .cloned()
            .ok_or_else(|| {
                InternalError::shard_contract(format!(
                    "column index {index} out of range 1..={}",
                    self.labels.len()
                ))
            })
    }

    fn advance(&mut self) -> Result<bool, InternalError> {
        let next = self.position.map_or(0, |position| position.saturating_add(1));
        // park one past the end so repeated calls stay exhausted
        self.position = Some(next.min(self.rows.len()));

        Ok(next < self.rows.len())
    }

    fn value(&self, index: usize) -> Result<Cell, InternalError> {
        let row = self.current_row()?;

        index
            .checked_sub(1)
            .and_then(|slot| row.get(slot))
            .cloned()
            .ok_or_else(|| {
                InternalError::shard_contract(format!(
                    "column index {index} out of range 1..={}",
                    row.len()
                ))
            })
    }
}
