//! Module: merge::orderby
//! Responsibility: k-way streaming merge of shards that are each already
//! sorted by the ORDER BY keys.
//! Does not own: key resolution or null defaults (see `merge::compare`).
//! Boundary: emits rows in global order; ties go to the lower shard index.


use crate::{
    error::InternalError,
    merge::{
        compare::{KeyExtractor, RowComparator},
        cursor::{CursorState, MergedCursor},
        shard::ShardCursor,
    },
    value::Cell,
};
use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
    sync::Arc,
};

///
/// SlotPhase
///
/// Unprimed  → the shard must be advanced before it can compete again.
/// Primed    → the shard's head row is queued in the heap.
/// Exhausted → the shard has no more rows.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum SlotPhase {
    Unprimed,
    Primed,
    Exhausted,
}

///
/// ShardSlot
/// Per-shard lookahead bookkeeping.
///

#[derive(Debug)]
struct ShardSlot {
    phase: SlotPhase,
    last_key: Option<Vec<Cell>>,
}

///
/// HeadEntry
/// One shard's head row competing in the heap.
///

struct HeadEntry {
    key: Vec<Cell>,
    shard: usize,
    comparator: Arc<RowComparator>,
}

impl Ord for HeadEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.comparator
            .compare_keys(&self.key, &other.key)
            .then_with(|| self.shard.cmp(&other.shard))
    }
}

impl PartialOrd for HeadEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HeadEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeadEntry {}

///
/// OrderByStreamMerge
///
/// Each shard holds at most one queued head row. After a row is emitted its
/// shard is re-primed lazily on the next `advance`, so `value` keeps reading
/// the emitting shard's current row.
///

pub(crate) struct OrderByStreamMerge<S> {
    shards: Vec<S>,
    slots: Vec<ShardSlot>,
    heap: BinaryHeap<Reverse<HeadEntry>>,
    extractor: KeyExtractor,
    current: Option<usize>,
    state: CursorState,
    verify_order: bool,
}

impl<S: ShardCursor> OrderByStreamMerge<S> {
    pub(crate) fn new(shards: Vec<S>, comparator: RowComparator, verify_order: bool) -> Self {
        let slots = shards
            .iter()
            .map(|_| ShardSlot {
                phase: SlotPhase::Unprimed,
                last_key: None,
            })
            .collect();
        let heap = BinaryHeap::with_capacity(shards.len());

        Self {
            shards,
            slots,
            heap,
            extractor: KeyExtractor::new(comparator),
            current: None,
            state: CursorState::Unstarted,
            verify_order,
        }
    }

    // Advance one shard and queue its next head row, if any.
    fn prime(&mut self, shard_index: usize) -> Result<(), InternalError> {
        let shard = self
            .shards
            .get_mut(shard_index)
            .ok_or_else(|| InternalError::merge_invariant("order-by merge lost a shard"))?;
        let Some(slot) = self.slots.get_mut(shard_index) else {
            return Err(InternalError::merge_invariant("order-by merge lost a slot"));
        };

        if !shard.advance()? {
            slot.phase = SlotPhase::Exhausted;
            return Ok(());
        }

        let shard = &*shard;
        let key = self.extractor.extract(|column| shard.value(column))?;
        let comparator = Arc::clone(self.extractor.comparator());

        if self.verify_order {
            if let Some(last) = slot.last_key.as_ref()
                && comparator.compare_keys(last, &key) == Ordering::Greater
            {
                return Err(InternalError::merge_invariant(format!(
                    "shard {shard_index} is not sorted by the requested order"
                )));
            }
            slot.last_key = Some(key.clone());
        }

        slot.phase = SlotPhase::Primed;
        self.heap.push(Reverse(HeadEntry {
            key,
            shard: shard_index,
            comparator,
        }));

        Ok(())
    }
}

impl<S: ShardCursor> MergedCursor for OrderByStreamMerge<S> {
    fn advance(&mut self) -> Result<bool, InternalError> {
        match self.state {
            CursorState::Exhausted => return Ok(false),
            CursorState::Unstarted => {
                for shard_index in 0..self.shards.len() {
                    self.prime(shard_index)?;
                }
            }
            CursorState::HasRow | CursorState::Failed => {
                if let Some(shard_index) = self.current.take() {
                    self.prime(shard_index)?;
                }
            }
        }

        if let Some(Reverse(head)) = self.heap.pop() {
            if let Some(slot) = self.slots.get_mut(head.shard) {
                slot.phase = SlotPhase::Unprimed;
            }
            self.current = Some(head.shard);
            self.state = CursorState::HasRow;

            Ok(true)
        } else {
            self.current = None;
            self.state = CursorState::Exhausted;

            Ok(false)
        }
    }

    fn value(&self, column: usize) -> Result<Cell, InternalError> {
        self.state.require_row()?;
        let shard = self
            .current
            .and_then(|shard_index| self.shards.get(shard_index))
            .ok_or_else(|| InternalError::merge_invariant("order-by merge has no current shard"))?;

        shard.value(column)
    }
}

#[cfg(test)]
impl<S> OrderByStreamMerge<S> {
    fn primed_shards(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.phase == SlotPhase::Primed)
            .count()
    }
}
