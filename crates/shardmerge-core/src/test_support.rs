use crate::{
    error::InternalError,
    merge::{MemoryShardCursor, MergedCursor, ShardCursor},
    obs::sink::{MetricsEvent, MetricsSink, with_metrics_sink},
    value::Cell,
};
use std::cell::RefCell;

///
/// CaptureSink
///

#[derive(Default)]
pub struct CaptureSink {
    events: RefCell<Vec<MetricsEvent>>,
}

impl CaptureSink {
    pub fn into_events(self) -> Vec<MetricsEvent> {
        self.events.into_inner()
    }
}

impl MetricsSink for CaptureSink {
    fn record(&self, event: MetricsEvent) {
        self.events.borrow_mut().push(event);
    }
}

/// Run `f` and capture every metrics event it records.
pub fn capture_events<R>(f: impl FnOnce() -> R) -> (R, Vec<MetricsEvent>) {
    let sink = CaptureSink::default();
    let output = with_metrics_sink(&sink, f);

    (output, sink.into_events())
}

/// Integer-only rows, for tests that only care about ordering.
pub fn int_rows(rows: &[&[i64]]) -> Vec<Vec<Cell>> {
    rows.iter()
        .map(|row| row.iter().copied().map(Cell::Int).collect())
        .collect()
}

pub fn shard(labels: &[&str], rows: Vec<Vec<Cell>>) -> MemoryShardCursor {
    MemoryShardCursor::new(labels.iter().copied(), rows)
}

/// Drain a merged cursor, reading `column_count` columns per row.
pub fn drain(cursor: &mut dyn MergedCursor, column_count: usize) -> Vec<Vec<Cell>> {
    let mut rows = Vec::new();
    while cursor.advance().expect("advance should succeed") {
        rows.push(
            (1..=column_count)
                .map(|column| cursor.value(column).expect("value should read"))
                .collect(),
        );
    }

    rows
}

///
/// FailingShardCursor
///
/// Yields `rows` and then fails the next advance with a shard I/O error.
///

pub struct FailingShardCursor {
    inner: MemoryShardCursor,
    remaining: usize,
}

impl FailingShardCursor {
    pub fn new(labels: &[&str], rows: Vec<Vec<Cell>>) -> Self {
        let remaining = rows.len();

        Self {
            inner: shard(labels, rows),
            remaining,
        }
    }
}

impl ShardCursor for FailingShardCursor {
    fn column_count(&self) -> usize {
        self.inner.column_count()
    }

    fn column_label(&self, index: usize) -> Result<String, InternalError> {
        self.inner.column_label(index)
    }

    fn advance(&mut self) -> Result<bool, InternalError> {
        if self.remaining == 0 {
            return Err(InternalError::shard_io("connection reset by peer"));
        }
        self.remaining -= 1;

        self.inner.advance()
    }

    fn value(&self, index: usize) -> Result<Cell, InternalError> {
        self.inner.value(index)
    }
}
