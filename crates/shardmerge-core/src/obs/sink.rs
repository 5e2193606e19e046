//! Metrics sink boundary.
//!
//! Merge logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
//!
//! This module is the only allowed bridge between merge execution
//! and the thread-local metrics state.
use crate::{error::ErrorClass, obs::metrics};
use std::cell::RefCell;

// re-exports
pub use crate::merge::{MergeStrategy, PaginationKind};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn MetricsSink>> = const { RefCell::new(None) };
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    MergeStart {
        strategy: MergeStrategy,
        shards: u64,
    },
    MergeFinish {
        strategy: MergeStrategy,
        rows_emitted: u64,
    },
    /// `strategy` is `None` when the merge failed before one was chosen.
    MergeFailed {
        strategy: Option<MergeStrategy>,
        class: ErrorClass,
    },
    GroupsMaterialized {
        strategy: MergeStrategy,
        groups: u64,
    },
    PaginationApplied {
        kind: PaginationKind,
        skipped: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default sink that writes into thread-local metrics state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::MergeStart { strategy, shards } => {
                metrics::with_state_mut(|m| {
                    m.ops.merges_started = m.ops.merges_started.saturating_add(1);

                    let entry = m
                        .strategies
                        .entry(strategy.label().to_string())
                        .or_default();
                    entry.merges = entry.merges.saturating_add(1);
                    entry.shards = entry.shards.saturating_add(shards);
                });
            }

            MetricsEvent::MergeFinish {
                strategy,
                rows_emitted,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.merges_finished = m.ops.merges_finished.saturating_add(1);
                    m.ops.rows_emitted = m.ops.rows_emitted.saturating_add(rows_emitted);

                    let entry = m
                        .strategies
                        .entry(strategy.label().to_string())
                        .or_default();
                    entry.rows_emitted = entry.rows_emitted.saturating_add(rows_emitted);
                });
            }

            MetricsEvent::MergeFailed { .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.merges_failed = m.ops.merges_failed.saturating_add(1);
                });
            }

            MetricsEvent::GroupsMaterialized { strategy, groups } => {
                metrics::with_state_mut(|m| {
                    m.ops.groups_materialized = m.ops.groups_materialized.saturating_add(groups);

                    let entry = m
                        .strategies
                        .entry(strategy.label().to_string())
                        .or_default();
                    entry.groups = entry.groups.saturating_add(groups);
                });
            }

            MetricsEvent::PaginationApplied { skipped, .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.paginated_merges = m.ops.paginated_merges.saturating_add(1);
                    m.ops.rows_skipped = m.ops.rows_skipped.saturating_add(skipped);
                });
            }
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    let override_ptr = SINK_OVERRIDE.with(|cell| *cell.borrow());
    if let Some(ptr) = override_ptr {
        // SAFETY:
        // Preconditions:
        // - `ptr` was produced from a valid `&dyn MetricsSink` in `with_metrics_sink`.
        // - `with_metrics_sink` always restores the previous pointer before returning,
        //   including unwind paths via `Guard::drop`.
        // - `record` is synchronous and never stores `ptr` beyond this call.
        //
        // Aliasing:
        // - Only a shared reference is materialized, matching the shared borrow
        //   used to install the override.
        unsafe { (&*ptr).record(event) };
    } else {
        GLOBAL_METRICS_SINK.record(event);
    }
}

/// Snapshot the current thread's merge metrics.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics state on the current thread.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
///
/// Events recorded on this thread while `f` runs go to `sink` instead of
/// the global counters.
pub fn with_metrics_sink<T>(sink: &dyn MetricsSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<*const dyn MetricsSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0;
            });
        }
    }

    // SAFETY:
    // - `sink_ptr` is installed only for this dynamic scope.
    // - `Guard` always restores the previous slot on all exits, including panic.
    // - `record` only dereferences synchronously and never persists `sink_ptr`.
    let sink_ptr = unsafe { std::mem::transmute::<&dyn MetricsSink, *const dyn MetricsSink>(sink) };
    let prev = SINK_OVERRIDE.with(|cell| {
        let mut slot = cell.borrow_mut();
        slot.replace(sink_ptr)
    });
    let _guard = Guard(prev);

    f()
}

/// MergeSpan
/// RAII guard that emits start/finish events for one merged result.
/// Finish accounting happens when the owning result is dropped.

#[derive(Debug)]
pub(crate) struct MergeSpan {
    strategy: MergeStrategy,
    rows: u64,
    failed: bool,
}

impl MergeSpan {
    #[must_use]
    pub(crate) fn new(strategy: MergeStrategy, shards: usize) -> Self {
        record(MetricsEvent::MergeStart {
            strategy,
            shards: u64::try_from(shards).unwrap_or(u64::MAX),
        });

        Self {
            strategy,
            rows: 0,
            failed: false,
        }
    }

    pub(crate) const fn strategy(&self) -> MergeStrategy {
        self.strategy
    }

    pub(crate) const fn add_row(&mut self) {
        self.rows = self.rows.saturating_add(1);
    }

    // Only the first failure is reported; a failed merge stays failed.
    pub(crate) fn fail(&mut self, class: ErrorClass) {
        if self.failed {
            return;
        }
        self.failed = true;
        record(MetricsEvent::MergeFailed {
            strategy: Some(self.strategy),
            class,
        });
    }
}

impl Drop for MergeSpan {
    fn drop(&mut self) {
        record(MetricsEvent::MergeFinish {
            strategy: self.strategy,
            rows_emitted: self.rows,
        });
    }
}
