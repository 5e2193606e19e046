//! Observability: runtime telemetry (metrics) and sink abstractions.
//!
//! Merge code never touches metrics state directly; every event flows
//! through `sink::record`.

pub(crate) mod metrics;
pub(crate) mod sink;


// re-exports
pub use metrics::{EventOps, EventReport, StrategyCounters};
pub use sink::{
    MergeStrategy, MetricsEvent, MetricsSink, PaginationKind, metrics_report, metrics_reset_all,
    with_metrics_sink,
};
