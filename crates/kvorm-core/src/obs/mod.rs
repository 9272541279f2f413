//! Module: obs
//! Responsibility: runtime counters and the sink engine code reports through.
//! Does not own: store inspection or logging (tables log through `tracing`).
//! Boundary: engine code emits `MetricsEvent`s via `sink::record` only.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventReport, EventState, TableCounters};
pub use sink::{MetricsEvent, MetricsSink, SaveKind, metrics_report, metrics_reset_all, with_metrics_sink};
