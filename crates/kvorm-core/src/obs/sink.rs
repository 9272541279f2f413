//! Metrics sink boundary.
//!
//! Engine code never touches `obs::metrics` directly; every counter update
//! flows through `MetricsEvent` and `MetricsSink`.
use crate::obs::metrics::{self, EventReport};
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = const { RefCell::new(None) };
}

///
/// SaveKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SaveKind {
    Insert,
    Update,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    Save {
        table: &'static str,
        kind: SaveKind,
    },
    Delete {
        table: &'static str,
        rows: u64,
    },
    RowsScanned {
        table: &'static str,
        rows: u64,
    },
    UniqueViolation {
        table: &'static str,
    },
    IndexDelta {
        table: &'static str,
        inserts: u64,
        removes: u64,
    },
    BatchFlush {
        ops: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

///
/// GlobalMetricsSink
/// Default sink writing into the thread-local counters.
///

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        metrics::with_state_mut(|m| match event {
            MetricsEvent::Save { table, kind } => {
                let ops = &mut m.ops;
                match kind {
                    SaveKind::Insert => ops.inserts = ops.inserts.saturating_add(1),
                    SaveKind::Update => ops.updates = ops.updates.saturating_add(1),
                }
                let entry = metrics::table_entry(m, table);
                match kind {
                    SaveKind::Insert => entry.inserts = entry.inserts.saturating_add(1),
                    SaveKind::Update => entry.updates = entry.updates.saturating_add(1),
                }
            }

            MetricsEvent::Delete { table, rows } => {
                m.ops.deletes = m.ops.deletes.saturating_add(rows);
                let entry = metrics::table_entry(m, table);
                entry.deletes = entry.deletes.saturating_add(rows);
            }

            MetricsEvent::RowsScanned { table, rows } => {
                m.ops.rows_scanned = m.ops.rows_scanned.saturating_add(rows);
                let entry = metrics::table_entry(m, table);
                entry.rows_scanned = entry.rows_scanned.saturating_add(rows);
            }

            MetricsEvent::UniqueViolation { table } => {
                m.ops.unique_violations = m.ops.unique_violations.saturating_add(1);
                let entry = metrics::table_entry(m, table);
                entry.unique_violations = entry.unique_violations.saturating_add(1);
            }

            MetricsEvent::IndexDelta {
                table,
                inserts,
                removes,
            } => {
                m.ops.index_inserts = m.ops.index_inserts.saturating_add(inserts);
                m.ops.index_removes = m.ops.index_removes.saturating_add(removes);
                let entry = metrics::table_entry(m, table);
                entry.index_inserts = entry.index_inserts.saturating_add(inserts);
                entry.index_removes = entry.index_removes.saturating_add(removes);
            }

            MetricsEvent::BatchFlush { ops } => {
                m.ops.batch_flushes = m.ops.batch_flushes.saturating_add(1);
                m.ops.batch_ops = m.ops.batch_ops.saturating_add(ops);
            }
        });
    }
}

pub(crate) fn record(event: MetricsEvent) {
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match sink {
        Some(sink) => sink.record(event),
        None => GlobalMetricsSink.record(event),
    }
}

/// Snapshot the current counters.
#[must_use]
pub fn metrics_report() -> EventReport {
    metrics::report()
}

/// Reset all counters.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run `f` with `sink` receiving every event recorded on this thread.
/// The previous sink is restored afterwards, also on unwind.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| *cell.borrow_mut() = prev);
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

///
/// TESTS
///
