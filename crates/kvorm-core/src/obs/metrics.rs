use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for table operations.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub tables: BTreeMap<String, TableCounters>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Writes
    pub inserts: u64,
    pub updates: u64,
    pub deletes: u64,

    // Reads
    pub rows_scanned: u64,

    // Index maintenance
    pub index_inserts: u64,
    pub index_removes: u64,
    pub unique_violations: u64,

    // Batches
    pub batch_flushes: u64,
    pub batch_ops: u64,
}

///
/// TableCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TableCounters {
    pub inserts: u64,
    pub updates: u64,
    pub deletes: u64,
    pub rows_scanned: u64,
    pub index_inserts: u64,
    pub index_removes: u64,
    pub unique_violations: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Counters for one table, created on first use.
pub(crate) fn table_entry<'a>(m: &'a mut EventState, table: &str) -> &'a mut TableCounters {
    m.tables.entry(table.to_string()).or_default()
}

/// Reset all counters.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventReport {
    pub counters: EventOps,
    /// Per-table counters, busiest first.
    pub tables: Vec<(String, TableCounters)>,
}

/// Build a report from the in-memory counters.
#[must_use]
pub(crate) fn report() -> EventReport {
    let snap = with_state(Clone::clone);

    let mut tables: Vec<_> = snap.tables.into_iter().collect();
    tables.sort_by(|(a_name, a), (b_name, b)| {
        let a_ops = a.inserts.saturating_add(a.updates).saturating_add(a.deletes);
        let b_ops = b.inserts.saturating_add(b.updates).saturating_add(b.deletes);
        b_ops.cmp(&a_ops).then_with(|| a_name.cmp(b_name))
    });

    EventReport {
        counters: snap.ops,
        tables,
    }
}
