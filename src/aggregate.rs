//! Grouping and tallying of thread snapshots.
//!
//! This module is independent of any metrics registry. It turns a snapshot into
//! a [`Tally`] of `group -> state -> count`, where the group is derived from the
//! thread name by [`group_key`].
//!
//! # Example
//!
//! ```
//! use hy_thread_metrics::{aggregate, ThreadSnapshotEntry, ThreadState};
//!
//! let tally = aggregate(vec![
//!     ThreadSnapshotEntry::new(1, "worker-1", ThreadState::Runnable),
//!     ThreadSnapshotEntry::new(2, "worker-2", ThreadState::Runnable),
//!     ThreadSnapshotEntry::new(3, "main", ThreadState::Waiting),
//! ]);
//! assert_eq!(tally.get("worker", ThreadState::Runnable), 2);
//! assert_eq!(tally.total(), 3);
//! ```

use std::collections::HashMap;

use crate::error::Result;
use crate::metrics::ObservationSink;
use crate::snapshot::{ThreadSnapshotEntry, ThreadSnapshotSource};
use crate::state::ThreadState;

/// Separator between a thread group's name and the per-thread suffix.
pub const GROUP_SEPARATOR: char = '-';

/// Keep only strictly positive thread ids, preserving order.
pub fn retain_valid_ids(ids: &[i64]) -> Vec<i64> {
    ids.iter().copied().filter(|&id| id > 0).collect()
}

/// Derive the group key for a thread name.
///
/// If the first `-` sits after position 0, the key is everything before the
/// *last* `-`. Otherwise (no `-`, or a leading `-`) the name is its own key.
///
/// ```
/// use hy_thread_metrics::group_key;
///
/// assert_eq!(group_key("worker-3"), "worker");
/// assert_eq!(group_key("worker-pool-7"), "worker-pool");
/// assert_eq!(group_key("main"), "main");
/// assert_eq!(group_key("-oddname"), "-oddname");
/// ```
pub fn group_key(name: &str) -> &str {
    match name.find(GROUP_SEPARATOR) {
        Some(first) if first > 0 => {
            // first > 0 guarantees a last occurrence at or after it
            let last = name.rfind(GROUP_SEPARATOR).unwrap_or(first);
            &name[..last]
        }
        _ => name,
    }
}

/// Per-group, per-state thread counts from a single snapshot.
///
/// Only pairs with at least one thread are present; a missing pair means zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    groups: HashMap<String, HashMap<ThreadState, u64>>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one thread of `state` in the group derived from `name`.
    pub fn record(&mut self, name: &str, state: ThreadState) {
        *self
            .groups
            .entry(group_key(name).to_string())
            .or_default()
            .entry(state)
            .or_insert(0) += 1;
    }

    /// Count for a `(group, state)` pair, 0 if absent.
    pub fn get(&self, group: &str, state: ThreadState) -> u64 {
        self.groups
            .get(group)
            .and_then(|states| states.get(&state))
            .copied()
            .unwrap_or(0)
    }

    /// Whether the `(group, state)` pair was observed at all.
    pub fn contains(&self, group: &str, state: ThreadState) -> bool {
        self.groups
            .get(group)
            .is_some_and(|states| states.contains_key(&state))
    }

    /// State counts for one group.
    pub fn group(&self, group: &str) -> Option<&HashMap<ThreadState, u64>> {
        self.groups.get(group)
    }

    /// Names of all observed groups, in no particular order.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// All `(group, state, count)` triples, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ThreadState, u64)> {
        self.groups.iter().flat_map(|(group, states)| {
            states
                .iter()
                .map(move |(state, count)| (group.as_str(), *state, *count))
        })
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.groups.values().flat_map(HashMap::values).sum()
    }

    /// Number of `(group, state)` pairs.
    pub fn len(&self) -> usize {
        self.groups.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Report every pair to `sink` as `(count, group, state name)`.
    pub fn emit<S: ObservationSink + ?Sized>(&self, sink: &mut S) {
        for (group, state, count) in self.iter() {
            sink.report(count as f64, group, state.name());
        }
    }
}

/// Tally a sequence of snapshot entries, skipping non-positive ids.
pub fn aggregate<I>(entries: I) -> Tally
where
    I: IntoIterator<Item = ThreadSnapshotEntry>,
{
    let mut tally = Tally::new();
    for entry in entries.into_iter().filter(|e| e.id > 0) {
        tally.record(&entry.name, entry.state);
    }
    tally
}

/// Take a fresh snapshot from `source` and tally it.
///
/// Ids are filtered before the detail query so invalid ids are never described.
/// Threads that vanish between the two queries are skipped. Errors from the
/// source are returned unchanged.
pub fn sample<S: ThreadSnapshotSource + ?Sized>(source: &S) -> Result<Tally> {
    let ids = retain_valid_ids(&source.thread_ids()?);
    let described = source.describe_threads(&ids, 0)?;
    Ok(aggregate(described.into_iter().flatten()))
}
