//! Thread snapshot sources.
//!
//! A snapshot source answers two synchronous queries: which thread ids are
//! live, and what each of a given set of ids is called and doing right now.
//! The two queries are not atomic with respect to each other; a thread that
//! exits in between is reported as `None` by [`ThreadSnapshotSource::describe_threads`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::state::ThreadState;

/// One live thread at sampling time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSnapshotEntry {
    /// Thread identifier. Only strictly positive ids are valid.
    pub id: i64,
    /// Display name. May be empty.
    pub name: String,
    /// Execution state.
    pub state: ThreadState,
}

impl ThreadSnapshotEntry {
    pub fn new(id: i64, name: impl Into<String>, state: ThreadState) -> Self {
        Self {
            id,
            name: name.into(),
            state,
        }
    }
}

/// Queryable view of the threads of a running process.
///
/// Implementations must be safe to query from several scrapes at once.
pub trait ThreadSnapshotSource: Send + Sync {
    /// List the ids of all live threads. May include non-positive sentinels.
    fn thread_ids(&self) -> Result<Vec<i64>>;

    /// Describe each of `ids`, in order.
    ///
    /// The returned vector has one slot per requested id; `None` marks a thread
    /// that can no longer be resolved. `stack_depth` is the number of stack
    /// frames requested per thread; callers in this crate always pass 0.
    fn describe_threads(
        &self,
        ids: &[i64],
        stack_depth: usize,
    ) -> Result<Vec<Option<ThreadSnapshotEntry>>>;
}

/// A fixed, pre-built snapshot.
///
/// Useful for substituting the live process view, e.g. in tests or when thread
/// information is collected elsewhere.
///
/// # Example
///
/// ```
/// use hy_thread_metrics::{StaticSource, ThreadSnapshotEntry, ThreadState};
///
/// let source = StaticSource::new(vec![
///     ThreadSnapshotEntry::new(1, "worker-1", ThreadState::Runnable),
///     ThreadSnapshotEntry::new(2, "main", ThreadState::Waiting),
/// ]);
/// let tally = hy_thread_metrics::sample(&source).unwrap();
/// assert_eq!(tally.get("worker", ThreadState::Runnable), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    entries: Vec<ThreadSnapshotEntry>,
}

impl StaticSource {
    pub fn new(entries: Vec<ThreadSnapshotEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ThreadSnapshotEntry] {
        &self.entries
    }
}

impl ThreadSnapshotSource for StaticSource {
    fn thread_ids(&self) -> Result<Vec<i64>> {
        Ok(self.entries.iter().map(|e| e.id).collect())
    }

    fn describe_threads(
        &self,
        ids: &[i64],
        _stack_depth: usize,
    ) -> Result<Vec<Option<ThreadSnapshotEntry>>> {
        // Reversed so the first entry wins when ids repeat
        let by_id: HashMap<i64, &ThreadSnapshotEntry> =
            self.entries.iter().rev().map(|e| (e.id, e)).collect();
        Ok(ids
            .iter()
            .map(|id| by_id.get(id).map(|&e| e.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_source_lists_all_ids() {
        let source = StaticSource::new(vec![
            ThreadSnapshotEntry::new(3, "a", ThreadState::Runnable),
            ThreadSnapshotEntry::new(-1, "b", ThreadState::Runnable),
            ThreadSnapshotEntry::new(0, "c", ThreadState::Waiting),
        ]);
        assert_eq!(source.thread_ids().unwrap(), vec![3, -1, 0]);
    }

    #[test]
    fn test_static_source_unknown_id_is_none() {
        let source = StaticSource::new(vec![ThreadSnapshotEntry::new(
            7,
            "worker-7",
            ThreadState::Blocked,
        )]);
        let described = source.describe_threads(&[7, 8], 0).unwrap();
        assert_eq!(described.len(), 2);
        assert_eq!(described[0].as_ref().map(|e| e.name.as_str()), Some("worker-7"));
        assert!(described[1].is_none());
    }

    #[test]
    fn test_static_source_describes_in_request_order() {
        let entries: Vec<_> = (1..=256)
            .map(|i| ThreadSnapshotEntry::new(i, format!("pool-{i}"), ThreadState::Runnable))
            .collect();
        let source = StaticSource::new(entries);

        let described = source.describe_threads(&[200, 3, 999, 3], 0).unwrap();
        let ids: Vec<_> = described.iter().map(|e| e.as_ref().map(|e| e.id)).collect();
        assert_eq!(ids, vec![Some(200), Some(3), None, Some(3)]);
    }

    #[test]
    fn test_static_source_first_duplicate_wins() {
        let source = StaticSource::new(vec![
            ThreadSnapshotEntry::new(4, "first", ThreadState::Waiting),
            ThreadSnapshotEntry::new(4, "second", ThreadState::Blocked),
        ]);
        let described = source.describe_threads(&[4], 0).unwrap();
        assert_eq!(described[0].as_ref().map(|e| e.name.as_str()), Some("first"));
    }
}
