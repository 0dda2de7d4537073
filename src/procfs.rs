//! Linux procfs-backed thread snapshots.
//!
//! Each thread of the current process appears as a directory under
//! `/proc/self/task/<tid>`. Its `stat` file starts with
//! `<tid> (<comm>) <state> ...`, which carries everything the aggregator needs.
//!
//! Note that the kernel truncates `comm` to 15 bytes, so long thread names are
//! grouped by their truncated form.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{HyThreadError, Result};
use crate::snapshot::{ThreadSnapshotEntry, ThreadSnapshotSource};
use crate::state::ThreadState;

/// Default task directory for the current process.
pub const DEFAULT_TASK_DIR: &str = "/proc/self/task";

/// Snapshot source reading a procfs task directory.
#[derive(Debug, Clone)]
pub struct ProcfsSource {
    task_dir: PathBuf,
}

impl Default for ProcfsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcfsSource {
    /// Source for the threads of the current process.
    pub fn new() -> Self {
        Self::with_task_dir(DEFAULT_TASK_DIR)
    }

    /// Source reading an arbitrary task directory, e.g. `/proc/<pid>/task`.
    pub fn with_task_dir(task_dir: impl Into<PathBuf>) -> Self {
        Self {
            task_dir: task_dir.into(),
        }
    }

    pub fn task_dir(&self) -> &Path {
        &self.task_dir
    }

    fn read_entry(&self, id: i64) -> Result<Option<ThreadSnapshotEntry>> {
        let path = self.task_dir.join(id.to_string()).join("stat");
        // comm is arbitrary bytes and may be cut mid-character, so read raw
        let contents = match fs::read(&path) {
            Ok(contents) => contents,
            Err(e) if is_vanished(&e) => {
                debug!(tid = id, "thread exited before it could be described");
                return Ok(None);
            }
            Err(e) => return Err(HyThreadError::io(path, e)),
        };

        let stat = parse_stat(&contents).map_err(|reason| HyThreadError::MalformedStat {
            path: path.clone(),
            reason: reason.to_string(),
        })?;

        match ThreadState::from_proc_code(stat.state) {
            Some(state) => Ok(Some(ThreadSnapshotEntry::new(stat.tid, stat.comm, state))),
            None => {
                debug!(tid = id, code = %stat.state, "unknown thread state code");
                Ok(None)
            }
        }
    }
}

impl ThreadSnapshotSource for ProcfsSource {
    fn thread_ids(&self) -> Result<Vec<i64>> {
        let dir = fs::read_dir(&self.task_dir).map_err(|e| HyThreadError::io(&self.task_dir, e))?;

        let mut ids = Vec::new();
        for entry in dir {
            let entry = entry.map_err(|e| HyThreadError::io(&self.task_dir, e))?;
            // Anything that is not a numeric tid is not a task.
            if let Some(id) = entry.file_name().to_str().and_then(|s| s.parse::<i64>().ok()) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    fn describe_threads(
        &self,
        ids: &[i64],
        _stack_depth: usize,
    ) -> Result<Vec<Option<ThreadSnapshotEntry>>> {
        ids.iter().map(|&id| self.read_entry(id)).collect()
    }
}

fn is_vanished(e: &io::Error) -> bool {
    // ESRCH: the task went away while we were reading it
    e.kind() == io::ErrorKind::NotFound || e.raw_os_error() == Some(libc::ESRCH)
}

/// Leading fields of a procfs `stat` record.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct StatFields {
    pub tid: i64,
    pub comm: String,
    pub state: char,
}

/// Parse `<tid> (<comm>) <state> ...`.
///
/// `comm` may itself contain spaces and parentheses, so it spans from the first
/// `(` to the last `)`. Bytes that are not valid UTF-8 are replaced with U+FFFD.
pub(crate) fn parse_stat(line: &[u8]) -> std::result::Result<StatFields, &'static str> {
    let open = line.iter().position(|&b| b == b'(').ok_or("missing '('")?;
    let close = line.iter().rposition(|&b| b == b')').ok_or("missing ')'")?;
    if close < open {
        return Err("')' precedes '('");
    }

    let tid = std::str::from_utf8(&line[..open])
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .ok_or("invalid tid")?;
    let comm = String::from_utf8_lossy(&line[open + 1..close]).into_owned();
    let state = line[close + 1..]
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .map(|&b| char::from(b))
        .ok_or("missing state")?;

    Ok(StatFields { tid, comm, state })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_stat(dir: &Path, tid: i64, comm: &str, state: char) {
        let task = dir.join(tid.to_string());
        fs::create_dir_all(&task).unwrap();
        fs::write(
            task.join("stat"),
            format!("{tid} ({comm}) {state} 1 1 1 0 -1 4194368 0 0 0 0\n"),
        )
        .unwrap();
    }

    #[test]
    fn test_parse_stat_simple() {
        let fields = parse_stat(b"1234 (worker-3) S 1 1234 1234 0 -1").unwrap();
        assert_eq!(
            fields,
            StatFields {
                tid: 1234,
                comm: "worker-3".to_string(),
                state: 'S'
            }
        );
    }

    #[test]
    fn test_parse_stat_comm_with_parens_and_spaces() {
        let fields = parse_stat(b"42 (odd (name) x) R 1 2 3").unwrap();
        assert_eq!(fields.comm, "odd (name) x");
        assert_eq!(fields.state, 'R');
    }

    #[test]
    fn test_parse_stat_empty_comm() {
        let fields = parse_stat(b"7 () D 1").unwrap();
        assert_eq!(fields.comm, "");
        assert_eq!(fields.state, 'D');
    }

    #[test]
    fn test_parse_stat_malformed() {
        assert!(parse_stat(b"").is_err());
        assert!(parse_stat(b"12 worker R").is_err());
        assert!(parse_stat(b"abc (worker) R").is_err());
        assert!(parse_stat(b"12 (worker)").is_err());
    }

    #[test]
    fn test_parse_stat_invalid_utf8_comm() {
        // 15-byte truncation can split a multibyte character
        let fields = parse_stat(b"9 (ab\xc3) S 1").unwrap();
        assert_eq!(fields.tid, 9);
        assert_eq!(fields.comm, "ab\u{fffd}");
        assert_eq!(fields.state, 'S');
    }

    #[test]
    fn test_is_vanished() {
        assert!(is_vanished(&io::Error::from(io::ErrorKind::NotFound)));
        assert!(is_vanished(&io::Error::from_raw_os_error(libc::ESRCH)));
        assert!(!is_vanished(&io::Error::from_raw_os_error(libc::EACCES)));
        assert!(!is_vanished(&io::Error::from(io::ErrorKind::PermissionDenied)));
    }

    #[test]
    fn test_invalid_utf8_name_does_not_drop_other_threads() {
        let dir = tempfile::tempdir().unwrap();
        write_stat(dir.path(), 10, "main", 'S');
        let task = dir.path().join("11");
        fs::create_dir(&task).unwrap();
        fs::write(task.join("stat"), b"11 (abcdefghijklm-\xc3) R 1 1 1\n").unwrap();

        let source = ProcfsSource::with_task_dir(dir.path());
        let described = source.describe_threads(&[10, 11], 0).unwrap();
        assert_eq!(
            described,
            vec![
                Some(ThreadSnapshotEntry::new(10, "main", ThreadState::Waiting)),
                Some(ThreadSnapshotEntry::new(
                    11,
                    "abcdefghijklm-\u{fffd}",
                    ThreadState::Runnable
                )),
            ]
        );

        let tally = crate::aggregate::sample(&source).unwrap();
        assert_eq!(tally.total(), 2);
        assert_eq!(tally.get("abcdefghijklm", ThreadState::Runnable), 1);
    }

    #[test]
    fn test_lists_numeric_tasks_only() {
        let dir = tempfile::tempdir().unwrap();
        write_stat(dir.path(), 10, "main", 'S');
        write_stat(dir.path(), 11, "worker-1", 'R');
        fs::create_dir(dir.path().join("not-a-task")).unwrap();

        let source = ProcfsSource::with_task_dir(dir.path());
        let mut ids = source.thread_ids().unwrap();
        ids.sort_unstable();
        assert_eq!(ids, vec![10, 11]);
    }

    #[test]
    fn test_describe_skips_vanished_and_unknown() {
        let dir = tempfile::tempdir().unwrap();
        write_stat(dir.path(), 10, "main", 'S');
        write_stat(dir.path(), 12, "weird", '?');

        let source = ProcfsSource::with_task_dir(dir.path());
        let described = source.describe_threads(&[10, 11, 12], 0).unwrap();
        assert_eq!(
            described,
            vec![
                Some(ThreadSnapshotEntry::new(10, "main", ThreadState::Waiting)),
                None,
                None,
            ]
        );
    }

    #[test]
    fn test_missing_task_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = ProcfsSource::with_task_dir(dir.path().join("missing"));
        let err = source.thread_ids().unwrap_err();
        assert!(matches!(err, HyThreadError::Io { .. }));
    }

    #[test]
    fn test_malformed_stat_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let task = dir.path().join("5");
        fs::create_dir(&task).unwrap();
        fs::write(task.join("stat"), "garbage").unwrap();

        let source = ProcfsSource::with_task_dir(dir.path());
        let err = source.describe_threads(&[5], 0).unwrap_err();
        assert!(matches!(err, HyThreadError::MalformedStat { .. }));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_current_process_has_threads() {
        let source = ProcfsSource::new();
        let ids = source.thread_ids().unwrap();
        assert!(!ids.is_empty());
        let described = source.describe_threads(&ids, 0).unwrap();
        assert!(described.iter().any(Option::is_some));
    }
}
