//! Thread execution states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state a thread occupies at sampling time.
///
/// The label emitted for each state is its upper-snake name, e.g. `TIMED_WAITING`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreadState {
    New,
    Runnable,
    Blocked,
    Waiting,
    TimedWaiting,
    Terminated,
}

impl ThreadState {
    /// All states, in lifecycle order.
    pub const ALL: [ThreadState; 6] = [
        ThreadState::New,
        ThreadState::Runnable,
        ThreadState::Blocked,
        ThreadState::Waiting,
        ThreadState::TimedWaiting,
        ThreadState::Terminated,
    ];

    /// Label value used for the `state` label.
    pub const fn name(self) -> &'static str {
        match self {
            ThreadState::New => "NEW",
            ThreadState::Runnable => "RUNNABLE",
            ThreadState::Blocked => "BLOCKED",
            ThreadState::Waiting => "WAITING",
            ThreadState::TimedWaiting => "TIMED_WAITING",
            ThreadState::Terminated => "TERMINATED",
        }
    }

    /// Map a Linux `/proc/<pid>/task/<tid>/stat` state code.
    ///
    /// | Code | Meaning | State |
    /// |------|---------|-------|
    /// | `R` | running or runnable | `Runnable` |
    /// | `S`, `I`, `P` | interruptible sleep, idle, parked | `Waiting` |
    /// | `T`, `t` | stopped, tracing stop | `Waiting` |
    /// | `D`, `W`, `K` | uninterruptible sleep, paging, wakekill | `Blocked` |
    /// | `Z`, `X`, `x` | zombie, dead | `Terminated` |
    ///
    /// The kernel does not distinguish timed sleeps, so `TimedWaiting` and `New`
    /// are never produced here. Unknown codes return `None`.
    pub fn from_proc_code(code: char) -> Option<Self> {
        match code {
            'R' => Some(ThreadState::Runnable),
            'S' | 'I' | 'P' | 'T' | 't' => Some(ThreadState::Waiting),
            'D' | 'W' | 'K' => Some(ThreadState::Blocked),
            'Z' | 'X' | 'x' => Some(ThreadState::Terminated),
            _ => None,
        }
    }
}

impl fmt::Display for ThreadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
