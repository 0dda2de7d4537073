//! # hy-thread-metrics
//!
//! **Live thread counts, grouped by name prefix and state**
//!
//! A Prometheus collector exposing a single gauge, `hy_thread_state{prefix, state}`:
//! the number of threads in this process per thread-group prefix and execution state.
//!
//! ## Features
//!
//! - **Pull-based**: Nothing runs in the background; every scrape takes a fresh snapshot
//! - **Prefix grouping**: `worker-pool-7` and `worker-pool-8` both count toward `worker-pool`
//! - **No stale series**: Groups that vanish between scrapes vanish from the output
//! - **Pluggable snapshots**: Reads procfs by default, or any [`ThreadSnapshotSource`]
//! - **Flexible Configuration**: Configure via files (TOML/YAML/JSON), environment variables, or code
//!
//! ## Quick Start
//!
//! ```no_run
//! use hy_thread_metrics::HyThreadMetrics;
//! use prometheus::Registry;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Registry::new();
//!     HyThreadMetrics::builder().register(&registry)?;
//!
//!     // Every gather() recomputes the thread counts
//!     for family in registry.gather() {
//!         println!("{}: {} series", family.get_name(), family.get_metric().len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Grouping
//!
//! A thread's group is its name up to the last `-`, unless the name has no `-`
//! or starts with one, in which case the whole name is the group:
//!
//! | Thread name | Group |
//! |-------------|-------|
//! | `worker-3` | `worker` |
//! | `worker-pool-7` | `worker-pool` |
//! | `main` | `main` |
//! | `-oddname` | `-oddname` |
//!
//! ## Configuration
//!
//! Configuration sources are merged in order (later sources override earlier):
//!
//! 1. Default values
//! 2. Config files (via `.file()`)
//! 3. Environment variables (via `.env_prefix()`)
//! 4. Programmatic overrides
//!
//! ### Config File Example (TOML)
//!
//! ```toml
//! namespace = "myapp"
//! task_dir = "/proc/self/task"
//!
//! [const_labels]
//! service = "ingest"
//! ```
//!
//! ## Thread States
//!
//! On Linux, states come from `/proc/self/task/<tid>/stat`. See
//! [`ThreadState::from_proc_code`] for the mapping.

pub mod aggregate;
pub mod builder;
pub mod config;
pub mod error;
pub mod metrics;
pub mod procfs;
pub mod snapshot;
pub mod state;

pub use aggregate::{aggregate, group_key, retain_valid_ids, sample, Tally};
pub use builder::HyThreadMetricsBuilder;
pub use config::HyThreadConfig;
pub use error::{HyThreadError, Result};
pub use metrics::{HyThreadMetrics, ObservationSink, HY_THREAD_STATE};
pub use procfs::ProcfsSource;
pub use snapshot::{StaticSource, ThreadSnapshotEntry, ThreadSnapshotSource};
pub use state::ThreadState;
