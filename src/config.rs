//! Configuration types for hy-thread-metrics.

use std::collections::HashMap;
use std::path::PathBuf;

use prometheus::Opts;
use serde::{Deserialize, Serialize};

use crate::metrics::{HELP, HY_THREAD_STATE};
use crate::procfs::DEFAULT_TASK_DIR;

/// Configuration for the thread-state collector.
///
/// This struct can be deserialized from TOML, YAML, JSON, or environment variables
/// using figment. Naming options are passed through to the metric unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HyThreadConfig {
    /// Metric namespace, prepended as `{namespace}_hy_thread_state`
    #[serde(default)]
    pub namespace: Option<String>,

    /// Metric subsystem, inserted between namespace and name
    #[serde(default)]
    pub subsystem: Option<String>,

    /// Labels with a fixed value attached to every sample
    #[serde(default)]
    pub const_labels: HashMap<String, String>,

    /// Task directory read by the default procfs source (default: "/proc/self/task")
    #[serde(default = "default_task_dir")]
    pub task_dir: PathBuf,
}

fn default_task_dir() -> PathBuf {
    PathBuf::from(DEFAULT_TASK_DIR)
}

impl Default for HyThreadConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            subsystem: None,
            const_labels: HashMap::new(),
            task_dir: default_task_dir(),
        }
    }
}

impl HyThreadConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Metric options for `hy_thread_state` under this configuration.
    pub fn opts(&self) -> Opts {
        let mut opts = Opts::new(HY_THREAD_STATE, HELP).const_labels(self.const_labels.clone());
        if let Some(ref namespace) = self.namespace {
            opts = opts.namespace(namespace.clone());
        }
        if let Some(ref subsystem) = self.subsystem {
            opts = opts.subsystem(subsystem.clone());
        }
        opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HyThreadConfig::default();
        assert!(config.namespace.is_none());
        assert!(config.subsystem.is_none());
        assert!(config.const_labels.is_empty());
        assert_eq!(config.task_dir, PathBuf::from("/proc/self/task"));
    }

    #[test]
    fn test_default_opts() {
        let opts = HyThreadConfig::default().opts();
        assert_eq!(opts.fq_name(), "hy_thread_state");
        assert_eq!(opts.help, "thread state by prefix group");
    }

    #[test]
    fn test_opts_pass_through_naming() {
        let mut config = HyThreadConfig::default();
        config.namespace = Some("myapp".to_string());
        config.subsystem = Some("jobs".to_string());
        config
            .const_labels
            .insert("instance".to_string(), "a".to_string());

        let opts = config.opts();
        assert_eq!(opts.fq_name(), "myapp_jobs_hy_thread_state");
        assert_eq!(opts.const_labels.get("instance").map(String::as_str), Some("a"));
    }

    #[test]
    fn test_deserialize_config() {
        let toml = r#"
            namespace = "myapp"
            task_dir = "/proc/42/task"

            [const_labels]
            service = "ingest"
        "#;

        let config: HyThreadConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.namespace, Some("myapp".to_string()));
        assert!(config.subsystem.is_none());
        assert_eq!(config.task_dir, PathBuf::from("/proc/42/task"));
        assert_eq!(
            config.const_labels.get("service").map(String::as_str),
            Some("ingest")
        );
    }
}
