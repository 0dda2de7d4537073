//! Builder pattern for constructing and registering the thread-state collector.
//!
//! The builder supports multiple configuration sources using figment:
//! - Default values
//! - An explicit [`HyThreadConfig`]
//! - Config files (TOML, YAML, JSON)
//! - Environment variables
//! - Programmatic overrides

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use figment::Figment;
use prometheus::Registry;

use crate::config::HyThreadConfig;
use crate::error::Result;
use crate::metrics::HyThreadMetrics;
use crate::procfs::ProcfsSource;
use crate::snapshot::ThreadSnapshotSource;

/// Builder for registering a [`HyThreadMetrics`] collector.
///
/// Configuration sources are merged in the following order (later sources override earlier):
/// 1. Default values (or the config passed to [`with_config`](Self::with_config))
/// 2. Config files (in order added)
/// 3. Environment variables
/// 4. Programmatic overrides
///
/// # Examples
///
/// ```no_run
/// use hy_thread_metrics::HyThreadMetrics;
/// use prometheus::Registry;
///
/// let registry = Registry::new();
/// let metrics = HyThreadMetrics::builder()
///     .file("metrics.toml")
///     .env_prefix("HY_THREADS")
///     .namespace("myapp")
///     .register(&registry)?;
/// # Ok::<(), hy_thread_metrics::HyThreadError>(())
/// ```
pub struct HyThreadMetricsBuilder {
    figment: Figment,
    snapshot_source: Option<Arc<dyn ThreadSnapshotSource>>,
}

impl Default for HyThreadMetricsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HyThreadMetricsBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyThreadMetricsBuilder")
            .field("figment", &self.figment)
            .field(
                "snapshot_source",
                &self.snapshot_source.as_ref().map(|_| "<ThreadSnapshotSource>"),
            )
            .finish()
    }
}

impl HyThreadMetricsBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::with_config(HyThreadConfig::default())
    }

    /// Create a builder whose base layer is `config`.
    ///
    /// Files, environment variables and setters still override it.
    pub fn with_config(config: HyThreadConfig) -> Self {
        Self {
            figment: Figment::from(Serialized::defaults(config)),
            snapshot_source: None,
        }
    }

    /// Add a configuration file.
    ///
    /// Supports TOML, YAML, and JSON formats (detected by extension).
    /// Files are merged in the order they are added. Missing files are ignored.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        self.figment = match extension.to_lowercase().as_str() {
            "yaml" | "yml" => self.figment.merge(Yaml::file(path)),
            "json" => self.figment.merge(Json::file(path)),
            _ => self.figment.merge(Toml::file(path)),
        };
        self
    }

    /// Add environment variables with a prefix.
    ///
    /// Environment variables are expected in the format `{PREFIX}_{KEY}`,
    /// e.g., `HY_THREADS_NAMESPACE`, `HY_THREADS_TASK_DIR`.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.figment = self
            .figment
            .merge(Env::prefixed(&format!("{}_", prefix)));
        self
    }

    /// Set the metric namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("namespace", namespace.into()));
        self
    }

    /// Set the metric subsystem.
    pub fn subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("subsystem", subsystem.into()));
        self
    }

    /// Attach a constant label to every sample.
    ///
    /// Repeated calls accumulate; a repeated name keeps the last value.
    pub fn const_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let label = HashMap::from([(name.into(), value.into())]);
        self.figment = self
            .figment
            .merge(Serialized::default("const_labels", label));
        self
    }

    /// Set the task directory read by the default procfs source.
    ///
    /// Ignored when a snapshot source is supplied explicitly.
    pub fn task_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("task_dir", dir.into()));
        self
    }

    /// Use `source` instead of the current process's procfs view.
    pub fn snapshot_source(mut self, source: Arc<dyn ThreadSnapshotSource>) -> Self {
        self.snapshot_source = Some(source);
        self
    }

    /// Extract the merged configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration source fails to parse.
    pub fn config(&self) -> Result<HyThreadConfig> {
        Ok(self.figment.extract().map_err(Box::new)?)
    }

    /// Build the collector without registering it.
    pub fn build(self) -> Result<HyThreadMetrics> {
        let config = self.config()?;
        let source = self
            .snapshot_source
            .unwrap_or_else(|| Arc::new(ProcfsSource::with_task_dir(config.task_dir.clone())));
        HyThreadMetrics::new(source, &config)
    }

    /// Build the collector and register it with `registry`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration extraction fails
    /// - Metric names or constant labels are invalid
    /// - The collector is already registered with `registry`
    pub fn register(self, registry: &Registry) -> Result<HyThreadMetrics> {
        let metrics = self.build()?;
        metrics.register(registry)?;
        Ok(metrics)
    }

    /// Build the collector and register it with the process-wide default registry.
    pub fn register_default(self) -> Result<HyThreadMetrics> {
        self.register(prometheus::default_registry())
    }
}
