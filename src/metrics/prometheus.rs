//! Prometheus collector for `hy_thread_state`.
//!
//! Unlike always-on counters, this metric has no stored value. The collector
//! takes a snapshot each time the registry is gathered, builds a throwaway
//! gauge vector from it and hands back that vector's samples. Label pairs
//! that disappear between scrapes therefore disappear from the output too.
//!
//! # Usage
//!
//! ```ignore
//! // Register against an explicit registry
//! let registry = prometheus::Registry::new();
//! let metrics = HyThreadMetrics::builder().register(&registry)?;
//!
//! // Or sample directly, without a registry
//! let tally = metrics.sample()?;
//! ```

use std::sync::Arc;

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{IntGaugeVec, Opts, Registry};
use tracing::{debug, warn};

use super::ObservationSink;
use crate::aggregate::{self, Tally};
use crate::builder::HyThreadMetricsBuilder;
use crate::config::HyThreadConfig;
use crate::error::Result;
use crate::snapshot::ThreadSnapshotSource;

/// Metric name.
pub const HY_THREAD_STATE: &str = "hy_thread_state";

/// Metric help text.
pub const HELP: &str = "thread state by prefix group";

/// Label names, in reporting order.
pub const LABEL_NAMES: [&str; 2] = ["prefix", "state"];

/// Thread-state collector.
///
/// Cloning is cheap; clones share the same snapshot source.
#[derive(Clone)]
pub struct HyThreadMetrics {
    source: Arc<dyn ThreadSnapshotSource>,
    opts: Opts,
    descs: Vec<Desc>,
}

impl HyThreadMetrics {
    /// Start building a collector with default configuration.
    pub fn builder() -> HyThreadMetricsBuilder {
        HyThreadMetricsBuilder::new()
    }

    /// Start building a collector from an explicit configuration.
    pub fn builder_with_config(config: HyThreadConfig) -> HyThreadMetricsBuilder {
        HyThreadMetricsBuilder::with_config(config)
    }

    /// Create a collector over `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured names or labels are not valid
    /// Prometheus identifiers.
    pub fn new(source: Arc<dyn ThreadSnapshotSource>, config: &HyThreadConfig) -> Result<Self> {
        let opts = config.opts();
        let descs = IntGaugeVec::new(opts.clone(), &LABEL_NAMES)?
            .desc()
            .into_iter()
            .cloned()
            .collect();
        Ok(Self {
            source,
            opts,
            descs,
        })
    }

    /// Register with a Registry for exposition.
    ///
    /// # Errors
    ///
    /// Returns an error if a collector with the same descriptor is already registered.
    pub fn register(&self, registry: &Registry) -> Result<()> {
        registry.register(Box::new(self.clone()))?;
        debug!(metric = %self.opts.fq_name(), "registered thread state collector");
        Ok(())
    }

    /// Take a fresh snapshot and tally it.
    pub fn sample(&self) -> Result<Tally> {
        aggregate::sample(self.source.as_ref())
    }

    fn gauges_for(&self, tally: &Tally) -> prometheus::Result<IntGaugeVec> {
        let gauges = IntGaugeVec::new(self.opts.clone(), &LABEL_NAMES)?;
        tally.emit(&mut GaugeSink(&gauges));
        Ok(gauges)
    }
}

impl Collector for HyThreadMetrics {
    fn desc(&self) -> Vec<&Desc> {
        self.descs.iter().collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        // collect() cannot fail, so a failed snapshot drops this one sample
        let tally = match self.sample() {
            Ok(tally) => tally,
            Err(e) => {
                warn!(error = %e, "failed to sample thread states");
                return Vec::new();
            }
        };

        match self.gauges_for(&tally) {
            Ok(gauges) => {
                debug!(
                    groups = tally.groups().count(),
                    threads = tally.total(),
                    "sampled thread states"
                );
                gauges.collect()
            }
            Err(e) => {
                warn!(error = %e, "failed to build thread state gauges");
                Vec::new()
            }
        }
    }
}

impl std::fmt::Debug for HyThreadMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyThreadMetrics")
            .field("name", &self.opts.fq_name())
            .field("const_labels", &self.opts.const_labels)
            .finish_non_exhaustive()
    }
}

struct GaugeSink<'a>(&'a IntGaugeVec);

impl ObservationSink for GaugeSink<'_> {
    fn report(&mut self, value: f64, prefix: &str, state: &str) {
        self.0
            .with_label_values(&[prefix, state])
            .set(value as i64);
    }
}
