//! Metric emission for thread-state tallies.
//!
//! A [`Tally`](crate::Tally) knows nothing about any metrics library. It reports
//! its contents through an [`ObservationSink`], and the Prometheus adapter in
//! this module is one such sink.
//!
//! # Exposed Metric
//!
//! - `hy_thread_state{prefix, state}` - number of live threads per name prefix
//!   and execution state, recomputed on every scrape
//!
//! # Example
//!
//! ```no_run
//! use prometheus::{Encoder, Registry, TextEncoder};
//! use hy_thread_metrics::HyThreadMetrics;
//!
//! let registry = Registry::new();
//! HyThreadMetrics::builder().register(&registry)?;
//!
//! // Later: expose via HTTP endpoint
//! let encoder = TextEncoder::new();
//! let mut buffer = Vec::new();
//! encoder.encode(&registry.gather(), &mut buffer)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod prometheus;

pub use self::prometheus::{HyThreadMetrics, HELP, HY_THREAD_STATE, LABEL_NAMES};

/// Receiver of `(value, prefix, state)` observations for one scrape.
pub trait ObservationSink {
    fn report(&mut self, value: f64, prefix: &str, state: &str);
}

impl<F> ObservationSink for F
where
    F: FnMut(f64, &str, &str),
{
    fn report(&mut self, value: f64, prefix: &str, state: &str) {
        self(value, prefix, state)
    }
}
