//! Metrics counters and tracing setup

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::notifier::FanoutReport;

/// Install the global subscriber; `RUST_LOG` wins over `[logging] filter`.
///
/// Logs go to stderr so `--json` reports on stdout stay parseable.
pub fn init_tracing(logging: &LoggingConfig, debug: bool) {
    let fallback = if debug {
        "notifybox=debug,info"
    } else {
        logging.filter.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    batches: AtomicU64,
    targets_delivered: AtomicU64,
    targets_failed: AtomicU64,
    sends_attempted: AtomicU64,
    sends_failed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch_started(&self) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "batches", "Metric incremented");
    }

    pub fn target_delivered(&self) {
        self.targets_delivered.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "targets_delivered", "Metric incremented");
    }

    pub fn target_failed(&self) {
        self.targets_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "targets_failed", "Metric incremented");
    }

    pub fn sends(&self, report: &FanoutReport) {
        self.sends_attempted
            .fetch_add(report.attempted as u64, Ordering::Relaxed);
        self.sends_failed
            .fetch_add(report.failures.len() as u64, Ordering::Relaxed);
        tracing::debug!(
            counter = "sends",
            attempted = report.attempted,
            failed = report.failures.len(),
            "Metric incremented"
        );
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches: self.batches.load(Ordering::Relaxed),
            targets_delivered: self.targets_delivered.load(Ordering::Relaxed),
            targets_failed: self.targets_failed.load(Ordering::Relaxed),
            sends_attempted: self.sends_attempted.load(Ordering::Relaxed),
            sends_failed: self.sends_failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batches: u64,
    pub targets_delivered: u64,
    pub targets_failed: u64,
    pub sends_attempted: u64,
    pub sends_failed: u64,
}
