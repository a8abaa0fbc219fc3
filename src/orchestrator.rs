//! Concurrent fan-out over all registered wave sources.
//!
//! For one offshore point every adapter is started at once and the
//! orchestrator waits for all of them to settle. Each call runs under a hard
//! deadline; an adapter that overruns it is abandoned, recorded as a failed
//! call and treated like any other transport failure. There are no retries.

use crate::accounting::{CallAccounting, NoopAccounting};
use crate::sources::{report, SourceError, WaveSource};
use crate::{GeoPoint, WaveMeasurement};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Accounting endpoint label for calls cut off by the deadline
pub const DEADLINE_ENDPOINT: &str = "deadline";

pub struct Orchestrator {
    sources: Vec<Arc<dyn WaveSource>>,
    deadline: Duration,
    accounting: Arc<dyn CallAccounting>,
}

impl Orchestrator {
    pub fn new(
        sources: Vec<Arc<dyn WaveSource>>,
        deadline: Duration,
        accounting: Arc<dyn CallAccounting>,
    ) -> Self {
        Self {
            sources,
            deadline,
            accounting,
        }
    }

    /// Orchestrator without deadline bookkeeping, mostly for tests.
    pub fn without_accounting(sources: Vec<Arc<dyn WaveSource>>, deadline: Duration) -> Self {
        Self::new(sources, deadline, Arc::new(NoopAccounting))
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Query every source for `point` and keep the successes.
    ///
    /// An empty result is not an error; it is the signal for fallback
    /// synthesis downstream.
    pub async fn sample(&self, point: GeoPoint, distance_nm: f64) -> Vec<WaveMeasurement> {
        let attempts = self.sources.iter().map(|source| self.attempt(source.as_ref(), point));
        let results = join_all(attempts).await;

        let measurements: Vec<WaveMeasurement> = results.into_iter().flatten().collect();

        if measurements.is_empty() {
            info!(
                distance_nm,
                sources = self.sources.len(),
                "No source answered for this distance"
            );
        } else {
            debug!(
                distance_nm,
                succeeded = measurements.len(),
                attempted = self.sources.len(),
                "Distance sampled"
            );
        }
        measurements
    }

    async fn attempt(&self, source: &dyn WaveSource, point: GeoPoint) -> Option<WaveMeasurement> {
        match tokio::time::timeout(self.deadline, source.fetch(point)).await {
            Ok(Ok(measurement)) => Some(measurement),
            // Adapters log and account their own failures
            Ok(Err(_)) => None,
            Err(_) => {
                let overrun = Err(SourceError::Transport(format!(
                    "no answer within {} ms",
                    self.deadline.as_millis()
                )));
                report(
                    self.accounting.as_ref(),
                    source.name(),
                    DEADLINE_ENDPOINT,
                    &overrun,
                );
                None
            }
        }
    }
}
