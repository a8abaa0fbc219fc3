//! Per-provider call accounting.
//!
//! Adapters reserve a slot here before calling a provider and report the
//! outcome afterwards. The ledger is an explicit dependency handed to each
//! adapter at construction; its counters start empty with the process and
//! roll over at UTC midnight.
//!
//! Quotas are charged when a slot is reserved, not when the outcome is
//! recorded, so concurrent callers can never overshoot a provider's limit.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Call bookkeeping shared by all adapters.
///
/// Implementations must tolerate concurrent use and must never fail:
/// accounting problems are not allowed to affect a measurement.
pub trait CallAccounting: Send + Sync {
    /// Reserve one call against the provider's daily quota.
    ///
    /// Returns `false`, reserving nothing, when the quota is spent. A `true`
    /// result counts toward the quota whatever the call's outcome.
    fn try_acquire(&self, provider: &str) -> bool;

    /// Record the outcome of one call.
    fn record(&self, provider: &str, endpoint: &str, success: bool);
}

/// Accounting that tracks nothing and allows everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAccounting;

impl CallAccounting for NoopAccounting {
    fn try_acquire(&self, _provider: &str) -> bool {
        true
    }

    fn record(&self, _provider: &str, _endpoint: &str, _success: bool) {}
}

#[derive(Debug, Default, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CallCounts {
    pub success: u64,
    pub failure: u64,
}

impl CallCounts {
    pub fn total(&self) -> u64 {
        self.success + self.failure
    }
}

/// Usage report for one provider.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderUsage {
    pub calls: CallCounts,
    pub daily_quota: Option<u32>,
    /// Quota slots reserved today, including calls still in flight
    pub reserved: u64,
    /// Per-endpoint breakdown
    pub endpoints: BTreeMap<String, CallCounts>,
}

/// Point-in-time copy of the ledger.
#[derive(Debug, Clone, Serialize)]
pub struct UsageSnapshot {
    pub day: NaiveDate,
    pub providers: BTreeMap<String, ProviderUsage>,
}

struct LedgerState {
    day: NaiveDate,
    counts: HashMap<(String, String), CallCounts>,
    /// Slots reserved today per quota-limited provider
    acquired: HashMap<String, u64>,
}

/// Thread-safe call ledger with optional per-provider daily quotas.
///
/// # Example
///
/// ```
/// use wave_front_lib::accounting::{CallAccounting, CallLedger};
///
/// let ledger = CallLedger::new().with_quota("stormglass", 1);
/// assert!(ledger.try_acquire("stormglass"));
/// assert!(!ledger.try_acquire("stormglass"));
/// assert!(ledger.try_acquire("open-meteo"));
/// ```
pub struct CallLedger {
    quotas: HashMap<String, u32>,
    state: Mutex<LedgerState>,
    clock: fn() -> DateTime<Utc>,
}

impl Default for CallLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl CallLedger {
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    /// Ledger driven by a custom clock, used to exercise the daily rollover.
    pub fn with_clock(clock: fn() -> DateTime<Utc>) -> Self {
        Self {
            quotas: HashMap::new(),
            state: Mutex::new(LedgerState {
                day: clock().date_naive(),
                counts: HashMap::new(),
                acquired: HashMap::new(),
            }),
            clock,
        }
    }

    /// Limit `provider` to `limit` calls per UTC day.
    pub fn with_quota(mut self, provider: &str, limit: u32) -> Self {
        self.quotas.insert(provider.to_string(), limit);
        self
    }

    /// Counters for the current day.
    pub fn snapshot(&self) -> UsageSnapshot {
        let state = self.current_state();
        let mut providers: BTreeMap<String, ProviderUsage> = BTreeMap::new();

        for ((provider, endpoint), counts) in &state.counts {
            let usage = providers
                .entry(provider.clone())
                .or_insert_with(|| ProviderUsage {
                    calls: CallCounts::default(),
                    daily_quota: self.quotas.get(provider).copied(),
                    reserved: 0,
                    endpoints: BTreeMap::new(),
                });
            usage.calls.success += counts.success;
            usage.calls.failure += counts.failure;
            usage.endpoints.insert(endpoint.clone(), *counts);
        }

        // Quota-limited providers show up even before their first call
        for (provider, quota) in &self.quotas {
            let usage = providers
                .entry(provider.clone())
                .or_insert_with(|| ProviderUsage {
                    calls: CallCounts::default(),
                    daily_quota: Some(*quota),
                    reserved: 0,
                    endpoints: BTreeMap::new(),
                });
            usage.reserved = state.acquired.get(provider).copied().unwrap_or(0);
        }

        UsageSnapshot {
            day: state.day,
            providers,
        }
    }

    /// Lock the state, recovering from poisoning and rolling the day over.
    fn current_state(&self) -> MutexGuard<'_, LedgerState> {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Call ledger lock was poisoned, continuing with recovered state");
            poisoned.into_inner()
        });

        let today = (self.clock)().date_naive();
        if state.day != today {
            debug!(previous = %state.day, current = %today, "Resetting daily call counters");
            state.day = today;
            state.counts.clear();
            state.acquired.clear();
        }
        state
    }
}

impl CallAccounting for CallLedger {
    fn try_acquire(&self, provider: &str) -> bool {
        let Some(limit) = self.quotas.get(provider) else {
            return true;
        };
        let mut state = self.current_state();
        let used = state.acquired.entry(provider.to_string()).or_default();
        if *used >= u64::from(*limit) {
            return false;
        }
        *used += 1;
        true
    }

    fn record(&self, provider: &str, endpoint: &str, success: bool) {
        let mut state = self.current_state();
        let counts = state
            .counts
            .entry((provider.to_string(), endpoint.to_string()))
            .or_default();
        if success {
            counts.success += 1;
        } else {
            counts.failure += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_records_success_and_failure_per_endpoint() {
        let ledger = CallLedger::new();
        ledger.record("copernicus", "waves", true);
        ledger.record("copernicus", "waves", false);
        ledger.record("copernicus", "deadline", false);

        let snapshot = ledger.snapshot();
        let usage = &snapshot.providers["copernicus"];
        assert_eq!(usage.calls, CallCounts { success: 1, failure: 2 });
        assert_eq!(usage.endpoints["waves"].total(), 2);
        assert_eq!(usage.endpoints["deadline"].failure, 1);
        assert_eq!(usage.daily_quota, None);
    }

    #[test]
    fn test_quota_is_charged_on_acquire() {
        let ledger = CallLedger::new().with_quota("stormglass", 2);
        assert!(ledger.try_acquire("stormglass"));
        assert!(ledger.try_acquire("stormglass"));
        // Both calls still in flight, nothing recorded yet
        assert!(!ledger.try_acquire("stormglass"));

        ledger.record("stormglass", "point", false);
        assert!(!ledger.try_acquire("stormglass"));

        let snapshot = ledger.snapshot();
        let usage = &snapshot.providers["stormglass"];
        assert_eq!(usage.daily_quota, Some(2));
        assert_eq!(usage.reserved, 2);
        assert_eq!(usage.calls.failure, 1);
    }

    #[test]
    fn test_unlimited_provider_is_never_refused() {
        let ledger = CallLedger::new().with_quota("stormglass", 0);
        assert!(!ledger.try_acquire("stormglass"));
        for _ in 0..100 {
            assert!(ledger.try_acquire("open-meteo"));
        }
        assert!(!ledger.snapshot().providers.contains_key("open-meteo"));
    }

    #[test]
    fn test_concurrent_acquire_never_exceeds_quota() {
        let ledger = Arc::new(CallLedger::new().with_quota("stormglass", 10));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    (0..50).filter(|_| ledger.try_acquire("stormglass")).count()
                })
            })
            .collect();
        let granted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(granted, 10);
        assert_eq!(ledger.snapshot().providers["stormglass"].reserved, 10);
    }

    #[test]
    fn test_unused_quota_provider_is_listed() {
        let ledger = CallLedger::new().with_quota("stormglass", 10);
        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.providers["stormglass"].calls.total(), 0);
    }

    static AFTER_MIDNIGHT: AtomicBool = AtomicBool::new(false);

    fn switchable_clock() -> DateTime<Utc> {
        if AFTER_MIDNIGHT.load(Ordering::SeqCst) {
            Utc.with_ymd_and_hms(2025, 7, 2, 0, 5, 0).unwrap()
        } else {
            Utc.with_ymd_and_hms(2025, 7, 1, 23, 55, 0).unwrap()
        }
    }

    #[test]
    fn test_counters_reset_at_utc_midnight() {
        let ledger = CallLedger::with_clock(switchable_clock).with_quota("stormglass", 1);
        assert!(ledger.try_acquire("stormglass"));
        ledger.record("stormglass", "point", true);
        assert!(!ledger.try_acquire("stormglass"));

        AFTER_MIDNIGHT.store(true, Ordering::SeqCst);
        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.day, NaiveDate::from_ymd_opt(2025, 7, 2).unwrap());
        assert_eq!(snapshot.providers["stormglass"].calls.total(), 0);
        assert_eq!(snapshot.providers["stormglass"].reserved, 0);
        assert!(ledger.try_acquire("stormglass"));
    }

    #[test]
    fn test_concurrent_records_are_all_counted() {
        let ledger = Arc::new(CallLedger::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        ledger.record("open-meteo", "marine", i % 2 == 0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let usage = &ledger.snapshot().providers["open-meteo"];
        assert_eq!(usage.calls.success, 400);
        assert_eq!(usage.calls.failure, 400);
    }

    #[test]
    fn test_noop_accounting_allows_everything() {
        let noop = NoopAccounting;
        noop.record("anything", "x", false);
        assert!(noop.try_acquire("anything"));
    }
}
