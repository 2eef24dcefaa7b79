//! Exchange rate state and the refresh cycle that keeps it current.

use crate::core::currency::{Currency, RateSnapshot, RateSource};
use crate::core::error::EstimatorError;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30 * 60);
pub const FALLBACK_UAH_RATE: f64 = 37.0;
pub const FALLBACK_EUR_RATE: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatePhase {
    /// Rates came from a live source.
    Fresh,
    /// A refresh cycle is walking the sources.
    Fetching,
    /// Hard-coded constants are in effect.
    Fallback,
}

/// Hard-coded USD-based rates used before the first fetch and after a failed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallbackRates {
    pub uah: f64,
    pub eur: f64,
}

impl Default for FallbackRates {
    fn default() -> Self {
        Self {
            uah: FALLBACK_UAH_RATE,
            eur: FALLBACK_EUR_RATE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRateState {
    pub uah: f64,
    pub eur: f64,
    pub last_updated: Option<DateTime<Utc>>,
    pub is_fallback: bool,
    pub phase: RatePhase,
}

impl ExchangeRateState {
    pub fn fallback(rates: FallbackRates) -> Self {
        Self {
            uah: rates.uah,
            eur: rates.eur,
            last_updated: None,
            is_fallback: true,
            phase: RatePhase::Fallback,
        }
    }

    /// USD→`currency` rate. USD is always the identity.
    pub fn rate(&self, currency: Currency) -> f64 {
        match currency {
            Currency::Usd => 1.0,
            Currency::Uah => self.uah,
            Currency::Eur => self.eur,
        }
    }
}

pub type SharedRates = Arc<RwLock<ExchangeRateState>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshPolicy {
    pub interval: Duration,
    /// Delay before retrying after every source failed. `None` leaves the
    /// next attempt to a manual refresh or an already armed timer.
    pub retry_after_failure: Option<Duration>,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_REFRESH_INTERVAL,
            retry_after_failure: None,
        }
    }
}

#[derive(Debug)]
pub enum RefreshOutcome {
    /// A source answered. `partial` is set when it carried only one of the rates.
    Fresh { source: String, partial: bool },
    /// Every source failed and fallback constants were restored.
    Fallback { failures: Vec<EstimatorError> },
    /// Another cycle was already in flight.
    Skipped,
}

impl RefreshOutcome {
    pub fn is_fresh(&self) -> bool {
        matches!(self, RefreshOutcome::Fresh { .. })
    }
}

/// Owns the shared rate state and the single refresh timer.
pub struct ExchangeRateManager {
    sources: Vec<Arc<dyn RateSource>>,
    fallback: FallbackRates,
    policy: RefreshPolicy,
    state: SharedRates,
    timer: Mutex<Option<JoinHandle<()>>>,
    in_flight: AtomicBool,
}

// Clears the in-flight flag even if the cycle future is dropped mid-request.
struct CycleGuard<'a> {
    manager: &'a ExchangeRateManager,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.manager.state.write();
        if state.phase == RatePhase::Fetching {
            state.phase = if state.is_fallback {
                RatePhase::Fallback
            } else {
                RatePhase::Fresh
            };
        }
        self.manager.in_flight.store(false, Ordering::Release);
    }
}

impl ExchangeRateManager {
    pub fn new(
        sources: Vec<Arc<dyn RateSource>>,
        fallback: FallbackRates,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            sources,
            fallback,
            policy,
            state: Arc::new(RwLock::new(ExchangeRateState::fallback(fallback))),
            timer: Mutex::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Snapshot of the current rates.
    pub fn state(&self) -> ExchangeRateState {
        self.state.read().clone()
    }

    /// Read handle for components that render with the live rates.
    pub fn shared(&self) -> SharedRates {
        Arc::clone(&self.state)
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    pub fn is_scheduled(&self) -> bool {
        self.timer
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn cancel_schedule(&self) {
        if let Some(handle) = self.timer.lock().take() {
            handle.abort();
        }
    }

    /// Runs one refresh cycle and re-arms the timer on success.
    ///
    /// Never fails: callers observe the outcome and the updated state.
    pub async fn refresh(self: &Arc<Self>) -> RefreshOutcome {
        let outcome = self.run_cycle().await;
        match &outcome {
            RefreshOutcome::Fresh { .. } => self.arm(self.policy.interval),
            RefreshOutcome::Fallback { .. } => {
                if let Some(delay) = self.policy.retry_after_failure {
                    self.arm(delay);
                }
            }
            RefreshOutcome::Skipped => {}
        }
        outcome
    }

    /// Walks the sources in order until one yields a usable rate.
    async fn run_cycle(&self) -> RefreshOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Refresh already in flight, skipping");
            return RefreshOutcome::Skipped;
        }
        let _guard = CycleGuard { manager: self };
        self.state.write().phase = RatePhase::Fetching;

        let mut failures = Vec::new();
        for source in &self.sources {
            debug!(source = source.name(), "Requesting exchange rates");
            let reason = match source.fetch_rates().await {
                Ok(snapshot) => {
                    let usable = RateSnapshot {
                        uah: snapshot.uah.filter(|r| r.is_finite() && *r > 0.0),
                        eur: snapshot.eur.filter(|r| r.is_finite() && *r > 0.0),
                    };
                    if !usable.is_empty() {
                        let partial = usable.uah.is_none() || usable.eur.is_none();
                        self.apply(usable);
                        info!(
                            source = source.name(),
                            uah = ?usable.uah,
                            eur = ?usable.eur,
                            partial,
                            "Exchange rates updated"
                        );
                        return RefreshOutcome::Fresh {
                            source: source.name().to_string(),
                            partial,
                        };
                    }
                    "response carried no usable rate".to_string()
                }
                Err(e) => format!("{e:#}"),
            };
            warn!(source = source.name(), error = %reason, "Rate source failed");
            failures.push(EstimatorError::NetworkFailure {
                endpoint: source.name().to_string(),
                reason,
            });
        }

        self.restore_fallback();
        warn!(
            error = %EstimatorError::AllSourcesExhausted(self.sources.len()),
            uah = self.fallback.uah,
            eur = self.fallback.eur,
            "Falling back to constant rates"
        );
        RefreshOutcome::Fallback { failures }
    }

    fn apply(&self, snapshot: RateSnapshot) {
        let mut state = self.state.write();
        if let Some(uah) = snapshot.uah {
            state.uah = uah;
        }
        if let Some(eur) = snapshot.eur {
            state.eur = eur;
        }
        state.last_updated = Some(Utc::now());
        state.is_fallback = false;
        state.phase = RatePhase::Fresh;
    }

    fn restore_fallback(&self) {
        let mut state = self.state.write();
        state.uah = self.fallback.uah;
        state.eur = self.fallback.eur;
        state.is_fallback = true;
        state.phase = RatePhase::Fallback;
    }

    /// Replaces the timer with one that fires after `delay`. The previous
    /// handle is aborted first so at most one timer is ever live.
    fn arm(self: &Arc<Self>, delay: Duration) {
        let manager = Arc::downgrade(self);
        let policy = self.policy;

        let handle = tokio::spawn(async move {
            let mut delay = delay;
            loop {
                tokio::time::sleep(delay).await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                debug!("Scheduled exchange rate refresh");
                delay = match manager.run_cycle().await {
                    RefreshOutcome::Fresh { .. } | RefreshOutcome::Skipped => policy.interval,
                    RefreshOutcome::Fallback { .. } => match policy.retry_after_failure {
                        Some(retry) => retry,
                        None => break,
                    },
                };
            }
        });

        if let Some(previous) = self.timer.lock().replace(handle) {
            previous.abort();
        }
        debug!(delay_secs = delay.as_secs(), "Armed exchange rate refresh timer");
    }
}

impl Drop for ExchangeRateManager {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.get_mut().take() {
            handle.abort();
        }
    }
}
