//! Circuit Breaker for Provider Calls
//!
//! Stops calling a provider after repeated failures so that each new error
//! entry falls back to the regex extractor immediately instead of waiting
//! out another timeout.
//!
//! ## Transitions
//!
//! ```text
//! Closed --[failure_threshold consecutive failures]--> Open
//! Open --[recovery window elapsed]--> HalfOpen (one probe call)
//! HalfOpen --[probe succeeds]--> Closed
//! HalfOpen --[probe fails]--> Open
//! ```
//!
//! Failures whose category does not count against the provider (a response
//! that could not be parsed, a rejected request) leave the failure count alone.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::config::BreakerConfig;
use crate::constants::circuit_breaker as cb_constants;
use crate::types::{ErrorCategory, LlmError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "CLOSED"),
            Self::Open => write!(f, "OPEN"),
            Self::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

/// All mutable state lives behind one lock so counts and state change together
#[derive(Debug)]
struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    probe_successes: u32,
    probe_in_flight: bool,
    opened_at: Option<Instant>,
    blocked: u64,
    trips: u64,
}

impl Inner {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            probe_successes: 0,
            probe_in_flight: false,
            opened_at: None,
            blocked: 0,
            trips: 0,
        }
    }

    fn open(&mut self) {
        self.state = CircuitState::Open;
        self.opened_at = Some(Instant::now());
        self.probe_in_flight = false;
        self.probe_successes = 0;
        self.trips += 1;
    }
}

pub struct CircuitBreaker {
    provider_name: String,
    failure_threshold: u32,
    success_threshold: u32,
    recovery: Duration,
    inner: RwLock<Inner>,
}

impl CircuitBreaker {
    pub fn new(provider_name: impl Into<String>, config: &BreakerConfig) -> Self {
        Self {
            provider_name: provider_name.into(),
            failure_threshold: config.failure_threshold.max(1),
            success_threshold: cb_constants::SUCCESS_THRESHOLD,
            recovery: Duration::from_secs(config.recovery_secs),
            inner: RwLock::new(Inner::new()),
        }
    }

    /// Current state, moving Open to HalfOpen once the recovery window passed
    pub fn state(&self) -> CircuitState {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.refresh(&mut inner);
        inner.state
    }

    /// Ask permission for one call.
    ///
    /// A refusal is an `Unavailable` error; the caller must not send the request.
    pub fn acquire(&self) -> Result<(), LlmError> {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.refresh(&mut inner);

        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::HalfOpen if !inner.probe_in_flight => {
                inner.probe_in_flight = true;
                tracing::debug!(provider = %self.provider_name, "Circuit half-open, sending probe");
                Ok(())
            }
            _ => {
                inner.blocked += 1;
                let remaining = inner
                    .opened_at
                    .map(|t| self.recovery.saturating_sub(t.elapsed()))
                    .unwrap_or_default();
                Err(LlmError::with_provider(
                    ErrorCategory::Unavailable,
                    format!("circuit open, retry in {}s", remaining.as_secs()),
                    self.provider_name.clone(),
                ))
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        inner.consecutive_failures = 0;
        if inner.state == CircuitState::HalfOpen {
            inner.probe_in_flight = false;
            inner.probe_successes += 1;
            if inner.probe_successes >= self.success_threshold {
                inner.state = CircuitState::Closed;
                inner.probe_successes = 0;
                inner.opened_at = None;
                tracing::info!(provider = %self.provider_name, "Circuit closed, provider recovered");
            }
        }
    }

    pub fn record_failure(&self, category: ErrorCategory) {
        if !category.counts_against_provider() {
            // The provider answered; only the exchange was bad.
            self.record_success();
            return;
        }

        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.failure_threshold {
                    inner.open();
                    tracing::warn!(
                        provider = %self.provider_name,
                        failures = inner.consecutive_failures,
                        recovery_secs = self.recovery.as_secs(),
                        "Circuit opened, LLM calls suspended"
                    );
                }
            }
            CircuitState::HalfOpen => {
                inner.open();
                tracing::warn!(provider = %self.provider_name, "Probe failed, circuit re-opened");
            }
            CircuitState::Open => {}
        }
    }

    pub fn stats(&self) -> CircuitBreakerStats {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        CircuitBreakerStats {
            provider_name: self.provider_name.clone(),
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            blocked: inner.blocked,
            trips: inner.trips,
        }
    }

    fn refresh(&self, inner: &mut Inner) {
        if inner.state == CircuitState::Open
            && inner
                .opened_at
                .is_some_and(|opened| opened.elapsed() >= self.recovery)
        {
            inner.state = CircuitState::HalfOpen;
            inner.probe_in_flight = false;
            inner.probe_successes = 0;
            tracing::info!(provider = %self.provider_name, "Circuit half-open, testing recovery");
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerStats {
    pub provider_name: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    /// Calls refused while open
    pub blocked: u64,
    /// Times the circuit opened
    pub trips: u64,
}

impl CircuitBreakerStats {
    pub fn summary(&self) -> String {
        format!(
            "[{}] {} | failures={} blocked={} trips={}",
            self.provider_name, self.state, self.consecutive_failures, self.blocked, self.trips
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(threshold: u32, recovery_ms: u64) -> CircuitBreaker {
        let mut cb = CircuitBreaker::new(
            "test",
            &BreakerConfig {
                failure_threshold: threshold,
                recovery_secs: 0,
            },
        );
        cb.recovery = Duration::from_millis(recovery_ms);
        cb
    }

    #[test]
    fn test_initial_state_is_closed() {
        let cb = breaker(3, 1000);
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.acquire().is_ok());
    }

    #[test]
    fn test_opens_after_threshold_failures() {
        let cb = breaker(3, 60_000);

        cb.record_failure(ErrorCategory::Network);
        cb.record_failure(ErrorCategory::Timeout);
        assert_eq!(cb.state(), CircuitState::Closed);

        cb.record_failure(ErrorCategory::Transient);
        assert_eq!(cb.state(), CircuitState::Open);

        let err = cb.acquire().unwrap_err();
        assert_eq!(err.category, ErrorCategory::Unavailable);
        assert_eq!(cb.stats().blocked, 1);
        assert_eq!(cb.stats().trips, 1);
    }

    #[test]
    fn test_parse_errors_do_not_trip() {
        let cb = breaker(2, 60_000);
        cb.record_failure(ErrorCategory::ParseError);
        cb.record_failure(ErrorCategory::ParseError);
        cb.record_failure(ErrorCategory::BadRequest);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_success_resets_failure_count() {
        let cb = breaker(3, 60_000);
        cb.record_failure(ErrorCategory::Network);
        cb.record_failure(ErrorCategory::Network);
        cb.record_success();
        cb.record_failure(ErrorCategory::Network);
        cb.record_failure(ErrorCategory::Network);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_allows_single_probe() {
        let cb = breaker(1, 1);
        cb.record_failure(ErrorCategory::Network);
        std::thread::sleep(Duration::from_millis(10));

        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert!(cb.acquire().is_ok());
        assert!(cb.acquire().is_err());

        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.acquire().is_ok());
    }

    #[test]
    fn test_failed_probe_reopens() {
        let cb = breaker(1, 1);
        cb.record_failure(ErrorCategory::Auth);
        std::thread::sleep(Duration::from_millis(10));

        assert!(cb.acquire().is_ok());
        cb.record_failure(ErrorCategory::Auth);

        let stats = cb.stats();
        assert_eq!(stats.state, CircuitState::Open);
        assert_eq!(stats.trips, 2);
        assert!(stats.summary().contains("OPEN"));
    }
}
