//! Circuit breaker for downstream protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: downstream assumed down, calls fail fast
//! - Half-Open: one trial call tests whether downstream recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failures in the last `sliding_window_size` calls exceed
//!                `failure_threshold` (once `minimum_number_of_calls` are recorded)
//! Open → Half-Open: after `wait_duration_in_open_state`, on the next call
//! Half-Open → Closed: trial call succeeds
//! Half-Open → Open: trial call fails
//! ```
//!
//! State is process-local and never shared between instances.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::Mutex;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info};

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "CLOSED"),
            CircuitState::Open => write!(f, "OPEN"),
            CircuitState::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

/// Outcome of a call routed through the breaker.
#[derive(Debug, Error)]
pub enum CallError<E> {
    /// Rejected without calling downstream.
    #[error("Circuit breaker {name} is {state}, call rejected")]
    Rejected { name: String, state: CircuitState },

    /// Downstream was called and failed.
    #[error(transparent)]
    Failed(E),
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    /// Most recent outcomes in Closed state, `true` = failure.
    window: VecDeque<bool>,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Permit {
    Normal,
    Trial,
}

/// Releases the half-open trial slot if the guarded future is dropped before settling.
struct TrialSlot<'a> {
    breaker: &'a CircuitBreaker,
    permit: Permit,
    settled: bool,
}

impl Drop for TrialSlot<'_> {
    fn drop(&mut self) {
        if !self.settled && self.permit == Permit::Trial {
            self.breaker.lock().trial_in_flight = false;
        }
    }
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            name: config.name.clone(),
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                window: VecDeque::with_capacity(config.sliding_window_size),
                opened_at: None,
                trial_in_flight: false,
            }),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state. An expired Open state is reported as Open until the next call.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Failures currently counted in the sliding window.
    pub fn failures_in_window(&self) -> usize {
        self.lock().window.iter().filter(|failed| **failed).count()
    }

    /// Run `operation` if the breaker permits it and record its result.
    pub async fn call<F, T, E>(&self, operation: F) -> Result<T, CallError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        let permit = self.try_acquire().map_err(|state| CallError::Rejected {
            name: self.name.clone(),
            state,
        })?;
        let mut slot = TrialSlot {
            breaker: self,
            permit,
            settled: false,
        };

        let result = operation.await;
        slot.settled = true;
        match result {
            Ok(value) => {
                self.on_success(permit);
                Ok(value)
            }
            Err(e) => {
                self.on_failure(permit);
                Err(CallError::Failed(e))
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn try_acquire(&self) -> Result<Permit, CircuitState> {
        let mut inner = self.lock();
        if inner.state == CircuitState::Open {
            let cooled_down = inner
                .opened_at
                .map(|at| at.elapsed() >= self.config.wait_duration_in_open_state())
                .unwrap_or(true);
            if !cooled_down {
                return Err(CircuitState::Open);
            }
            self.transition(&mut inner, CircuitState::HalfOpen);
        }

        match inner.state {
            CircuitState::Closed => Ok(Permit::Normal),
            CircuitState::HalfOpen if !inner.trial_in_flight => {
                inner.trial_in_flight = true;
                Ok(Permit::Trial)
            }
            state => Err(state),
        }
    }

    fn on_success(&self, permit: Permit) {
        let mut inner = self.lock();
        match (permit, inner.state) {
            (Permit::Trial, CircuitState::HalfOpen) => {
                inner.trial_in_flight = false;
                inner.window.clear();
                self.transition(&mut inner, CircuitState::Closed);
            }
            (Permit::Normal, CircuitState::Closed) => self.record(&mut inner, false),
            _ => {}
        }
    }

    fn on_failure(&self, permit: Permit) {
        let mut inner = self.lock();
        match (permit, inner.state) {
            (Permit::Trial, CircuitState::HalfOpen) => {
                inner.trial_in_flight = false;
                self.transition(&mut inner, CircuitState::Open);
            }
            (Permit::Normal, CircuitState::Closed) => {
                self.record(&mut inner, true);
                let failures = inner.window.iter().filter(|failed| **failed).count();
                if inner.window.len() >= self.config.minimum_number_of_calls
                    && failures > self.config.failure_threshold
                {
                    error!(circuit = %self.name, failures, "Failure threshold exceeded");
                    self.transition(&mut inner, CircuitState::Open);
                }
            }
            _ => {}
        }
    }

    fn record(&self, inner: &mut BreakerInner, failed: bool) {
        inner.window.push_back(failed);
        while inner.window.len() > self.config.sliding_window_size {
            inner.window.pop_front();
        }
    }

    fn transition(&self, inner: &mut BreakerInner, to: CircuitState) {
        let from = inner.state;
        inner.state = to;
        match to {
            CircuitState::Open => {
                inner.opened_at = Some(Instant::now());
                inner.window.clear();
            }
            CircuitState::Closed | CircuitState::HalfOpen => inner.opened_at = None,
        }
        info!(circuit = %self.name, %from, %to, "Circuit state changed");
        metrics::record_circuit_state(&self.name, to);
    }
}
