use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::CarrierId;

/// Externally visible breaker state for one carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// When a carrier is cut off and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failed calls that cut the carrier off.
    pub failure_threshold: u32,
    /// How long the carrier stays cut off before one trial call is let through.
    pub open_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            open_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Closed { failures: u32 },
    Open { failures: u32, since: Instant },
    /// One trial call is in flight since `started`.
    Trial { failures: u32, started: Instant },
}

impl Phase {
    const fn failures(self) -> u32 {
        match self {
            Self::Closed { failures } | Self::Open { failures, .. } | Self::Trial { failures, .. } => {
                failures
            }
        }
    }
}

/// Stops calling a carrier that keeps failing.
///
/// After `failure_threshold` consecutive failures the carrier is cut off for
/// `open_timeout`. Afterwards a single trial call is allowed; concurrent
/// callers keep being refused until it reports back. A trial that never
/// reports back (its future was dropped by a caller timeout) expires after
/// another `open_timeout`.
#[derive(Debug)]
pub struct CircuitBreaker {
    carrier: CarrierId,
    config: CircuitBreakerConfig,
    phase: Mutex<Phase>,
}

impl CircuitBreaker {
    pub fn new(carrier: CarrierId, config: CircuitBreakerConfig) -> Self {
        Self {
            carrier,
            config,
            phase: Mutex::new(Phase::Closed { failures: 0 }),
        }
    }

    /// Whether a call may go out now. Grants the trial call when due.
    pub fn allow_request(&self) -> bool {
        let mut phase = self.lock();
        let now = Instant::now();
        match *phase {
            Phase::Closed { .. } => true,
            Phase::Open { failures, since } | Phase::Trial { failures, started: since }
                if now.duration_since(since) >= self.config.open_timeout =>
            {
                info!(carrier = %self.carrier, "letting one trial call through to carrier");
                *phase = Phase::Trial {
                    failures,
                    started: now,
                };
                true
            }
            Phase::Open { .. } | Phase::Trial { .. } => false,
        }
    }

    pub fn record_success(&self) {
        let mut phase = self.lock();
        if !matches!(*phase, Phase::Closed { .. }) {
            info!(carrier = %self.carrier, "carrier recovered; circuit closed");
        }
        *phase = Phase::Closed { failures: 0 };
    }

    pub fn record_failure(&self) {
        let mut phase = self.lock();
        let failures = phase.failures().saturating_add(1);
        *phase = match *phase {
            Phase::Closed { .. } if failures < self.config.failure_threshold => {
                Phase::Closed { failures }
            }
            Phase::Open { since, .. } => Phase::Open { failures, since },
            Phase::Closed { .. } | Phase::Trial { .. } => {
                warn!(carrier = %self.carrier, failures, "carrier cut off after failed calls");
                Phase::Open {
                    failures,
                    since: Instant::now(),
                }
            }
        };
    }

    pub fn state(&self) -> CircuitState {
        match *self.lock() {
            Phase::Closed { .. } => CircuitState::Closed,
            Phase::Open { .. } => CircuitState::Open,
            Phase::Trial { .. } => CircuitState::HalfOpen,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().failures()
    }

    /// Time left until the trial call is allowed, while cut off.
    pub fn retry_after(&self) -> Option<Duration> {
        match *self.lock() {
            Phase::Open { since, .. } => Some(self.config.open_timeout.saturating_sub(since.elapsed())),
            Phase::Closed { .. } | Phase::Trial { .. } => None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
