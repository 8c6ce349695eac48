//! Circuit breaker guarding the remote prediction service.
//!
//! After repeated failures the oracle stops calling the service for a
//! cooldown period and answers from the fallback table directly. Time is
//! passed in by the caller so the breaker follows the injected clock.

use chrono::{DateTime, Duration, Utc};

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Remote calls proceed normally.
    Closed,
    /// Remote calls are skipped.
    Open,
    /// Cooldown elapsed; remote calls are probing for recovery.
    HalfOpen,
}

/// Breaker thresholds.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// How long the circuit stays open.
    pub cooldown: Duration,
    /// Consecutive half-open successes that close the circuit.
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::minutes(5),
            success_threshold: 2,
        }
    }
}

/// Consecutive-failure circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: CircuitState,
    consecutive_failures: u32,
    consecutive_successes: u32,
    opened_at: Option<DateTime<Utc>>,
    trips: u64,
}

impl CircuitBreaker {
    /// Create a breaker with the given thresholds.
    #[must_use]
    pub const fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: CircuitState::Closed,
            consecutive_failures: 0,
            consecutive_successes: 0,
            opened_at: None,
            trips: 0,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> CircuitState {
        self.state
    }

    /// Number of times the circuit has opened.
    #[must_use]
    pub const fn trips(&self) -> u64 {
        self.trips
    }

    /// Whether a remote call may be attempted at `now`.
    ///
    /// An open circuit whose cooldown has elapsed moves to half-open.
    pub fn is_allowed(&mut self, now: DateTime<Utc>) -> bool {
        match self.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let cooled = self
                    .opened_at
                    .map_or(true, |opened| now - opened >= self.config.cooldown);
                if cooled {
                    self.state = CircuitState::HalfOpen;
                    self.consecutive_successes = 0;
                }
                cooled
            }
        }
    }

    /// Record a successful remote call.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.consecutive_successes += 1;

        if self.state == CircuitState::HalfOpen
            && self.consecutive_successes >= self.config.success_threshold
        {
            self.state = CircuitState::Closed;
            self.consecutive_successes = 0;
            self.opened_at = None;
        }
    }

    /// Record a failed remote call at `now`.
    pub fn record_failure(&mut self, now: DateTime<Utc>) {
        self.consecutive_successes = 0;
        self.consecutive_failures += 1;

        let should_open = match self.state {
            CircuitState::Closed => self.consecutive_failures >= self.config.failure_threshold,
            CircuitState::HalfOpen => true,
            CircuitState::Open => false,
        };
        if should_open {
            self.state = CircuitState::Open;
            self.opened_at = Some(now);
            self.trips += 1;
        }
    }

    /// Time left before the circuit half-opens, if it is open.
    #[must_use]
    pub fn remaining_cooldown(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.state != CircuitState::Open {
            return None;
        }
        self.opened_at
            .map(|opened| (self.config.cooldown - (now - opened)).max(Duration::zero()))
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
