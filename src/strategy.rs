//! Strategies deciding whether a simulated call fails.
//!
//! A [`CallFactory`](crate::CallFactory) consults an
//! [`ErrorDecisionStrategy`] once per call, after the simulated latency.
//! Tests should inject [`AlwaysFail`] or [`NeverFail`] into the factory.
//! Code that cannot be reached that way can swap the process-wide delegate
//! behind [`DefaultErrorDecisionStrategy`].
//!
//! # Examples
//!
//! ```rust
//! use noted::strategy::{AlwaysFail, ErrorDecisionStrategy, NeverFail, RandomErrorStrategy};
//!
//! assert!(AlwaysFail.should_fail());
//! assert!(!NeverFail.should_fail());
//!
//! let never = RandomErrorStrategy::new(0.0).unwrap();
//! assert!(!never.should_fail());
//! ```

use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use rand::Rng;

use crate::error::NetworkError;

/// Probability of failure used by the default random strategy.
pub const DEFAULT_ERROR_RATE: f64 = 0.3;

/// Decides whether a simulated network call should fail.
pub trait ErrorDecisionStrategy: Send + Sync {
    /// Returns `true` if the current call should resolve with a failure.
    fn should_fail(&self) -> bool;
}

impl<F> ErrorDecisionStrategy for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn should_fail(&self) -> bool {
        self()
    }
}

// =============================================================================
// Deterministic strategies
// =============================================================================

/// Strategy that fails every call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlwaysFail;

impl ErrorDecisionStrategy for AlwaysFail {
    fn should_fail(&self) -> bool {
        true
    }
}

/// Strategy that never fails a call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeverFail;

impl ErrorDecisionStrategy for NeverFail {
    fn should_fail(&self) -> bool {
        false
    }
}

// =============================================================================
// RandomErrorStrategy
// =============================================================================

/// Strategy that fails with a fixed probability.
///
/// Randomness comes from the thread-local generator, so instances are
/// stateless and can be shared freely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomErrorStrategy {
    error_rate: f64,
}

impl RandomErrorStrategy {
    /// Creates a strategy failing with probability `error_rate`.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::InvalidArgument` if `error_rate` is not within `[0.0, 1.0]`.
    pub fn new(error_rate: f64) -> Result<Self, NetworkError> {
        if !(0.0..=1.0).contains(&error_rate) {
            return Err(NetworkError::invalid_argument(format!(
                "error rate must be within [0.0, 1.0], got {error_rate}"
            )));
        }
        Ok(Self { error_rate })
    }

    /// Returns the configured failure probability.
    #[must_use]
    pub const fn error_rate(&self) -> f64 {
        self.error_rate
    }
}

impl Default for RandomErrorStrategy {
    fn default() -> Self {
        Self {
            error_rate: DEFAULT_ERROR_RATE,
        }
    }
}

impl ErrorDecisionStrategy for RandomErrorStrategy {
    fn should_fail(&self) -> bool {
        rand::thread_rng().gen_bool(self.error_rate)
    }
}

// =============================================================================
// Process-wide default
// =============================================================================

/// Process-wide delegate. Set once on first use, optionally swapped by tests,
/// never torn down.
static DEFAULT_DELEGATE: LazyLock<RwLock<Arc<dyn ErrorDecisionStrategy>>> =
    LazyLock::new(|| RwLock::new(Arc::new(RandomErrorStrategy::default())));

/// Strategy that forwards to a swappable process-wide delegate.
///
/// The delegate starts out as a [`RandomErrorStrategy`] at
/// [`DEFAULT_ERROR_RATE`].
///
/// # Examples
///
/// ```rust
/// use noted::strategy::{DefaultErrorDecisionStrategy, ErrorDecisionStrategy, AlwaysFail};
///
/// DefaultErrorDecisionStrategy::set_delegate(AlwaysFail);
/// assert!(DefaultErrorDecisionStrategy.should_fail());
/// DefaultErrorDecisionStrategy::reset_delegate();
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultErrorDecisionStrategy;

impl DefaultErrorDecisionStrategy {
    /// Replaces the process-wide delegate.
    pub fn set_delegate<S>(strategy: S)
    where
        S: ErrorDecisionStrategy + 'static,
    {
        *DEFAULT_DELEGATE.write() = Arc::new(strategy);
        tracing::debug!("default error decision strategy replaced");
    }

    /// Restores the random delegate at [`DEFAULT_ERROR_RATE`].
    pub fn reset_delegate() {
        Self::set_delegate(RandomErrorStrategy::default());
    }

    /// Returns the current delegate.
    #[must_use]
    pub fn delegate() -> Arc<dyn ErrorDecisionStrategy> {
        Arc::clone(&DEFAULT_DELEGATE.read())
    }
}

impl ErrorDecisionStrategy for DefaultErrorDecisionStrategy {
    fn should_fail(&self) -> bool {
        // The read guard is released before the delegate runs.
        Self::delegate().should_fail()
    }
}
