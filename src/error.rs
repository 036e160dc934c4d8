//! Error types for fake network calls.
//!
//! Simulated network failures are not errors in the Rust sense while they
//! travel through listeners: they are delivered as
//! [`AsyncResult::Failure`](crate::AsyncResult::Failure). [`NetworkError`]
//! covers the programming errors that fail fast at the call site, plus the
//! conversion target used by [`AsyncCall::wait`](crate::AsyncCall::wait).

use thiserror::Error;

/// Represents errors that can occur when working with fake network calls.
///
/// # Examples
///
/// ```rust
/// use noted::NetworkError;
///
/// let error = NetworkError::simulated_failure("Error contacting the network");
/// assert_eq!(format!("{error}"), "simulated network failure: Error contacting the network");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// The simulated network decided to fail this call.
    #[error("simulated network failure: {message}")]
    SimulatedFailure {
        /// Human-readable message carried by the failure.
        message: String,
    },

    /// An argument violated a precondition (for example an empty candidate list).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A call was resolved more than once.
    #[error("call has already been resolved")]
    AlreadyResolved,

    /// A waiter's listener was dropped before it was delivered a result.
    ///
    /// This happens when the delivery executor shuts down while calls are
    /// still pending.
    #[error("call was abandoned before a result was delivered")]
    Abandoned,
}

impl NetworkError {
    /// Creates a [`NetworkError::SimulatedFailure`] with the given message.
    pub fn simulated_failure(message: impl Into<String>) -> Self {
        Self::SimulatedFailure {
            message: message.into(),
        }
    }

    /// Creates a [`NetworkError::InvalidArgument`] with the given description.
    pub fn invalid_argument(description: impl Into<String>) -> Self {
        Self::InvalidArgument(description.into())
    }

    /// Returns `true` if this error is a simulated network failure.
    #[must_use]
    pub const fn is_simulated_failure(&self) -> bool {
        matches!(self, Self::SimulatedFailure { .. })
    }
}
