//! Outcome of a fake network call.
//!
//! [`AsyncResult`] is what listeners receive. A failure is an ordinary
//! variant, so callers branch on it instead of catching anything.

use std::fmt;

use crate::error::NetworkError;

/// Information about a simulated network failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErrorInfo {
    message: String,
}

impl ErrorInfo {
    /// Creates a new `ErrorInfo` carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.message)
    }
}

impl From<ErrorInfo> for NetworkError {
    fn from(info: ErrorInfo) -> Self {
        Self::SimulatedFailure {
            message: info.message,
        }
    }
}

/// The terminal result of an [`AsyncCall`](crate::AsyncCall).
///
/// # Examples
///
/// ```rust
/// use noted::{AsyncResult, ErrorInfo};
///
/// let success: AsyncResult<i32> = AsyncResult::Success(42);
/// assert_eq!(success.success(), Some(&42));
///
/// let failure: AsyncResult<i32> = AsyncResult::Failure(ErrorInfo::new("offline"));
/// assert_eq!(failure.failure().map(ErrorInfo::message), Some("offline"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AsyncResult<T> {
    /// The call completed with data.
    Success(T),
    /// The call failed.
    Failure(ErrorInfo),
}

impl<T> AsyncResult<T> {
    /// Returns `true` if this is a `Success`.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns `true` if this is a `Failure`.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Returns the data of a `Success`.
    #[must_use]
    pub const fn success(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            Self::Failure(_) => None,
        }
    }

    /// Returns the error information of a `Failure`.
    #[must_use]
    pub const fn failure(&self) -> Option<&ErrorInfo> {
        match self {
            Self::Success(_) => None,
            Self::Failure(info) => Some(info),
        }
    }

    /// Maps the data of a `Success`, leaving a `Failure` untouched.
    pub fn map<U, F>(self, function: F) -> AsyncResult<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Success(data) => AsyncResult::Success(function(data)),
            Self::Failure(info) => AsyncResult::Failure(info),
        }
    }

    /// Converts into a `Result`, turning a `Failure` into
    /// [`NetworkError::SimulatedFailure`].
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::SimulatedFailure` for a `Failure`.
    pub fn into_result(self) -> Result<T, NetworkError> {
        match self {
            Self::Success(data) => Ok(data),
            Self::Failure(info) => Err(info.into()),
        }
    }
}
