//! Single-result, multi-listener asynchronous call.
//!
//! An [`AsyncCall`] starts unresolved and transitions exactly once to
//! resolved. Every listener, whether registered before or after the
//! transition, receives exactly one delivery of the final result on the
//! call's [`DeliveryExecutor`].
//!
//! # Synchronization
//!
//! The result and the pending listeners live behind one mutex. The state
//! transition and the decision to deliver are made under the lock; the
//! delivery tasks are posted after it is released, so a listener may itself
//! register further listeners on the same call.
//!
//! # Examples
//!
//! ```rust
//! use noted::{AsyncCall, AsyncResult};
//! use noted::delivery::ImmediateExecutor;
//! use std::sync::{Arc, Mutex};
//!
//! let call = AsyncCall::new(ImmediateExecutor);
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let early = Arc::clone(&seen);
//! call.add_listener(move |result| early.lock().unwrap().push(result));
//! call.resolve_success("hello").unwrap();
//!
//! let late = Arc::clone(&seen);
//! call.add_listener(move |result| late.lock().unwrap().push(result));
//!
//! assert_eq!(
//!     *seen.lock().unwrap(),
//!     vec![AsyncResult::Success("hello"), AsyncResult::Success("hello")]
//! );
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::channel::oneshot;
use parking_lot::Mutex;
use smallvec::SmallVec;
use static_assertions::assert_impl_all;

use crate::delivery::DeliveryExecutor;
use crate::error::NetworkError;
use crate::result::{AsyncResult, ErrorInfo};

/// Callback observing an [`AsyncCall`].
pub type Listener<T> = Box<dyn FnOnce(AsyncResult<T>) + Send + 'static>;

/// Listeners pending before resolution. Most calls have one or two observers.
type PendingListeners<T> = SmallVec<[Listener<T>; 4]>;

struct State<T> {
    result: Option<AsyncResult<T>>,
    listeners: PendingListeners<T>,
    registered: usize,
}

struct Inner<T> {
    state: Mutex<State<T>>,
    delivery: Arc<dyn DeliveryExecutor>,
}

/// A fake network call holding at most one result.
///
/// Cloning an `AsyncCall` yields another handle to the same call.
pub struct AsyncCall<T> {
    inner: Arc<Inner<T>>,
}

assert_impl_all!(AsyncCall<String>: Send, Sync, Clone);

impl<T> Clone for AsyncCall<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> AsyncCall<T>
where
    T: Clone + Send + 'static,
{
    /// Creates an unresolved call whose listeners run on `delivery`.
    pub fn new<E>(delivery: E) -> Self
    where
        E: DeliveryExecutor + 'static,
    {
        Self::with_shared_executor(Arc::new(delivery))
    }

    /// Creates an unresolved call sharing an already type-erased executor.
    #[must_use]
    pub fn with_shared_executor(delivery: Arc<dyn DeliveryExecutor>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    result: None,
                    listeners: SmallVec::new(),
                    registered: 0,
                }),
                delivery,
            }),
        }
    }

    /// Registers a listener.
    ///
    /// If the call is already resolved, delivery to this listener (and only
    /// this listener) is scheduled immediately. Otherwise the listener is
    /// queued in registration order until the call resolves. Listeners are
    /// not deduplicated.
    pub fn add_listener<F>(&self, listener: F)
    where
        F: FnOnce(AsyncResult<T>) + Send + 'static,
    {
        let mut state = self.inner.state.lock();
        state.registered += 1;
        let Some(result) = state.result.clone() else {
            state.listeners.push(Box::new(listener));
            return;
        };
        drop(state);

        tracing::trace!("listener registered after resolution");
        self.deliver(Box::new(listener), result);
    }

    /// Resolves the call with data.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::AlreadyResolved` if the call already holds a result.
    pub fn resolve_success(&self, data: T) -> Result<(), NetworkError> {
        self.resolve(AsyncResult::Success(data))
    }

    /// Resolves the call with a failure.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::AlreadyResolved` if the call already holds a result.
    pub fn resolve_failure(&self, error: ErrorInfo) -> Result<(), NetworkError> {
        self.resolve(AsyncResult::Failure(error))
    }

    fn resolve(&self, result: AsyncResult<T>) -> Result<(), NetworkError> {
        let listeners = {
            let mut state = self.inner.state.lock();
            if state.result.is_some() {
                tracing::warn!("attempted to resolve an already resolved call");
                return Err(NetworkError::AlreadyResolved);
            }
            state.result = Some(result.clone());
            std::mem::take(&mut state.listeners)
        };

        tracing::debug!(
            success = result.is_success(),
            listeners = listeners.len(),
            "call resolved"
        );
        for listener in listeners {
            self.deliver(listener, result.clone());
        }
        Ok(())
    }

    fn deliver(&self, listener: Listener<T>, result: AsyncResult<T>) {
        self.inner.delivery.post(Box::new(move || {
            tracing::trace!(success = result.is_success(), "delivering result");
            listener(result);
        }));
    }

    /// Returns a snapshot of the result, or `None` while unresolved.
    #[must_use]
    pub fn result(&self) -> Option<AsyncResult<T>> {
        self.inner.state.lock().result.clone()
    }

    /// Returns `true` once the call holds a result.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.inner.state.lock().result.is_some()
    }

    /// Returns how many listeners have been registered over the call's lifetime.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.state.lock().registered
    }

    /// Returns a future completing with the call's result.
    ///
    /// The internal listener is registered when this method is called, not
    /// when the future is first polled. A failure is surfaced as
    /// `NetworkError::SimulatedFailure`.
    ///
    /// # Errors
    ///
    /// The future yields `NetworkError::SimulatedFailure` when the call fails,
    /// and `NetworkError::Abandoned` when the delivery executor drops the
    /// delivery (for instance because it has shut down).
    pub fn wait(&self) -> impl Future<Output = Result<T, NetworkError>> + Send + 'static {
        let (sender, receiver) = oneshot::channel();
        self.add_listener(move |result| {
            let _ = sender.send(result);
        });
        async move {
            receiver
                .await
                .map_err(|_| NetworkError::Abandoned)?
                .into_result()
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for AsyncCall<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        formatter
            .debug_struct("AsyncCall")
            .field("result", &state.result)
            .field("pending_listeners", &state.listeners.len())
            .field("registered", &state.registered)
            .finish()
    }
}
