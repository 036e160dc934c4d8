//! Factory launching simulated network requests.
//!
//! [`CallFactory::fetch`] hands back an unresolved [`AsyncCall`] right away
//! and schedules the request on the worker runtime. After the configured
//! latency the request consults its [`ErrorDecisionStrategy`] and resolves
//! the call with either a random candidate or a failure.
//!
//! There is no retry, cancellation, or timeout: once scheduled, the
//! resolution always fires. Callers impose timeouts themselves. If the
//! request task is dropped before it resolves its call, for example because
//! an injected worker runtime shut down, the call resolves with a failure
//! instead.
//!
//! # Examples
//!
//! ```rust
//! use std::time::Duration;
//! use noted::{CallFactory, NeverFail};
//! use noted::delivery::MainThreadExecutor;
//!
//! let factory = CallFactory::new(MainThreadExecutor::spawn().unwrap())
//!     .with_strategy(NeverFail)
//!     .with_latency(Duration::from_millis(10));
//!
//! let call = factory.fetch(["Hello", "Welcome"]).unwrap();
//! let title = noted::runtime::global().block_on(call.wait()).unwrap();
//! assert!(["Hello", "Welcome"].contains(&title));
//! ```

use std::fmt;
use std::iter;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::runtime::Handle;

use crate::call::AsyncCall;
use crate::config::{DEFAULT_ERROR_MESSAGE, DEFAULT_LATENCY, NetworkConfig};
use crate::delivery::DeliveryExecutor;
use crate::error::NetworkError;
use crate::result::ErrorInfo;
use crate::runtime;
use crate::strategy::{DefaultErrorDecisionStrategy, ErrorDecisionStrategy, RandomErrorStrategy};

/// Failure message used when a request task is dropped before resolving.
pub const ABANDONED_REQUEST_MESSAGE: &str = "worker runtime shut down before the request completed";

/// Creates fake network calls.
///
/// A factory is cheap to clone; clones share the strategy, the delivery
/// executor, and the worker runtime.
#[derive(Clone)]
pub struct CallFactory {
    strategy: Arc<dyn ErrorDecisionStrategy>,
    delivery: Arc<dyn DeliveryExecutor>,
    worker: Handle,
    latency: Duration,
    error_message: Arc<str>,
}

impl CallFactory {
    /// Creates a factory delivering results on `delivery`.
    ///
    /// The factory consults [`DefaultErrorDecisionStrategy`], waits
    /// [`DEFAULT_LATENCY`], and runs its background work on the process-wide
    /// worker runtime, whatever runtime the constructing thread is in.
    pub fn new<E>(delivery: E) -> Self
    where
        E: DeliveryExecutor + 'static,
    {
        Self {
            strategy: Arc::new(DefaultErrorDecisionStrategy),
            delivery: Arc::new(delivery),
            worker: runtime::handle(),
            latency: DEFAULT_LATENCY,
            error_message: Arc::from(DEFAULT_ERROR_MESSAGE),
        }
    }

    /// Creates a factory from a [`NetworkConfig`], failing randomly at the
    /// configured rate.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::InvalidArgument` if the configured error rate is
    /// not within `[0.0, 1.0]`.
    pub fn from_config<E>(config: &NetworkConfig, delivery: E) -> Result<Self, NetworkError>
    where
        E: DeliveryExecutor + 'static,
    {
        let strategy = RandomErrorStrategy::new(config.error_rate)?;
        Ok(Self::new(delivery)
            .with_strategy(strategy)
            .with_latency(config.latency)
            .with_error_message(config.error_message.as_str()))
    }

    /// Replaces the error decision strategy.
    #[must_use]
    pub fn with_strategy<S>(self, strategy: S) -> Self
    where
        S: ErrorDecisionStrategy + 'static,
    {
        self.with_shared_strategy(Arc::new(strategy))
    }

    /// Replaces the error decision strategy with a shared one.
    #[must_use]
    pub fn with_shared_strategy(mut self, strategy: Arc<dyn ErrorDecisionStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Replaces the simulated latency.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Replaces the message carried by simulated failures.
    #[must_use]
    pub fn with_error_message(mut self, message: impl Into<Arc<str>>) -> Self {
        self.error_message = message.into();
        self
    }

    /// Runs background work on the given runtime instead.
    ///
    /// The caller keeps that runtime alive and driven. Calls fetched after it
    /// shuts down resolve with a failure.
    #[must_use]
    pub fn with_runtime(mut self, worker: Handle) -> Self {
        self.worker = worker;
        self
    }

    /// Returns the simulated latency.
    #[must_use]
    pub const fn latency(&self) -> Duration {
        self.latency
    }

    /// Starts a fake request resolving to one of `candidates`.
    ///
    /// The returned call is unresolved. The background task waits the
    /// simulated latency on the worker runtime's clock, then resolves the call
    /// with a uniformly chosen candidate, or with a failure if the strategy
    /// says so.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::InvalidArgument` when `candidates` is empty. No
    /// background work is scheduled in that case.
    pub fn fetch<T, I>(&self, candidates: I) -> Result<AsyncCall<T>, NetworkError>
    where
        T: Clone + Send + 'static,
        I: IntoIterator<Item = T>,
    {
        let mut candidates = candidates.into_iter();
        let Some(first) = candidates.next() else {
            return Err(NetworkError::invalid_argument(
                "at least one candidate result is required",
            ));
        };
        Ok(self.dispatch(first, candidates))
    }

    /// Starts a fake request over a candidate list that cannot be empty.
    pub(crate) fn dispatch<T>(&self, first: T, rest: impl IntoIterator<Item = T>) -> AsyncCall<T>
    where
        T: Clone + Send + 'static,
    {
        let mut candidates: Vec<T> = iter::once(first).chain(rest).collect();
        let call = AsyncCall::with_shared_executor(Arc::clone(&self.delivery));
        let pending = PendingResolution {
            call: call.clone(),
        };
        let strategy = Arc::clone(&self.strategy);
        let error_message = Arc::clone(&self.error_message);
        let latency = self.latency;

        tracing::debug!(
            candidates = candidates.len(),
            ?latency,
            "scheduling fake network request"
        );
        self.worker.spawn(async move {
            tokio::time::sleep(latency).await;

            let resolution = if strategy.should_fail() {
                pending.call.resolve_failure(ErrorInfo::new(&*error_message))
            } else {
                let index = rand::thread_rng().gen_range(0..candidates.len());
                pending.call.resolve_success(candidates.swap_remove(index))
            };
            if let Err(error) = resolution {
                tracing::warn!(%error, "fake network request could not resolve its call");
            }
        });

        call
    }
}

/// Owns the resolving side of a dispatched call.
///
/// Dropping it while the call is still unresolved resolves the call with
/// [`ABANDONED_REQUEST_MESSAGE`]. That covers a request task discarded by a
/// runtime that shut down, and a strategy that panicked.
struct PendingResolution<T>
where
    T: Clone + Send + 'static,
{
    call: AsyncCall<T>,
}

impl<T> Drop for PendingResolution<T>
where
    T: Clone + Send + 'static,
{
    fn drop(&mut self) {
        if self.call.is_resolved() {
            return;
        }
        tracing::warn!("fake network request dropped before resolving its call");
        if let Err(error) = self
            .call
            .resolve_failure(ErrorInfo::new(ABANDONED_REQUEST_MESSAGE))
        {
            tracing::debug!(%error, "abandoned call was resolved concurrently");
        }
    }
}

impl fmt::Debug for CallFactory {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CallFactory")
            .field("latency", &self.latency)
            .field("error_message", &self.error_message)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::ImmediateExecutor;
    use crate::result::AsyncResult;
    use crate::strategy::{AlwaysFail, NeverFail};
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn fetch_returns_unresolved_call() {
        let factory = CallFactory::new(ImmediateExecutor)
            .with_runtime(Handle::current())
            .with_strategy(NeverFail);
        let call = factory.fetch([1, 2, 3]).unwrap();
        assert!(!call.is_resolved());
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn fetch_resolves_after_latency() {
        let factory = CallFactory::new(ImmediateExecutor)
            .with_runtime(Handle::current())
            .with_strategy(NeverFail);
        let call = factory.fetch([1, 2, 3]).unwrap();

        tokio::time::sleep(factory.latency() - Duration::from_millis(1)).await;
        assert!(!call.is_resolved());

        tokio::time::sleep(Duration::from_millis(2)).await;
        let data = call.result().and_then(|result| result.success().copied());
        assert!(matches!(data, Some(1..=3)));
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn failure_carries_configured_message() {
        let factory = CallFactory::new(ImmediateExecutor)
            .with_runtime(Handle::current())
            .with_strategy(AlwaysFail)
            .with_error_message("offline");
        let call = factory.fetch(["a"]).unwrap();
        assert_eq!(
            call.wait().await,
            Err(NetworkError::simulated_failure("offline"))
        );
        assert_eq!(
            call.result(),
            Some(AsyncResult::Failure(ErrorInfo::new("offline")))
        );
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn empty_candidates_schedule_nothing() {
        let consulted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&consulted);
        let factory = CallFactory::new(ImmediateExecutor)
            .with_runtime(Handle::current())
            .with_strategy(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                false
            });

        let result = factory.fetch(Vec::<String>::new());
        assert!(matches!(result, Err(NetworkError::InvalidArgument(_))));

        tokio::time::sleep(factory.latency() * 2).await;
        assert_eq!(consulted.load(Ordering::SeqCst), 0);
    }

    #[rstest]
    fn fetch_on_shut_down_runtime_resolves_with_failure() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let worker = runtime.handle().clone();
        drop(runtime);

        let factory = CallFactory::new(ImmediateExecutor)
            .with_runtime(worker)
            .with_strategy(NeverFail);
        let call = factory.fetch(["a", "b"]).unwrap();

        let result = runtime::global().block_on(call.wait());
        assert_eq!(
            result,
            Err(NetworkError::simulated_failure(ABANDONED_REQUEST_MESSAGE))
        );
        assert_eq!(
            call.result(),
            Some(AsyncResult::Failure(ErrorInfo::new(ABANDONED_REQUEST_MESSAGE)))
        );
    }

    #[rstest]
    fn panicking_strategy_resolves_with_failure() {
        let factory = CallFactory::new(ImmediateExecutor)
            .with_latency(Duration::ZERO)
            .with_strategy(|| -> bool { panic!("strategy exploded") });
        let call = factory.fetch([1]).unwrap();

        let result = runtime::global().block_on(call.wait());
        assert_eq!(
            result,
            Err(NetworkError::simulated_failure(ABANDONED_REQUEST_MESSAGE))
        );
    }

    #[rstest]
    fn dispatch_includes_first_candidate() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();
        let factory = CallFactory::new(ImmediateExecutor)
            .with_runtime(runtime.handle().clone())
            .with_strategy(NeverFail);
        let call = factory.dispatch("only", Vec::new());
        assert_eq!(runtime.block_on(call.wait()), Ok("only"));
    }

    #[rstest]
    fn from_config_rejects_invalid_rate() {
        let config = NetworkConfig {
            error_rate: 2.0,
            ..NetworkConfig::default()
        };
        assert!(matches!(
            CallFactory::from_config(&config, ImmediateExecutor),
            Err(NetworkError::InvalidArgument(_))
        ));
    }

    #[rstest]
    fn from_config_applies_latency() {
        let config = NetworkConfig::default().with_latency(Duration::from_millis(5));
        let factory = CallFactory::from_config(&config, ImmediateExecutor).unwrap();
        assert_eq!(factory.latency(), Duration::from_millis(5));
    }
}
