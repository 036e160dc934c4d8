//! Worker runtime for simulated network requests.
//!
//! Background work (latency and randomness) runs on a dedicated
//! multi-thread tokio runtime, never on the delivery thread and never on
//! whichever runtime happens to be current when a factory is built. The
//! runtime is created on first use and never dropped, so work dispatched to
//! it always gets to run. Tests that want a paused clock opt in with
//! [`CallFactory::with_runtime`](crate::CallFactory::with_runtime).

use std::cell::RefCell;
use std::sync::LazyLock;

use tokio::runtime::{Builder, Handle, Runtime};

/// Process-wide worker runtime, one worker thread per CPU core.
static WORKER_RUNTIME: LazyLock<Runtime> = LazyLock::new(|| {
    Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .thread_name("noted-worker")
        .enable_all()
        .build()
        .expect("Failed to create worker tokio runtime")
});

thread_local! {
    static CACHED_HANDLE: RefCell<Option<Handle>> = const { RefCell::new(None) };
}

/// Returns the process-wide worker runtime.
#[inline]
#[must_use]
pub fn global() -> &'static Runtime {
    &WORKER_RUNTIME
}

/// Returns a handle to the process-wide worker runtime.
///
/// The handle is cached per thread. It points at the worker runtime even
/// when called from inside another runtime.
///
/// # Examples
///
/// ```rust
/// let handle = noted::runtime::handle();
/// let joined = handle.spawn(async { 1 + 1 });
/// assert_eq!(noted::runtime::global().block_on(joined).unwrap(), 2);
/// ```
#[must_use]
pub fn handle() -> Handle {
    CACHED_HANDLE.with(|cached| {
        cached
            .borrow_mut()
            .get_or_insert_with(|| global().handle().clone())
            .clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tokio::runtime::RuntimeFlavor;

    #[rstest]
    fn handle_spawns_onto_worker_runtime() {
        let obtained = handle();
        let value = global().block_on(async move { obtained.spawn(async { 42 }).await });
        assert_eq!(value.unwrap(), 42);
    }

    #[rstest]
    fn handle_outside_runtime_is_multi_thread() {
        assert_eq!(handle().runtime_flavor(), RuntimeFlavor::MultiThread);
    }

    #[rstest]
    #[tokio::test]
    async fn handle_inside_other_runtime_still_points_at_worker() {
        assert_eq!(Handle::current().runtime_flavor(), RuntimeFlavor::CurrentThread);
        assert_eq!(handle().runtime_flavor(), RuntimeFlavor::MultiThread);
    }
}
