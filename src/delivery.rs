//! Executors on which listeners are invoked.
//!
//! Every listener of an [`AsyncCall`](crate::AsyncCall) runs on a
//! [`DeliveryExecutor`], never on the thread that resolved the call or
//! registered the listener. [`MainThreadExecutor`] is the single-threaded
//! "UI thread"; [`ImmediateExecutor`] runs tasks inline and exists for tests
//! that do not care about thread hopping.
//!
//! # Examples
//!
//! ```rust
//! use noted::delivery::{DeliveryExecutor, MainThreadExecutor};
//! use std::sync::mpsc;
//!
//! let executor = MainThreadExecutor::spawn().unwrap();
//! let (sender, receiver) = mpsc::channel();
//! executor.post(Box::new(move || sender.send(std::thread::current().id()).unwrap()));
//! assert_eq!(receiver.recv().unwrap(), executor.thread_id());
//! ```

use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, mpsc as std_mpsc};
use std::thread::{self, ThreadId};

use tokio::sync::mpsc;

/// A unit of work posted to a delivery executor.
pub type DeliveryTask = Box<dyn FnOnce() + Send + 'static>;

/// Default name of the thread owned by [`MainThreadExecutor`].
pub const DEFAULT_THREAD_NAME: &str = "noted-main";

/// Runs posted tasks on a designated execution context.
pub trait DeliveryExecutor: Send + Sync {
    /// Schedules `task` on this executor.
    ///
    /// Tasks posted from one thread run in the order they were posted.
    fn post(&self, task: DeliveryTask);
}

impl<E> DeliveryExecutor for Arc<E>
where
    E: DeliveryExecutor + ?Sized,
{
    fn post(&self, task: DeliveryTask) {
        (**self).post(task);
    }
}

// =============================================================================
// ImmediateExecutor
// =============================================================================

/// Executor that runs every task inline on the posting thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImmediateExecutor;

impl DeliveryExecutor for ImmediateExecutor {
    fn post(&self, task: DeliveryTask) {
        task();
    }
}

// =============================================================================
// MainThreadExecutor
// =============================================================================

#[derive(Debug)]
struct Shared {
    sender: mpsc::UnboundedSender<DeliveryTask>,
    thread_id: ThreadId,
}

/// Single-threaded FIFO executor owning a dedicated thread.
///
/// Handles are cheap to clone and share the same thread. When the last
/// handle is dropped the queue closes; the thread finishes the tasks already
/// queued and exits. A panicking task is logged and does not stop the thread.
#[derive(Debug, Clone)]
pub struct MainThreadExecutor {
    shared: Arc<Shared>,
}

impl MainThreadExecutor {
    /// Spawns an executor thread named [`DEFAULT_THREAD_NAME`].
    ///
    /// # Errors
    ///
    /// Returns an error if the operating system refuses to create the thread.
    pub fn spawn() -> io::Result<Self> {
        Self::spawn_named(DEFAULT_THREAD_NAME)
    }

    /// Spawns an executor thread with the given name.
    ///
    /// # Errors
    ///
    /// Returns an error if the operating system refuses to create the thread.
    pub fn spawn_named(name: impl Into<String>) -> io::Result<Self> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<DeliveryTask>();
        let handle = thread::Builder::new().name(name.into()).spawn(move || {
            while let Some(task) = receiver.blocking_recv() {
                if catch_unwind(AssertUnwindSafe(task)).is_err() {
                    tracing::error!("delivery task panicked");
                }
            }
            tracing::debug!("delivery queue closed, executor thread exiting");
        })?;

        Ok(Self {
            shared: Arc::new(Shared {
                sender,
                thread_id: handle.thread().id(),
            }),
        })
    }

    /// Returns the id of the executor thread.
    #[must_use]
    pub fn thread_id(&self) -> ThreadId {
        self.shared.thread_id
    }

    /// Returns `true` when called from the executor thread.
    #[must_use]
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.shared.thread_id
    }

    /// Blocks until every task posted before this call has run.
    ///
    /// Returns immediately when called from the executor thread itself.
    pub fn flush(&self) {
        if self.is_current() {
            return;
        }
        let (sender, receiver) = std_mpsc::channel();
        self.post(Box::new(move || {
            let _ = sender.send(());
        }));
        // A closed queue drops the marker task, which also ends the wait.
        let _ = receiver.recv();
    }
}

impl DeliveryExecutor for MainThreadExecutor {
    fn post(&self, task: DeliveryTask) {
        if self.shared.sender.send(task).is_err() {
            tracing::warn!("delivery executor has shut down, dropping task");
        }
    }
}
