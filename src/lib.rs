//! # noted
//!
//! A completely fake networking library. Calls return a random value from a
//! caller-supplied list, or an error, after a simulated delay.
//!
//! ## Overview
//!
//! - **[`AsyncCall`]**: holds at most one [`AsyncResult`] and delivers it to
//!   every listener exactly once, including listeners registered late.
//! - **[`CallFactory`]**: starts fake requests on a worker runtime.
//! - **[`ErrorDecisionStrategy`]**: decides whether a request fails; swap it
//!   for [`AlwaysFail`] or [`NeverFail`] in tests.
//! - **[`delivery`]**: executors listeners run on, most notably the
//!   single-threaded [`MainThreadExecutor`](delivery::MainThreadExecutor).
//! - **[`MainNetwork`]**: the network seam consumed by title repositories.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::mpsc;
//! use std::time::Duration;
//! use noted::prelude::*;
//!
//! let main_thread = MainThreadExecutor::spawn().unwrap();
//! let factory = CallFactory::new(main_thread.clone())
//!     .with_strategy(NeverFail)
//!     .with_latency(Duration::from_millis(10));
//!
//! let call = factory.fetch(vec!["a", "b"]).unwrap();
//! let (sender, receiver) = mpsc::channel();
//! call.add_listener(move |result| sender.send(result).unwrap());
//!
//! match receiver.recv().unwrap() {
//!     AsyncResult::Success(data) => assert!(data == "a" || data == "b"),
//!     AsyncResult::Failure(error) => panic!("unexpected failure: {error}"),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// ```rust
/// use noted::prelude::*;
/// ```
pub mod prelude {
    pub use crate::call::AsyncCall;
    pub use crate::config::NetworkConfig;
    pub use crate::delivery::{DeliveryExecutor, ImmediateExecutor, MainThreadExecutor};
    pub use crate::error::NetworkError;
    pub use crate::factory::CallFactory;
    pub use crate::network::{FakeMainNetwork, MainNetwork};
    pub use crate::result::{AsyncResult, ErrorInfo};
    pub use crate::strategy::{
        AlwaysFail, DefaultErrorDecisionStrategy, ErrorDecisionStrategy, NeverFail,
        RandomErrorStrategy,
    };
}

pub mod call;
pub mod config;
pub mod delivery;
pub mod error;
pub mod factory;
pub mod network;
pub mod result;
pub mod runtime;
pub mod strategy;

pub use call::{AsyncCall, Listener};
pub use config::{ConfigError, NetworkConfig};
pub use error::NetworkError;
pub use factory::CallFactory;
pub use network::{FakeMainNetwork, MainNetwork};
pub use result::{AsyncResult, ErrorInfo};
pub use strategy::{
    AlwaysFail, DefaultErrorDecisionStrategy, ErrorDecisionStrategy, NeverFail,
    RandomErrorStrategy,
};
