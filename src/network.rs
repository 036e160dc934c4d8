//! Network seam consumed by title repositories.
//!
//! [`MainNetwork`] is what callers program against; [`FakeMainNetwork`]
//! implements it on top of a [`CallFactory`].

use crate::call::AsyncCall;
use crate::factory::CallFactory;

/// Titles the fake network picks from.
pub const WELCOME_TITLES: [&str; 5] = [
    "Hello, network!",
    "Welcome back",
    "Good to see you",
    "Fresh from the server",
    "Noted",
];

/// Remote source of welcome titles.
pub trait MainNetwork: Send + Sync {
    /// Requests a new welcome title.
    fn fetch_new_welcome(&self) -> AsyncCall<String>;
}

/// [`MainNetwork`] backed by the fake network library.
#[derive(Debug, Clone)]
pub struct FakeMainNetwork {
    factory: CallFactory,
}

impl FakeMainNetwork {
    /// Creates a network issuing calls through `factory`.
    #[must_use]
    pub const fn new(factory: CallFactory) -> Self {
        Self { factory }
    }
}

impl MainNetwork for FakeMainNetwork {
    fn fetch_new_welcome(&self) -> AsyncCall<String> {
        let [first, rest @ ..] = WELCOME_TITLES;
        self.factory.dispatch(
            first.to_string(),
            rest.iter().map(|title| (*title).to_string()),
        )
    }
}
