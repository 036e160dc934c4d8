//! Fake network demo.
//!
//! Requests a handful of welcome titles and prints every delivery as it
//! arrives on the main-thread executor. Configure it with `NOTED_LATENCY_MS`,
//! `NOTED_ERROR_RATE`, `NOTED_ERROR_MESSAGE`, and `RUST_LOG`.

use std::process::ExitCode;
use std::sync::mpsc;

use noted::delivery::MainThreadExecutor;
use noted::{AsyncResult, CallFactory, FakeMainNetwork, MainNetwork, NetworkConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const REQUESTS: usize = 5;

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,noted=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match NetworkConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::warn!("Failed to load configuration from environment: {error}");
            tracing::info!("Using default configuration");
            NetworkConfig::default()
        }
    };
    tracing::info!(
        "Configuration loaded: latency={:?}, error_rate={}",
        config.latency,
        config.error_rate
    );

    let main_thread = match MainThreadExecutor::spawn() {
        Ok(executor) => executor,
        Err(error) => {
            tracing::error!("Failed to start main-thread executor: {error}");
            return ExitCode::FAILURE;
        }
    };
    let factory = match CallFactory::from_config(&config, main_thread.clone()) {
        Ok(factory) => factory,
        Err(error) => {
            tracing::error!("Invalid network configuration: {error}");
            return ExitCode::FAILURE;
        }
    };
    let network = FakeMainNetwork::new(factory);

    let (sender, receiver) = mpsc::channel();
    for request in 0..REQUESTS {
        let sender = sender.clone();
        let executor = main_thread.clone();
        network.fetch_new_welcome().add_listener(move |result| {
            let on_main_thread = executor.is_current();
            let _ = sender.send((request, result, on_main_thread));
        });
    }
    drop(sender);

    let mut failures = 0;
    for (request, result, on_main_thread) in receiver {
        match result {
            AsyncResult::Success(title) => {
                tracing::info!(request, on_main_thread, "Received title: {title}");
            }
            AsyncResult::Failure(error) => {
                failures += 1;
                tracing::warn!(request, on_main_thread, "Request failed: {error}");
            }
        }
    }

    tracing::info!("{} of {REQUESTS} requests succeeded", REQUESTS - failures);
    ExitCode::SUCCESS
}
