// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # System Signal Handling
//!
//! Cross-platform signal handling for graceful shutdown.
//!
//! ## Supported Signals
//!
//! - **SIGTERM** (15) - Graceful shutdown request
//! - **SIGINT** (2) - User interrupt (Ctrl+C)
//! - **SIGHUP** (1) - Hangup (terminal closed), Unix only
//!
//! ## Design Pattern
//!
//! - **Async signal handling** via tokio
//! - **Trait abstraction** for testing
//! - **Callback-based** shutdown initiation
//! - **Platform-specific** implementations (Unix vs Windows)

use std::future::Future;
use std::pin::Pin;

/// Callback type for shutdown notification
pub type ShutdownCallback = Box<dyn FnOnce() + Send + 'static>;

/// System signal handling trait
pub trait SystemSignals: Send + Sync {
    /// Wait for a shutdown signal and invoke the callback.
    fn wait_for_signal(&self, on_shutdown: ShutdownCallback) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Unix signal handler: SIGTERM, SIGINT, SIGHUP via `tokio::signal::unix`.
#[cfg(unix)]
pub struct UnixSignalHandler;

#[cfg(unix)]
impl UnixSignalHandler {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
impl Default for UnixSignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
impl SystemSignals for UnixSignalHandler {
    fn wait_for_signal(&self, on_shutdown: ShutdownCallback) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
            let mut sigint = signal(SignalKind::interrupt()).expect("failed to register SIGINT handler");
            let mut sighup = signal(SignalKind::hangup()).expect("failed to register SIGHUP handler");

            tokio::select! {
                _ = sigterm.recv() => tracing::info!("received SIGTERM, initiating graceful shutdown"),
                _ = sigint.recv() => tracing::info!("received SIGINT, initiating graceful shutdown"),
                _ = sighup.recv() => tracing::info!("received SIGHUP, initiating graceful shutdown"),
            }

            on_shutdown();
        })
    }
}

/// Windows signal handler: Ctrl+C via `tokio::signal::ctrl_c`.
#[cfg(windows)]
pub struct WindowsSignalHandler;

#[cfg(windows)]
impl WindowsSignalHandler {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(windows)]
impl Default for WindowsSignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(windows)]
impl SystemSignals for WindowsSignalHandler {
    fn wait_for_signal(&self, on_shutdown: ShutdownCallback) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            tokio::signal::ctrl_c().await.expect("failed to register Ctrl+C handler");
            tracing::info!("received Ctrl+C, initiating graceful shutdown");
            on_shutdown();
        })
    }
}

/// No-op signal handler for testing: never fires, so tests control shutdown
/// explicitly via the [`crate::shutdown::ShutdownCoordinator`].
pub struct NoOpSignalHandler;

impl NoOpSignalHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOpSignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemSignals for NoOpSignalHandler {
    fn wait_for_signal(&self, _on_shutdown: ShutdownCallback) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            std::future::pending::<()>().await;
        })
    }
}

/// Create the platform-specific signal handler.
pub fn create_signal_handler() -> Box<dyn SystemSignals> {
    #[cfg(unix)]
    {
        Box::new(UnixSignalHandler::new())
    }

    #[cfg(windows)]
    {
        Box::new(WindowsSignalHandler::new())
    }

    #[cfg(not(any(unix, windows)))]
    {
        compile_error!("unsupported platform for signal handling");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_noop_signal_handler() {
        let handler = NoOpSignalHandler::new();
        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let callback = Box::new(move || {
            called_clone.store(true, Ordering::SeqCst);
        });
        let wait_future = handler.wait_for_signal(callback);

        tokio::select! {
            _ = wait_future => panic!("no-op handler should never complete"),
            _ = tokio::time::sleep(tokio::time::Duration::from_millis(100)) => {}
        }

        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn test_create_signal_handler() {
        let _handler = create_signal_handler();
    }
}
