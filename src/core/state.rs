//! Process-wide server state.
//!
//! Two orthogonal flags:
//! - `SHUTDOWN`: Has shutdown been requested? (Ctrl+C / SIGTERM received)
//! - `WATCH_HEALTHY`: Is the filesystem watcher still delivering events?

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, OnceLock};

use tiny_http::Server;
use tokio::sync::watch;

/// Shutdown has been requested
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Watcher is running and has not reported a fatal error
/// - `false`: Files are still served, live reload is degraded
static WATCH_HEALTHY: AtomicBool = AtomicBool::new(true);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Shutdown broadcast for the watch actor
static SHUTDOWN_TX: LazyLock<watch::Sender<bool>> = LazyLock::new(|| watch::channel(false).0);

// =============================================================================
// SHUTDOWN state
// =============================================================================

/// Setup the global Ctrl+C / termination handler. Call once at program start
///
/// - Before `register_server()`: exits immediately, nothing to drain
/// - After `register_server()`: unblocks the accept loop and signals the
///   watch actor; open sessions are closed by the server on its way out
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);
        SHUTDOWN_TX.send_replace(true);

        if let Some(server) = SERVER.get() {
            crate::log!("serve"; "shutting down...");
            server.unblock();
        } else {
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the HTTP server for graceful shutdown
///
/// Call this after binding the server, before entering the request loop
pub fn register_server(server: Arc<Server>) {
    let _ = SERVER.set(server);
}

/// Check if shutdown has been requested
///
/// Relaxed ordering: worst case a few more requests are served before 503s
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// Subscribe to the shutdown broadcast (`true` once shutdown begins)
pub fn shutdown_signal() -> watch::Receiver<bool> {
    SHUTDOWN_TX.subscribe()
}

// =============================================================================
// WATCH_HEALTHY state
// =============================================================================

/// Check if the watcher is healthy
pub fn is_watch_healthy() -> bool {
    WATCH_HEALTHY.load(Ordering::SeqCst)
}

/// Set the watcher health state
pub fn set_watch_healthy(healthy: bool) {
    WATCH_HEALTHY.store(healthy, Ordering::SeqCst);
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_healthy() {
        set_watch_healthy(false);
        assert!(!is_watch_healthy());

        set_watch_healthy(true);
        assert!(is_watch_healthy());
    }

    #[test]
    fn test_shutdown_signal_starts_false() {
        let rx = shutdown_signal();
        assert!(!*rx.borrow());
        assert!(!is_shutdown());
    }
}
