//! FileSystem Actor
//!
//! Watches the served root and feeds every change to the invalidation engine.
//! Also pings open sessions periodically so closed tabs are noticed.
//!
//! Architecture:
//! ```text
//! Watcher → std channel → bridge thread → tokio channel → translate → invalidate::apply
//! ```

use std::sync::Arc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::time::MissedTickBehavior;

use crate::context::ServeContext;
use crate::core::{set_watch_healthy, shutdown_signal};
use crate::reload::{invalidate, registry};
use crate::{debug, logger};

// notify events -> invalidation events.
mod translate;

#[cfg(test)]
mod tests;

use translate::translate;

/// How often open sessions are pinged for liveness
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    _watcher: RecommendedWatcher,
    ctx: Arc<ServeContext>,
}

impl FsActor {
    /// Create the actor and start watching the served root immediately.
    ///
    /// Events buffer in the channel until [`run`](Self::run) is polled.
    pub fn new(ctx: Arc<ServeContext>) -> notify::Result<Self> {
        // Create sync channel for notify (it doesn't support async)
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;
        watcher.watch(ctx.root(), RecursiveMode::Recursive)?;

        debug!("watch"; "watching {}", ctx.root().display());

        Ok(Self {
            notify_rx,
            _watcher: watcher,
            ctx,
        })
    }

    /// Run the actor event loop until shutdown.
    pub async fn run(self) {
        let Self {
            notify_rx,
            _watcher,
            ctx,
        } = self;

        let (async_tx, mut async_rx) = tokio::sync::mpsc::channel(256);

        // Spawn a thread to poll notify events and send to async channel
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                if async_tx.blocking_send(result).is_err() {
                    break; // Receiver dropped
                }
            }
        });

        let mut shutdown = shutdown_signal();
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        heartbeat.reset();

        // After a watcher error only the heartbeat keeps running
        let mut watching = true;

        while !*shutdown.borrow() {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                received = async_rx.recv(), if watching => match received {
                    Some(Ok(event)) => handle_event(&ctx, &event),
                    Some(Err(e)) => {
                        logger::warn("watch", &format!("watcher failed, live reload stopped: {e}"));
                        set_watch_healthy(false);
                        watching = false;
                    }
                    None => watching = false,
                },
                _ = heartbeat.tick() => ping_sessions(&ctx),
            }
        }

        let closed = registry::close_all(&ctx.sessions);
        debug!("watch"; "stopped, closed {} session(s)", closed);
    }
}

/// Apply one raw notify event.
fn handle_event(ctx: &ServeContext, event: &notify::Event) {
    for change in translate(event, ctx.root()) {
        debug!("watch"; "{}: {}", change.kind.label(), change.path.display());
        invalidate::apply(ctx, change);
    }
}

/// Heartbeat: drop sessions whose connection has gone away.
fn ping_sessions(ctx: &ServeContext) {
    let dead = registry::heartbeat(&ctx.sessions);
    if !dead.is_empty() {
        debug!("session"; "{} session(s) closed by client", dead.len());
    }
}
