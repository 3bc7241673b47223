//! Server lifecycle management.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Result, anyhow};
use tiny_http::Server;

use crate::actor::FsActor;
use crate::context::ServeContext;
use crate::core::set_watch_healthy;
use crate::{log, logger};

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind to the specified interface and port, with automatic port retry.
///
/// Port `0` asks the OS for any free port and is never retried.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let attempts = if base_port == 0 { 1 } else { MAX_PORT_RETRIES };
    let mut last_error = None;

    for offset in 0..attempts {
        let Some(port) = base_port.checked_add(offset) else { break };

        match Server::http(SocketAddr::new(interface, port)) {
            Ok(server) => {
                let addr = server
                    .server_addr()
                    .to_ip()
                    .unwrap_or_else(|| SocketAddr::new(interface, port));
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow!(
        "failed to bind {} after {} attempt(s) starting at port {}: {}",
        interface,
        attempts,
        base_port,
        last_error.map_or_else(|| "port range exhausted".to_string(), |e| e.to_string())
    ))
}

/// Spawn the watch actor on its own thread with a private tokio runtime.
pub fn spawn_watcher(ctx: Arc<ServeContext>, watch_enabled: bool) -> Option<JoinHandle<()>> {
    if !watch_enabled {
        log!("watch"; "disabled, pages will not reload");
        return None;
    }

    let spawned = thread::Builder::new()
        .name("watch".into())
        .spawn(move || run_watcher(ctx));

    match spawned {
        Ok(handle) => Some(handle),
        Err(e) => {
            logger::warn("watch", &format!("cannot start watcher thread: {e}"));
            set_watch_healthy(false);
            None
        }
    }
}

fn run_watcher(ctx: Arc<ServeContext>) {
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            logger::warn("watch", &format!("cannot create runtime: {e}"));
            set_watch_healthy(false);
            return;
        }
    };

    rt.block_on(async {
        match FsActor::new(ctx) {
            Ok(actor) => actor.run().await,
            Err(e) => {
                logger::warn("watch", &format!("cannot watch served root: {e}"));
                set_watch_healthy(false);
            }
        }
    });
}

/// Wait for the watch actor to finish (max 2 seconds).
pub fn wait_for_shutdown(handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else { return };

    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    #[test]
    fn test_bind_any_port() {
        let (_server, addr) = bind_with_retry(LOCALHOST, 0).unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[test]
    fn test_bind_retries_next_port() {
        let (_taken, addr) = bind_with_retry(LOCALHOST, 0).unwrap();
        let (_server, retried) = bind_with_retry(LOCALHOST, addr.port()).unwrap();
        assert!(retried.port() > addr.port());
        assert!(retried.port() < addr.port().saturating_add(MAX_PORT_RETRIES));
    }
}
