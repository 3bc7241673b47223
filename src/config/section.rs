//! `[serve]` and `[log]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 8000                 # HTTP port number
//! index = "index.html"        # Document served for directory URLs
//! watch = true                # Reload pages on file changes
//! workers = 32                # Request handler threads (default: 4 per CPU, at least 32)
//!
//! [log]
//! verbose = false             # Log requests, edges and sessions
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use std::net::{IpAddr, Ipv4Addr};

use serde::Deserialize;

/// Development server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number. The next ports are tried when it is busy.
    pub port: u16,

    /// Index document name appended to directory URLs.
    pub index: String,

    /// Enable file watcher for live reload.
    pub watch: bool,

    /// Size of the request handler pool.
    ///
    /// Each in-flight response holds a worker until its body is written, so
    /// a client that stops reading keeps one busy. The pool is sized well
    /// above the number of transfers a browser keeps open.
    pub workers: usize,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 8000,
            index: "index.html".to_string(),
            watch: true,
            workers: default_workers(),
        }
    }
}

/// Minimum request pool size.
const MIN_WORKERS: usize = 32;

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map_or(1, |n| n.get())
        .saturating_mul(4)
        .max(MIN_WORKERS)
}

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Print debug-level lines.
    pub verbose: bool,
}
