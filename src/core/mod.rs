//! Core types - pure abstractions shared across the codebase.

mod session;
mod state;
mod url;

pub use session::SessionId;
pub use state::{
    is_shutdown, is_watch_healthy, register_server, set_watch_healthy, setup_shutdown_handler,
    shutdown_signal,
};
pub use url::UrlPath;
