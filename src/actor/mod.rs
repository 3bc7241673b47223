//! Actor for live reload
//!
//! ```text
//! notify watcher ──(thread bridge)──→ FsActor ──→ invalidate::apply ──→ sessions
//!                    heartbeat tick ──┘
//! ```
//!
//! # Module Structure
//!
//! - `fs` - File system watcher, event translation and session heartbeat

pub mod fs;

pub use fs::FsActor;
