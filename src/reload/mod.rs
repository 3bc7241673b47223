//! Live reload: who is watching what, and who to tell when a file changes.
//!
//! # Architecture
//!
//! ```text
//! request  --record-->  ReferenceGraph   (dependency → origin pages)
//! /_has_update --subscribe--> SessionRegistry (origin page → sessions)
//! FsEvent  --apply-->  invalidate  --notify/cleanup-->  SessionRegistry
//! ```
//!
//! # Modules
//!
//! - `event` - Watcher events and editor swap-file normalization
//! - `graph` - Reference graph
//! - `registry` - Open notification sessions
//! - `invalidate` - Event → affected pages → notifications

pub mod event;
pub mod graph;
pub mod invalidate;
pub mod registry;

pub use event::{FsEvent, FsEventKind};
pub use graph::ReferenceGraph;
pub use registry::{EventSink, SessionRegistry};
