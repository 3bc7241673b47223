//! What exists on disk, and what it is.
//!
//! - [`KnownFiles`]: set of resolved paths believed to exist
//! - [`MimeCache`]: resolved path → content type, filled lazily, never evicted

mod known;
mod mime;

pub use known::KnownFiles;
pub use mime::MimeCache;
