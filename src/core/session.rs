//! Per-request identifiers.

use std::sync::atomic::{AtomicU64, Ordering};

/// Next id to hand out. Starts at 1 so `0` never appears in logs.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, monotonically increasing id assigned to every accepted request.
///
/// Unique for the process lifetime and never reused. tiny_http hands out
/// requests, not connections, so a keep-alive connection gets one id per
/// request. A connection carries at most one open event stream at a time,
/// and notification sessions keep the id of the request that opened them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
