//! URL path type for type-safe URL handling.
//!
//! - Internal representation: decoded exactly once, segments collapsed
//! - Directory URLs carry the index document name (`/sub/` → `/sub/index.html`)
//! - Browser boundary: request targets and `Referer` values go through
//!   [`UrlPath::from_browser`] / [`UrlPath::from_referer`]

use std::borrow::Borrow;
use std::sync::Arc;

use percent_encoding::percent_decode_str;

/// Canonical request path, the key for "what is this browser tab watching".
///
/// Invariants:
/// - Always starts with `/`
/// - Contains no `.`, `..` or empty segments
/// - Never names a directory: trailing `/` has been replaced by the index name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UrlPath(Arc<str>);

impl UrlPath {
    /// Create from a raw request target.
    ///
    /// Strips query and fragment, percent-decodes once (the decoded text is
    /// never decoded again), collapses `.`/`..`/repeated slashes and appends
    /// `index` to directory paths.
    ///
    /// Returns `None` when the path climbs above the root, is not valid
    /// UTF-8 once decoded, or contains NUL or a backslash.
    pub fn from_browser(target: &str, index: &str) -> Option<Self> {
        let path = target.split(['?', '#']).next().unwrap_or(target);
        let decoded = percent_decode_str(path).decode_utf8().ok()?;

        if decoded.contains(['\0', '\\']) {
            return None;
        }

        let mut segments: Vec<&str> = Vec::new();
        for segment in decoded.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    // Climbing above the root is never resolvable
                    segments.pop()?;
                }
                s => segments.push(s),
            }
        }

        // The last raw segment decides whether this names a directory
        let names_dir = matches!(decoded.rsplit('/').next(), Some("" | "." | ".."));
        if names_dir {
            segments.push(index);
        }

        Some(Self(Arc::from(format!("/{}", segments.join("/")))))
    }

    /// Create from a `Referer` (or `Origin`) header value.
    ///
    /// Accepts absolute URLs (`http://localhost:8000/index.html`) as well as
    /// bare paths; only the path component is kept.
    pub fn from_referer(value: &str, index: &str) -> Option<Self> {
        let value = value.trim();
        match url::Url::parse(value) {
            Ok(parsed) if parsed.has_host() => Self::from_browser(parsed.path(), index),
            _ => Self::from_browser(value, index),
        }
    }

    /// Path segments below the root, in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Whether this URL names an HTML document (by extension).
    pub fn is_html(&self) -> bool {
        let name = self.0.rsplit('/').next().unwrap_or_default();
        let ext = name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default();
        ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm")
    }

    /// Whether this is the served root's index document (`/index.html`).
    pub fn is_root_index(&self, index: &str) -> bool {
        self.0.strip_prefix('/') == Some(index)
    }
}

impl std::fmt::Display for UrlPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UrlPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for UrlPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for UrlPath {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for UrlPath {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

// =============================================================================
// Tests
// =============================================================================
