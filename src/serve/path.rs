//! URL to filesystem path resolution.
//!
//! Confinement is a canonical-prefix comparison done after decoding and
//! segment collapsing ([`UrlPath::from_browser`]), never a substring match on
//! `..`. Anything that would leave the root is reported as "no path", which
//! the dispatcher turns into a plain 404.

use std::path::{Path, PathBuf};

use crate::core::UrlPath;

/// Join a normalized URL onto the root without touching the filesystem.
///
/// `UrlPath` segments never contain `/`, `.` or `..`, so the result always
/// stays under `root`.
pub fn join(root: &Path, url: &UrlPath) -> PathBuf {
    let mut path = root.to_path_buf();
    path.extend(url.segments());
    path
}

/// Resolve `url` to an absolute path confined to `root` (already canonical).
///
/// If the target exists, its canonical form must also live under `root`; this
/// rejects symlinks that point outside. Missing targets resolve lexically so
/// that not-yet-created files still have an identity.
pub fn resolve(root: &Path, url: &UrlPath) -> Option<PathBuf> {
    let path = join(root, url);
    if !path.starts_with(root) {
        return None;
    }

    match path.canonicalize() {
        Ok(canonical) if !canonical.starts_with(root) => None,
        _ => Some(path),
    }
}
