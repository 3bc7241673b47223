//! Memoized content types.
//!
//! A path's content type is computed at most once per process and assumed
//! stable afterwards, so the cache is never invalidated.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

use crate::utils::mime;

#[derive(Debug, Default)]
pub struct MimeCache {
    types: DashMap<PathBuf, Arc<str>>,
}

impl MimeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content type for `path`, computing and caching it on first use.
    pub fn get(&self, path: &Path) -> Arc<str> {
        if let Some(cached) = self.types.get(path) {
            return Arc::clone(&cached);
        }
        let detected = Self::detect(path);
        // A racing caller may have inserted first; keep whichever landed
        Arc::clone(&self.types.entry(path.to_path_buf()).or_insert(detected))
    }

    /// Warm the cache for paths found at startup.
    ///
    /// Only table lookups are warmed here. Sniffing spawns a process per file
    /// and is left to the first request.
    pub fn prime<'a>(&self, paths: impl IntoIterator<Item = &'a Path>) {
        for path in paths {
            if let Some(mime) = mime::from_path(path) {
                self.types.entry(path.to_path_buf()).or_insert_with(|| Arc::from(mime));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    fn detect(path: &Path) -> Arc<str> {
        if let Some(mime) = mime::from_path(path) {
            return Arc::from(mime);
        }
        match mime::sniff(path) {
            Some(sniffed) => Arc::from(sniffed),
            None => Arc::from(mime::types::OCTET_STREAM),
        }
    }
}
