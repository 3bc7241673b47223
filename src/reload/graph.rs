//! Reference graph: which documents pulled in which files.
//!
//! Every successful content request records an edge from the resolved path
//! that was served to the page that asked for it (its `Referer`, or the
//! request's own URL). Edges are never pruned; the set makes re-recording
//! idempotent.

use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::UrlPath;

type UrlSet = FxHashSet<UrlPath>;

/// Dependency (resolved path) → origin documents (URL paths).
///
/// # Invariants
/// - Keys are resolved paths confined to the served root
/// - No empty sets are stored
#[derive(Debug, Default)]
pub struct ReferenceGraph {
    referers: FxHashMap<PathBuf, UrlSet>,
}

impl ReferenceGraph {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `origin` requested `dependency`.
    ///
    /// Returns `true` if the edge is new. Self-edges (a page's own request)
    /// are kept: they are how a page learns about changes to itself.
    pub fn record(&mut self, dependency: &Path, origin: UrlPath) -> bool {
        match self.referers.get_mut(dependency) {
            Some(set) => set.insert(origin),
            None => {
                let mut set = UrlSet::default();
                set.insert(origin);
                self.referers.insert(dependency.to_path_buf(), set);
                true
            }
        }
    }

    /// Every origin that ever referenced `dependency`.
    #[inline]
    pub fn referers(&self, dependency: &Path) -> Option<&UrlSet> {
        self.referers.get(dependency)
    }

    /// Owned copy of [`Self::referers`], empty when unknown.
    pub fn referers_of(&self, dependency: &Path) -> Vec<UrlPath> {
        self.referers(dependency)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of tracked dependencies (for debugging).
    #[inline]
    pub fn len(&self) -> usize {
        self.referers.len()
    }

    /// Number of edges (for debugging).
    pub fn edge_count(&self) -> usize {
        self.referers.values().map(FxHashSet::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> UrlPath {
        UrlPath::from_browser(s, "index.html").unwrap()
    }

    #[test]
    fn test_record_and_lookup() {
        let mut graph = ReferenceGraph::new();
        let css = Path::new("/srv/main.css");

        assert!(graph.record(css, url("/index.html")));
        assert!(graph.record(css, url("/about.html")));

        let mut origins = graph.referers_of(css);
        origins.sort();
        assert_eq!(origins, vec![url("/about.html"), url("/index.html")]);
    }

    #[test]
    fn test_record_is_idempotent() {
        let mut graph = ReferenceGraph::new();
        let css = Path::new("/srv/main.css");

        assert!(graph.record(css, url("/index.html")));
        assert!(!graph.record(css, url("/index.html")));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_self_edge() {
        let mut graph = ReferenceGraph::new();
        let page = Path::new("/srv/index.html");

        graph.record(page, url("/index.html"));
        assert!(graph.referers(page).unwrap().contains("/index.html"));
    }

    #[test]
    fn test_unknown_dependency() {
        let graph = ReferenceGraph::new();
        assert!(graph.referers(Path::new("/srv/nope.js")).is_none());
        assert!(graph.referers_of(Path::new("/srv/nope.js")).is_empty());
    }
}
