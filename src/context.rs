//! Shared server context.
//!
//! One [`ServeContext`] is built at startup and handed (as `Arc`) to every
//! request handler and to the watch actor. Each index has its own lock and
//! every mutation finishes inside a single lock scope; no lock is held while
//! file content is read or written to a socket.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::{Mutex, RwLock};

use crate::core::UrlPath;
use crate::index::{KnownFiles, MimeCache};
use crate::reload::{ReferenceGraph, SessionRegistry};
use crate::serve::path;

pub struct ServeContext {
    /// Served root, canonicalized once
    root: PathBuf,
    /// Index document name appended to directory URLs
    index: String,
    pub known: RwLock<KnownFiles>,
    pub mime: MimeCache,
    pub graph: RwLock<ReferenceGraph>,
    pub sessions: Mutex<SessionRegistry>,
}

impl ServeContext {
    /// Canonicalize `root`, scan it and warm the MIME cache.
    pub fn new(root: &Path, index: &str) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("cannot open served root `{}`", root.display()))?;

        let known = KnownFiles::scan(&root);
        let mime = MimeCache::new();
        mime.prime(known.iter());

        crate::debug!("index"; "{} files under {}", known.len(), root.display());

        Ok(Self {
            root,
            index: index.to_string(),
            known: RwLock::new(known),
            mime,
            graph: RwLock::new(ReferenceGraph::new()),
            sessions: Mutex::new(SessionRegistry::new()),
        })
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Parse a raw request target into a [`UrlPath`].
    pub fn url(&self, target: &str) -> Option<UrlPath> {
        UrlPath::from_browser(target, &self.index)
    }

    /// Resolve a URL to a confined on-disk path (see [`path::resolve`]).
    pub fn resolve(&self, url: &UrlPath) -> Option<PathBuf> {
        path::resolve(&self.root, url)
    }

    /// Whether `path` is currently believed to exist.
    pub fn exists(&self, path: &Path) -> bool {
        self.known.read().contains(path)
    }

    /// Record that `origin` requested `dependency`.
    pub fn record_reference(&self, dependency: &Path, origin: UrlPath) {
        if self.graph.write().record(dependency, origin.clone()) {
            crate::debug!("graph"; "{} <- {}", self.display(dependency), origin);
        }
    }

    /// Root-relative display form of a resolved path, for logs.
    pub fn display<'a>(&self, path: &'a Path) -> std::path::Display<'a> {
        path.strip_prefix(&self.root).unwrap_or(path).display()
    }
}
