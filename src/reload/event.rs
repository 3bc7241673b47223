//! Filesystem change events as the invalidation engine sees them.

use std::path::PathBuf;

/// What the watcher reported.
///
/// `Renamed` conflates creation and deletion (and both halves of a move);
/// `Modified` means the contents were written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Renamed,
    Modified,
}

impl FsEventKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Renamed => "renamed",
            Self::Modified => "modified",
        }
    }
}

/// A change event with a path relative to the served root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub kind: FsEventKind,
    pub path: PathBuf,
}

impl FsEvent {
    pub fn new(kind: FsEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// Undo editor swap-file naming.
    ///
    /// - writes to a swap file are dropped (`None`)
    /// - a rename of a swap file is reported against the real file name
    /// - vim's `4913` write-test file is always dropped
    pub fn normalize(self) -> Option<Self> {
        let name = self.path.file_name()?.to_str()?;
        if name == "4913" {
            return None;
        }

        let Some(target) = swap_target(name) else {
            return Some(self);
        };

        match self.kind {
            FsEventKind::Modified => None,
            FsEventKind::Renamed => {
                let path = self.path.with_file_name(target);
                Some(Self::new(FsEventKind::Renamed, path))
            }
        }
    }
}

/// Real file name behind an editor swap/backup name, if `name` is one.
///
/// - `main.css~` → `main.css`
/// - `.main.css.swp` / `.swo` / `.swx` → `main.css`
/// - `main.css___jb_tmp___` / `main.css___jb_old___` → `main.css`
pub fn swap_target(name: &str) -> Option<&str> {
    if let Some(base) = name.strip_suffix('~') {
        return (!base.is_empty()).then_some(base);
    }

    for suffix in ["___jb_tmp___", "___jb_old___"] {
        if let Some(base) = name.strip_suffix(suffix) {
            return (!base.is_empty()).then_some(base);
        }
    }

    let hidden = name.strip_prefix('.')?;
    for suffix in [".swp", ".swo", ".swx"] {
        if let Some(base) = hidden.strip_suffix(suffix) {
            return (!base.is_empty()).then_some(base);
        }
    }
    None
}
