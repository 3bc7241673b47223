//! Known-files index.
//!
//! Seeded once by a recursive scan of the served root, then kept current by
//! the invalidation engine. Membership is the server's belief about on-disk
//! existence; it may lag an external mutation until the watch event lands.

use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use rustc_hash::FxHashSet;

/// Files that never count as served content
const IGNORED_FILES: &[&str] = &[".DS_Store"];

#[derive(Debug, Default)]
pub struct KnownFiles {
    paths: FxHashSet<PathBuf>,
}

impl KnownFiles {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recursively collect every regular file under `root` (canonical).
    ///
    /// Symlinks are followed and indexed under their link path, except links
    /// whose target leaves the root (never served, so never walked) and links
    /// back to an enclosing directory.
    pub fn scan(root: &Path) -> Self {
        let confine = root.to_path_buf();
        let paths = WalkDir::new(root)
            .skip_hidden(false)
            .follow_links(true)
            .process_read_dir(move |_, dir, _, children| {
                let dir = dir.canonicalize().ok();
                children.retain(|child| match child {
                    Ok(entry) if entry.path_is_symlink() => {
                        entry.path().canonicalize().is_ok_and(|target| {
                            // A link to an enclosing directory is a loop
                            let is_ancestor = dir.as_ref().is_some_and(|dir| dir.starts_with(&target));
                            target.starts_with(&confine) && !is_ancestor
                        })
                    }
                    _ => true,
                });
            })
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                let name = e.file_name().to_str().unwrap_or_default();
                !IGNORED_FILES.contains(&name)
            })
            .map(|e| e.path())
            .collect();
        Self { paths }
    }

    #[inline]
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Mark present. Returns `true` if it was previously absent.
    pub fn insert(&mut self, path: PathBuf) -> bool {
        self.paths.insert(path)
    }

    /// Mark absent. Returns `true` if it was previously present.
    pub fn remove(&mut self, path: &Path) -> bool {
        self.paths.remove(path)
    }

    /// Flip membership (present → absent, absent → present).
    ///
    /// Returns the new membership.
    pub fn toggle(&mut self, path: &Path) -> bool {
        if self.paths.remove(path) {
            false
        } else {
            self.paths.insert(path.to_path_buf());
            true
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_collects_nested_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("css/vendor")).unwrap();
        fs::write(root.join("index.html"), "<h1>hi</h1>").unwrap();
        fs::write(root.join("css/main.css"), "body{}").unwrap();
        fs::write(root.join("css/vendor/reset.css"), "*{}").unwrap();
        fs::write(root.join(".DS_Store"), "").unwrap();

        let known = KnownFiles::scan(root);

        assert_eq!(known.len(), 3);
        assert!(known.contains(&root.join("index.html")));
        assert!(known.contains(&root.join("css/vendor/reset.css")));
        // Directories are never members
        assert!(!known.contains(&root.join("css")));
        assert!(!known.contains(&root.join(".DS_Store")));
    }

    #[test]
    fn test_scan_includes_dotfiles() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".well-known"), "x").unwrap();

        let known = KnownFiles::scan(dir.path());
        assert!(known.contains(&dir.path().join(".well-known")));
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_follows_links_inside_root() {
        use std::os::unix::fs::symlink;

        let outer = TempDir::new().unwrap();
        let outer_root = outer.path().canonicalize().unwrap();
        fs::write(outer_root.join("secret.txt"), "x").unwrap();
        let root = outer_root.join("site");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("sub/page.html"), "").unwrap();
        fs::write(root.join("main.css"), "").unwrap();
        symlink(root.join("sub"), root.join("alias")).unwrap();
        symlink(root.join("main.css"), root.join("link.css")).unwrap();
        symlink(&outer_root, root.join("escape")).unwrap();
        symlink(&root, root.join("sub/loop")).unwrap();
        symlink("..", root.join("sub/up")).unwrap();

        let known = KnownFiles::scan(&root);

        assert!(known.contains(&root.join("alias/page.html")));
        assert!(known.contains(&root.join("link.css")));
        assert!(!known.contains(&root.join("escape/secret.txt")));
        assert!(!known.contains(&root.join("sub/loop/main.css")));
        assert!(!known.contains(&root.join("sub/up/main.css")));
    }

    #[test]
    fn test_toggle() {
        let mut known = KnownFiles::new();
        let path = Path::new("/srv/a.css");

        assert!(known.toggle(path));
        assert!(known.contains(path));
        assert!(!known.toggle(path));
        assert!(!known.contains(path));
    }

    #[test]
    fn test_insert_remove() {
        let mut known = KnownFiles::new();
        assert!(known.insert(PathBuf::from("/srv/a.js")));
        assert!(!known.insert(PathBuf::from("/srv/a.js")));
        assert!(known.remove(Path::new("/srv/a.js")));
        assert!(!known.remove(Path::new("/srv/a.js")));
        assert_eq!(known.iter().count(), 0);
    }
}
