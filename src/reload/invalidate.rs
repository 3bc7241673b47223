//! Invalidation engine.
//!
//! Turns one filesystem event into the minimal set of reload notifications:
//!
//! ```text
//! FsEvent → normalize swap names → update KnownFiles
//!         → referers(changed) → expand through non-HTML referers
//!         → subscribers(affected) → notify → cleanup
//! ```

use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use super::event::{FsEvent, FsEventKind};
use super::graph::ReferenceGraph;
use super::registry::Channel;
use crate::context::ServeContext;
use crate::core::{SessionId, UrlPath};
use crate::serve::path;
use crate::{debug, log};

/// What a single event did, for logging and tests.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Invalidation {
    /// Origin documents whose view depends on the changed file
    pub affected: Vec<UrlPath>,
    /// Sessions that received the reload event
    pub notified: Vec<SessionId>,
}

/// Process one raw event against the shared context.
///
/// Events about paths nobody referenced are the common case and are ignored
/// after the index update.
pub fn apply(ctx: &ServeContext, event: FsEvent) -> Invalidation {
    let Some(event) = event.normalize() else {
        return Invalidation::default();
    };

    let Some(changed) = confine(ctx.root(), &event.path) else {
        debug!("watch"; "ignoring event outside root: {}", event.path.display());
        return Invalidation::default();
    };

    update_index(ctx, event.kind, &changed);

    let affected = {
        let graph = ctx.graph.read();
        affected_origins(&graph, ctx.root(), &changed)
    };
    if affected.is_empty() {
        debug!("watch"; "{} {} (no viewers)", event.kind.label(), event.path.display());
        return Invalidation::default();
    }

    let channels = {
        let mut sessions = ctx.sessions.lock();
        let ids = sessions.subscribers(&affected);
        let channels: Vec<Channel> = ids.iter().filter_map(|id| sessions.notify(*id)).collect();
        sessions.cleanup(&ids);
        channels
    };
    // Written after the registry lock is released
    let notified: Vec<SessionId> = channels
        .iter()
        .filter(|channel| channel.reload())
        .map(Channel::id)
        .collect();

    if !notified.is_empty() {
        log!("reload"; "{} {}, reloading {} page(s)",
            event.path.display(), event.kind.label(), notified.len());
    }

    Invalidation { affected, notified }
}

/// Bring the known-files index in line with the event.
///
/// - `Renamed` toggles membership. When the toggled belief contradicts what
///   is on disk (coalesced events, swap-file redirects), disk wins.
/// - `Modified` marks the path present unless it is a directory.
fn update_index(ctx: &ServeContext, kind: FsEventKind, changed: &Path) {
    let mut known = ctx.known.write();
    match kind {
        FsEventKind::Renamed => {
            let believed = known.toggle(changed);
            let on_disk = changed.is_file();
            if believed != on_disk {
                if on_disk {
                    known.insert(changed.to_path_buf());
                } else {
                    known.remove(changed);
                }
            }
        }
        FsEventKind::Modified => {
            if !changed.is_dir() {
                known.insert(changed.to_path_buf());
            }
        }
    }
}

/// Every origin URL that (transitively) referenced `changed`.
///
/// HTML origins are leaves. Any other origin (a stylesheet importing another,
/// a script loading a module) is resolved back to its file and its own
/// referers are added. Each resolved path is expanded at most once, which
/// also terminates reference cycles.
pub fn affected_origins(graph: &ReferenceGraph, root: &Path, changed: &Path) -> Vec<UrlPath> {
    let mut affected: FxHashSet<UrlPath> = graph.referers_of(changed).into_iter().collect();
    let mut visited: FxHashSet<PathBuf> = FxHashSet::default();
    visited.insert(changed.to_path_buf());

    let mut pending: Vec<UrlPath> = affected.iter().cloned().collect();
    while let Some(url) = pending.pop() {
        if url.is_html() {
            continue;
        }
        let resolved = path::join(root, &url);
        if !visited.insert(resolved.clone()) {
            continue;
        }
        for origin in graph.referers(&resolved).into_iter().flatten() {
            if affected.insert(origin.clone()) {
                pending.push(origin.clone());
            }
        }
    }

    let mut affected: Vec<UrlPath> = affected.into_iter().collect();
    affected.sort();
    affected
}

/// Join a watcher-relative path onto the root, rejecting anything that climbs out.
fn confine(root: &Path, relative: &Path) -> Option<PathBuf> {
    use std::path::Component;

    let mut path = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(path)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reload::registry::tests::Sink;
    use std::fs;
    use tempfile::TempDir;

    fn url(s: &str) -> UrlPath {
        UrlPath::from_browser(s, "index.html").unwrap()
    }

    fn setup(files: &[(&str, &str)]) -> (TempDir, ServeContext) {
        let dir = TempDir::new().unwrap();
        for (name, body) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        let ctx = ServeContext::new(dir.path(), "index.html").unwrap();
        (dir, ctx)
    }

    fn subscribe(ctx: &ServeContext, origin: &str) -> (SessionId, Sink) {
        let id = SessionId::next();
        let sink = Sink::default();
        ctx.sessions.lock().subscribe(id, url(origin), Box::new(sink.clone()));
        (id, sink)
    }

    fn modified(path: &str) -> FsEvent {
        FsEvent::new(FsEventKind::Modified, path)
    }

    #[test]
    fn test_stylesheet_change_notifies_only_its_page() {
        let (_dir, ctx) = setup(&[
            ("index.html", "<link href=main.css>"),
            ("about.html", "<p>about</p>"),
            ("main.css", "body{}"),
        ]);
        let css = ctx.root().join("main.css");
        ctx.record_reference(&ctx.root().join("index.html"), url("/index.html"));
        ctx.record_reference(&css, url("/index.html"));
        ctx.record_reference(&ctx.root().join("about.html"), url("/about.html"));

        let (index_session, sink) = subscribe(&ctx, "/index.html");
        let (about_session, _) = subscribe(&ctx, "/about.html");

        let result = apply(&ctx, modified("main.css"));

        assert_eq!(result.affected, vec![url("/index.html")]);
        assert_eq!(result.notified, vec![index_session]);
        assert_eq!(sink.text(), "data: 'reload'\n\n");
        assert!(sink.is_finished());

        let sessions = ctx.sessions.lock();
        assert!(!sessions.contains(index_session));
        assert!(!sessions.is_grouped(index_session));
        assert!(sessions.contains(about_session));
    }

    #[test]
    fn test_unreferenced_change_notifies_nobody() {
        let (_dir, ctx) = setup(&[("index.html", ""), ("unused.css", "")]);
        ctx.record_reference(&ctx.root().join("index.html"), url("/index.html"));
        let (id, sink) = subscribe(&ctx, "/index.html");

        let result = apply(&ctx, modified("unused.css"));

        assert_eq!(result, Invalidation::default());
        assert!(ctx.sessions.lock().contains(id));
        assert!(sink.text().is_empty());
    }

    #[test]
    fn test_session_notified_once() {
        let (_dir, ctx) = setup(&[("index.html", "")]);
        ctx.record_reference(&ctx.root().join("index.html"), url("/index.html"));
        let (id, sink) = subscribe(&ctx, "/index.html");

        assert_eq!(apply(&ctx, modified("index.html")).notified, vec![id]);
        assert!(apply(&ctx, modified("index.html")).notified.is_empty());
        assert_eq!(sink.text().matches("reload").count(), 1);
    }

    #[test]
    fn test_transitive_expansion() {
        // index.html -> theme.css -> fonts.css (via @import)
        let (_dir, ctx) = setup(&[
            ("index.html", ""),
            ("theme.css", "@import 'fonts.css';"),
            ("fonts.css", ""),
        ]);
        ctx.record_reference(&ctx.root().join("theme.css"), url("/index.html"));
        ctx.record_reference(&ctx.root().join("fonts.css"), url("/theme.css"));
        let (id, _) = subscribe(&ctx, "/index.html");

        let result = apply(&ctx, modified("fonts.css"));

        assert_eq!(result.affected, vec![url("/index.html"), url("/theme.css")]);
        assert_eq!(result.notified, vec![id]);
    }

    #[test]
    fn test_expansion_survives_cycles() {
        let mut graph = ReferenceGraph::new();
        let root = Path::new("/srv");
        graph.record(Path::new("/srv/a.js"), url("/b.js"));
        graph.record(Path::new("/srv/b.js"), url("/a.js"));
        graph.record(Path::new("/srv/b.js"), url("/index.html"));

        let affected = affected_origins(&graph, root, Path::new("/srv/a.js"));
        assert_eq!(affected, vec![url("/a.js"), url("/b.js"), url("/index.html")]);
    }

    #[test]
    fn test_expansion_visits_each_referer_path() {
        // Two scripts share one module; both must be expanded, not just the
        // first one seen
        let mut graph = ReferenceGraph::new();
        let root = Path::new("/srv");
        graph.record(Path::new("/srv/util.js"), url("/a.js"));
        graph.record(Path::new("/srv/util.js"), url("/b.js"));
        graph.record(Path::new("/srv/a.js"), url("/one.html"));
        graph.record(Path::new("/srv/b.js"), url("/two.html"));

        let affected = affected_origins(&graph, root, Path::new("/srv/util.js"));
        assert!(affected.contains(&url("/one.html")));
        assert!(affected.contains(&url("/two.html")));
    }

    #[test]
    fn test_renamed_toggles_membership() {
        let (dir, ctx) = setup(&[("index.html", "")]);
        let created = ctx.root().join("new.css");

        fs::write(&created, "").unwrap();
        apply(&ctx, FsEvent::new(FsEventKind::Renamed, "new.css"));
        assert!(ctx.exists(&created));

        fs::remove_file(&created).unwrap();
        apply(&ctx, FsEvent::new(FsEventKind::Renamed, "new.css"));
        assert!(!ctx.exists(&created));
        drop(dir);
    }

    #[test]
    fn test_renamed_converges_to_disk() {
        let (_dir, ctx) = setup(&[("index.html", "")]);
        let page = ctx.root().join("index.html");

        // A coalesced delete+create arrives as one rename; the file is still there
        apply(&ctx, FsEvent::new(FsEventKind::Renamed, "index.html"));
        assert!(ctx.exists(&page));
    }

    #[test]
    fn test_modified_marks_present() {
        let (_dir, ctx) = setup(&[]);
        let page = ctx.root().join("late.html");
        fs::write(&page, "").unwrap();

        apply(&ctx, modified("late.html"));
        assert!(ctx.exists(&page));
    }

    #[test]
    fn test_swap_file_write_is_ignored() {
        let (_dir, ctx) = setup(&[("index.html", "")]);
        ctx.record_reference(&ctx.root().join("index.html"), url("/index.html"));
        let (id, _) = subscribe(&ctx, "/index.html");

        let result = apply(&ctx, modified(".index.html.swp"));

        assert!(result.notified.is_empty());
        assert!(ctx.sessions.lock().contains(id));
        assert!(!ctx.exists(&ctx.root().join(".index.html.swp")));
    }

    #[test]
    fn test_swap_rename_targets_real_file() {
        let (_dir, ctx) = setup(&[("index.html", "")]);
        ctx.record_reference(&ctx.root().join("index.html"), url("/index.html"));
        let (id, _) = subscribe(&ctx, "/index.html");

        let result = apply(&ctx, FsEvent::new(FsEventKind::Renamed, "index.html~"));

        assert_eq!(result.notified, vec![id]);
        assert!(ctx.exists(&ctx.root().join("index.html")));
    }

    #[test]
    fn test_confine_rejects_escape() {
        let root = Path::new("/srv");
        assert_eq!(confine(root, Path::new("a/b.css")), Some(PathBuf::from("/srv/a/b.css")));
        assert_eq!(confine(root, Path::new("../etc/passwd")), None);
        assert_eq!(confine(root, Path::new("/etc/passwd")), None);
    }
}
