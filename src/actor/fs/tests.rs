use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use super::translate::translate;
use super::{handle_event, ping_sessions};
use crate::context::ServeContext;
use crate::core::{SessionId, UrlPath};
use crate::reload::registry::tests::Sink;
use crate::reload::{FsEvent, FsEventKind};

const ROOT: &str = "/srv/site";

fn make_event(paths: Vec<&str>, kind: notify::EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: paths.into_iter().map(PathBuf::from).collect(),
        attrs: Default::default(),
    }
}

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(
        notify::event::DataChange::Any,
    ))
}

fn create_kind() -> notify::EventKind {
    notify::EventKind::Create(notify::event::CreateKind::File)
}

fn remove_kind() -> notify::EventKind {
    notify::EventKind::Remove(notify::event::RemoveKind::File)
}

fn rename_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Name(
        notify::event::RenameMode::Both,
    ))
}

fn make_ctx() -> (TempDir, ServeContext) {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("index.html"), "<body></body>").unwrap();
    fs::write(temp.path().join("main.css"), "body {}").unwrap();
    let ctx = ServeContext::new(temp.path(), "index.html").unwrap();
    (temp, ctx)
}

fn url(s: &str) -> UrlPath {
    UrlPath::from_browser(s, "index.html").unwrap()
}

#[test]
fn test_translate_modify() {
    let events = translate(&make_event(vec!["/srv/site/main.css"], modify_kind()), Path::new(ROOT));
    assert_eq!(events, vec![FsEvent::new(FsEventKind::Modified, "main.css")]);
}

#[test]
fn test_translate_create_and_remove_are_renames() {
    let root = Path::new(ROOT);
    for kind in [create_kind(), remove_kind()] {
        let events = translate(&make_event(vec!["/srv/site/a/b.js"], kind), root);
        assert_eq!(events, vec![FsEvent::new(FsEventKind::Renamed, "a/b.js")]);
    }
}

#[test]
fn test_translate_rename_both_paths() {
    let events = translate(
        &make_event(vec!["/srv/site/old.css", "/srv/site/new.css"], rename_kind()),
        Path::new(ROOT),
    );
    assert_eq!(
        events,
        vec![
            FsEvent::new(FsEventKind::Renamed, "old.css"),
            FsEvent::new(FsEventKind::Renamed, "new.css"),
        ]
    );
}

#[test]
fn test_translate_skips_metadata_and_access() {
    let root = Path::new(ROOT);
    let metadata = notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
        notify::event::MetadataKind::Any,
    ));
    let access = notify::EventKind::Access(notify::event::AccessKind::Any);

    assert!(translate(&make_event(vec!["/srv/site/a.css"], metadata), root).is_empty());
    assert!(translate(&make_event(vec!["/srv/site/a.css"], access), root).is_empty());
}

#[test]
fn test_translate_skips_outside_root() {
    let events = translate(
        &make_event(vec!["/etc/passwd", "/srv/site", "/srv/site/ok.js"], modify_kind()),
        Path::new(ROOT),
    );
    assert_eq!(events, vec![FsEvent::new(FsEventKind::Modified, "ok.js")]);
}

#[test]
fn test_handle_event_reloads_viewer() {
    let (_temp, ctx) = make_ctx();
    let css = ctx.root().join("main.css");
    ctx.record_reference(&css, url("/index.html"));

    let sink = Sink::default();
    ctx.sessions
        .lock()
        .subscribe(SessionId::next(), url("/index.html"), Box::new(sink.clone()));

    let event = make_event(vec![css.to_str().unwrap()], modify_kind());
    handle_event(&ctx, &event);

    assert!(sink.text().contains("data: 'reload'"));
    assert!(ctx.sessions.lock().is_empty());
}

#[test]
fn test_handle_event_tracks_created_file() {
    let (_temp, ctx) = make_ctx();
    let created = ctx.root().join("new.js");
    assert!(!ctx.exists(&created));

    fs::write(&created, "export {}").unwrap();
    handle_event(&ctx, &make_event(vec![created.to_str().unwrap()], create_kind()));
    assert!(ctx.exists(&created));

    fs::remove_file(&created).unwrap();
    handle_event(&ctx, &make_event(vec![created.to_str().unwrap()], remove_kind()));
    assert!(!ctx.exists(&created));
}

#[test]
fn test_ping_sessions_keeps_live_ones() {
    let (_temp, ctx) = make_ctx();
    let sink = Sink::default();
    let id = SessionId::next();
    ctx.sessions
        .lock()
        .subscribe(id, url("/"), Box::new(sink.clone()));

    ping_sessions(&ctx);

    assert!(ctx.sessions.lock().contains(id));
    assert!(sink.text().contains(": ping"));
}

#[test]
fn test_actor_new_watches_root() {
    let (_temp, ctx) = make_ctx();
    assert!(super::FsActor::new(Arc::new(ctx)).is_ok());
}
