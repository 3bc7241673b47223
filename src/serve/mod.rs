//! Development server with live reload support.
//!
//! ```text
//! request ─┬─ shutdown / non-GET ──────────────→ 503
//!          ├─ /_has_update ────────────────────→ sse::subscribe (stays open)
//!          └─ UrlPath → resolve → KnownFiles ──┬→ missing root index → placeholder
//!                                              ├→ missing / rejected → 404
//!                                              └→ MimeCache → record edge → respond_file
//! ```

mod error;
mod lifecycle;
pub mod path;
mod range;
mod response;
mod sse;


pub use error::DeliveryError;
pub use sse::UPDATE_ENDPOINT;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tiny_http::{Method, Request, Server};

use crate::config::ServeConfig;
use crate::context::ServeContext;
use crate::core::{SessionId, UrlPath, is_shutdown, register_server};
use crate::reload::registry;
use crate::{debug, log};

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    ctx: Arc<ServeContext>,
    workers: usize,
    watch: bool,
}

/// Bind the HTTP server without starting the request loop
pub fn bind_server(ctx: Arc<ServeContext>, config: &ServeConfig) -> Result<BoundServer> {
    let (server, addr) = lifecycle::bind_with_retry(config.interface, config.port)?;
    let server = Arc::new(server);
    register_server(Arc::clone(&server));

    log!("serve"; "http://{} (root: {})", addr, ctx.root().display());

    Ok(BoundServer {
        server,
        ctx,
        workers: config.workers,
        watch: config.watch,
    })
}

impl BoundServer {
    /// Start the watcher and the request loop (blocking until shutdown).
    pub fn run(self) -> Result<()> {
        let watcher = lifecycle::spawn_watcher(Arc::clone(&self.ctx), self.watch);
        run_request_loop(&self.server, &self.ctx, self.workers)?;

        let closed = registry::close_all(&self.ctx.sessions);
        if closed > 0 {
            debug!("session"; "closed {} open session(s)", closed);
        }
        let graph = self.ctx.graph.read();
        debug!("serve"; "{} files known, {} types cached, {} edges on {} files",
            self.ctx.known.read().len(), self.ctx.mime.len(), graph.edge_count(), graph.len());
        drop(graph);

        lifecycle::wait_for_shutdown(watcher);
        Ok(())
    }
}

fn run_request_loop(server: &Server, ctx: &Arc<ServeContext>, workers: usize) -> Result<()> {
    // Handlers never block on a subscription, so a small pool is enough
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("serve-{i}"))
        .build()
        .context("failed to create request thread pool")?;

    for request in server.incoming_requests() {
        let ctx = Arc::clone(ctx);
        pool.spawn(move || handle_request(request, &ctx));
    }
    Ok(())
}

/// Handle a single HTTP request
pub(crate) fn handle_request(request: Request, ctx: &ServeContext) {
    let id = SessionId::next();
    match dispatch(request, ctx, id) {
        Ok(()) => {}
        Err(DeliveryError::Read { path, source }) => {
            log!("error"; "{} cannot read {}: {}", id, ctx.display(&path), source);
        }
        Err(DeliveryError::Aborted(source)) => {
            debug!("serve"; "{} response aborted: {}", id, source);
        }
    }
}

fn dispatch(request: Request, ctx: &ServeContext, id: SessionId) -> Result<(), DeliveryError> {
    if is_shutdown() {
        return response::respond_unavailable(request).map_err(DeliveryError::Aborted);
    }

    if *request.method() != Method::Get || request.url().is_empty() {
        debug!("serve"; "{} {} {} -> 503", id, request.method(), request.url());
        return response::respond_unavailable(request).map_err(DeliveryError::Aborted);
    }

    let target = request.url().to_string();
    let url = ctx.url(&target);

    if let Some(endpoint) = url.as_ref().filter(|url| **url == UPDATE_ENDPOINT) {
        let origin = origin_of(&request, ctx.index()).unwrap_or_else(|| endpoint.clone());
        return sse::subscribe(request, ctx, id, origin).map_err(DeliveryError::Aborted);
    }

    let Some((url, path)) = url.and_then(|url| ctx.resolve(&url).map(|path| (url, path))) else {
        log!("guard"; "{} rejected {}", id, target);
        return response::respond_not_found(request).map_err(DeliveryError::Aborted);
    };

    if !ctx.exists(&path) {
        if url.is_root_index(ctx.index()) {
            // Creating the index later must reload whoever sees the placeholder
            record_edges(&request, ctx, &url, &path);
            debug!("serve"; "{} {} -> placeholder", id, url);
            return response::respond_placeholder(request, ctx.index(), ctx.root())
                .map_err(DeliveryError::Aborted);
        }
        debug!("serve"; "{} {} -> 404", id, url);
        return response::respond_not_found(request).map_err(DeliveryError::Aborted);
    }

    let content_type = ctx.mime.get(&path);
    record_edges(&request, ctx, &url, &path);
    debug!("serve"; "{} {} ({})", id, url, content_type);

    response::respond_file(request, &path, &content_type)
}

/// Record who depends on `path`.
///
/// The origin is the requesting page (`Referer`, else `Origin`), falling back
/// to the URL itself. HTML documents additionally depend on themselves, so a
/// page reached through a link still reloads when it is edited.
fn record_edges(request: &Request, ctx: &ServeContext, url: &UrlPath, path: &Path) {
    let origin = origin_of(request, ctx.index()).unwrap_or_else(|| url.clone());
    if url.is_html() && origin != *url {
        ctx.record_reference(path, url.clone());
    }
    ctx.record_reference(path, origin);
}

/// The page a request was made from.
fn origin_of(request: &Request, index: &str) -> Option<UrlPath> {
    ["Referer", "Origin"]
        .into_iter()
        .filter_map(|name| response::get_header(request, name))
        .find_map(|value| UrlPath::from_referer(&value, index))
}
