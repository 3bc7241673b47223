//! `/_has_update` subscription endpoint.
//!
//! The connection is taken over from tiny_http (`Request::into_writer`), the
//! event-stream head is written by hand, and the stream is parked in the
//! session registry. The worker thread returns immediately; the session stays
//! open until the invalidation engine sends its reload event, the heartbeat
//! finds it dead, or the server shuts down.
//!
//! HTTP/1.1 streams are chunked, so finishing one sends the last chunk and
//! the client sees the response end. The connection then goes back to
//! tiny_http, which closes it if the client asked for `Connection: close`.
//! HTTP/1.0 streams are unframed and end when the socket closes.

use std::io::{self, Write};

use tiny_http::{HTTPVersion, Request};

use super::response::get_header;
use crate::context::ServeContext;
use crate::core::{SessionId, UrlPath, is_watch_healthy};
use crate::debug;
use crate::reload::EventSink;

/// Request path of the subscription endpoint.
pub const UPDATE_ENDPOINT: &str = "/_has_update";

/// Chunk that ends an HTTP/1.1 chunked body.
const LAST_CHUNK: &[u8] = b"0\r\n\r\n";

/// Open a notification channel for `origin` and register it as `id`.
pub fn subscribe(request: Request, ctx: &ServeContext, id: SessionId, origin: UrlPath) -> io::Result<()> {
    let chunked = *request.http_version() >= HTTPVersion(1, 1);
    let close = get_header(&request, "Connection")
        .is_some_and(|value| value.to_ascii_lowercase().contains("close"));

    let mut stream = EventStream {
        writer: request.into_writer(),
        chunked,
    };
    stream.write_head(close)?;

    let mut sessions = ctx.sessions.lock();
    sessions.subscribe(id, origin.clone(), Box::new(stream));
    debug!("session"; "{} watching {} ({} open)", id, origin, sessions.len());
    if !is_watch_healthy() {
        debug!("session"; "watcher is down, {} will not be reloaded", origin);
    }
    Ok(())
}

/// Raw connection writer framed as a `text/event-stream` body.
struct EventStream {
    writer: Box<dyn Write + Send>,
    chunked: bool,
}

impl EventStream {
    fn write_head(&mut self, close: bool) -> io::Result<()> {
        let (version, framing) = if self.chunked {
            ("HTTP/1.1", "Transfer-Encoding: chunked\r\n")
        } else {
            ("HTTP/1.0", "")
        };
        let connection = if close || !self.chunked { "close" } else { "keep-alive" };

        write!(
            self.writer,
            "{version} 200 OK\r\n\
             Content-Type: text/event-stream\r\n\
             Cache-Control: no-cache\r\n\
             Connection: {connection}\r\n\
             {framing}\r\n"
        )?;
        self.writer.flush()
    }
}

impl EventSink for EventStream {
    fn send(&mut self, event: &[u8]) -> io::Result<()> {
        if self.chunked {
            write!(self.writer, "{:X}\r\n", event.len())?;
            self.writer.write_all(event)?;
            self.writer.write_all(b"\r\n")?;
        } else {
            self.writer.write_all(event)?;
        }
        self.writer.flush()
    }

    fn finish(&mut self) -> io::Result<()> {
        if self.chunked {
            self.writer.write_all(LAST_CHUNK)?;
        }
        self.writer.flush()
    }
}
