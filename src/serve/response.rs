//! HTTP response handlers.
//!
//! File delivery picks one strategy per content type:
//!
//! | Strategy | Content types   | Body                                        |
//! |----------|-----------------|---------------------------------------------|
//! | Image    | `image/*`       | whole file buffered, short cache directive  |
//! | Video    | `video/*`       | whole file, or one ≤1 MB slice for `Range`  |
//! | Stream   | everything else | chunked, Brotli when accepted; HTML gets the live-reload script |

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use tiny_http::{Header, Request, Response, StatusCode};

use super::error::DeliveryError;
use super::range::{self, ByteRange, Unsatisfiable};
use crate::embed::serve::{LIVERELOAD_SCRIPT, PLACEHOLDER_HTML, PlaceholderVars};
use crate::utils::{html, mime};

/// Client-side cache lifetime for images.
const IMAGE_CACHE_CONTROL: &str = "public, max-age=10";

/// Brotli settings: fast enough for on-the-fly dev serving.
const BROTLI_BUFFER: usize = 4096;
const BROTLI_QUALITY: u32 = 5;
const BROTLI_LGWIN: u32 = 22;

/// How a file is put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Image,
    Video,
    Stream,
}

impl Strategy {
    pub fn for_mime(mime: &str) -> Self {
        if mime::is_image(mime) {
            Self::Image
        } else if mime::is_video(mime) {
            Self::Video
        } else {
            Self::Stream
        }
    }
}

/// Respond with a file believed to exist.
///
/// Existence is re-checked by opening the file: if it vanished since the
/// index lookup, the answer is 404.
pub fn respond_file(request: Request, path: &Path, content_type: &str) -> Result<(), DeliveryError> {
    let opened = File::open(path).and_then(|file| {
        let meta = file.metadata()?;
        Ok((file, meta))
    });

    let (file, size) = match opened {
        Ok((file, meta)) if !meta.is_dir() => (file, meta.len()),
        // Vanished (or became a directory) since the index lookup
        Ok(_) => return respond_not_found(request).map_err(DeliveryError::Aborted),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return respond_not_found(request).map_err(DeliveryError::Aborted);
        }
        Err(e) => return fail(request, path, e),
    };

    match Strategy::for_mime(content_type) {
        Strategy::Image => respond_image(request, path, file, size, content_type),
        Strategy::Video => respond_video(request, path, file, size, content_type),
        Strategy::Stream => respond_stream(request, path, file, content_type),
    }
}

/// Whole-buffer image response.
fn respond_image(
    request: Request,
    path: &Path,
    mut file: File,
    size: u64,
    content_type: &str,
) -> Result<(), DeliveryError> {
    let mut body = Vec::with_capacity(usize::try_from(size).unwrap_or_default());
    if let Err(e) = file.read_to_end(&mut body) {
        return fail(request, path, e);
    }

    let response = Response::from_data(body)
        .with_chunked_threshold(usize::MAX)
        .with_header(make_header("Content-Type", content_type))
        .with_header(make_header("Cache-Control", IMAGE_CACHE_CONTROL));
    request.respond(response).map_err(DeliveryError::Aborted)
}

/// Video response, honoring `Range` (video/audio seeking).
fn respond_video(
    request: Request,
    path: &Path,
    mut file: File,
    size: u64,
    content_type: &str,
) -> Result<(), DeliveryError> {
    let requested = get_header(&request, "Range").map(|value| range::parse(&value, size));

    let range: ByteRange = match requested {
        None | Some(Ok(None)) => {
            let response = Response::new(
                StatusCode(200),
                vec![
                    make_header("Content-Type", content_type),
                    make_header("Accept-Ranges", "bytes"),
                ],
                file,
                Some(to_usize(size)),
                None,
            )
            .with_chunked_threshold(usize::MAX);
            return request.respond(response).map_err(DeliveryError::Aborted);
        }
        Some(Ok(Some(range))) => range,
        Some(Err(Unsatisfiable)) => {
            let response = Response::empty(StatusCode(416))
                .with_header(make_header("Content-Range", &format!("bytes */{size}")));
            return request.respond(response).map_err(DeliveryError::Aborted);
        }
    };

    // Stream only the requested slice from disk
    if let Err(e) = file.seek(SeekFrom::Start(range.start)) {
        return fail(request, path, e);
    }
    let length = range.len();
    let response = Response::new(
        StatusCode(206),
        vec![
            make_header("Content-Type", content_type),
            make_header("Content-Range", &range.content_range(size)),
            make_header("Accept-Ranges", "bytes"),
        ],
        file.take(length),
        Some(to_usize(length)),
        None,
    )
    .with_chunked_threshold(usize::MAX);

    request.respond(response).map_err(DeliveryError::Aborted)
}

/// Chunked response, compressed when the client accepts Brotli.
///
/// HTML is read whole so the live-reload script can go in before `</body>`;
/// everything else streams straight from the file.
fn respond_stream(
    request: Request,
    path: &Path,
    mut file: File,
    content_type: &str,
) -> Result<(), DeliveryError> {
    let body: Box<dyn Read + Send> = if mime::is_html(content_type) {
        let mut page = Vec::new();
        if let Err(e) = file.read_to_end(&mut page) {
            return fail(request, path, e);
        }
        Box::new(Cursor::new(inject_livereload(&page)))
    } else {
        Box::new(file)
    };

    let mut headers = vec![
        make_header("Content-Type", content_type),
        make_header("Vary", "Accept-Encoding"),
    ];

    let body: Box<dyn Read + Send> = if accepts_brotli(&request) {
        headers.push(make_header("Content-Encoding", "br"));
        Box::new(brotli::CompressorReader::new(
            body,
            BROTLI_BUFFER,
            BROTLI_QUALITY,
            BROTLI_LGWIN,
        ))
    } else {
        body
    };

    // Unknown length: tiny_http switches to `Transfer-Encoding: chunked`
    let response = Response::new(StatusCode(200), headers, body, None, None);
    request.respond(response).map_err(DeliveryError::Aborted)
}

/// Insert the live-reload client before `</body>`.
pub fn inject_livereload(page: &[u8]) -> Vec<u8> {
    html::inject_before_body_end(page, LIVERELOAD_SCRIPT.as_bytes())
}

/// Respond with the built-in page standing in for a missing root index.
pub fn respond_placeholder(request: Request, index: &str, root: &Path) -> io::Result<()> {
    let page = PLACEHOLDER_HTML.render(&PlaceholderVars {
        index: index.to_string(),
        root: root.display().to_string(),
    });
    let response = Response::from_data(inject_livereload(page.as_bytes()))
        .with_header(make_header("Content-Type", mime::types::HTML))
        .with_header(make_header("Cache-Control", "no-cache"));
    request.respond(response)
}

/// Respond with 404 and an empty body (`Content-Length: 0`).
pub fn respond_not_found(request: Request) -> io::Result<()> {
    request.respond(Response::empty(StatusCode(404)))
}

/// Respond with 503 and an empty body (bad method, shutdown, read failure).
pub fn respond_unavailable(request: Request) -> io::Result<()> {
    request.respond(Response::empty(StatusCode(503)))
}

/// Answer 503 for a failure that happened before any byte was sent.
fn fail(request: Request, path: &Path, source: io::Error) -> Result<(), DeliveryError> {
    let _ = respond_unavailable(request);
    Err(DeliveryError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Whether `Accept-Encoding` allows `br` (and does not set `q=0`).
pub fn accepts_brotli(request: &Request) -> bool {
    get_header(request, "Accept-Encoding").is_some_and(|value| accepts_encoding(&value, "br"))
}

fn accepts_encoding(header: &str, coding: &str) -> bool {
    header.split(',').any(|item| {
        let mut parts = item.split(';').map(str::trim);
        let name = parts.next().unwrap_or_default();
        let refused = parts.any(|param| {
            param
                .strip_prefix("q=")
                .and_then(|q| q.trim().parse::<f32>().ok())
                .is_some_and(|q| q <= 0.0)
        });
        name.eq_ignore_ascii_case(coding) && !refused
    })
}

/// Extract a header value from the request (case-insensitive name).
pub fn get_header(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
        .map(|h| h.value.to_string())
}

/// Build a header; values that are not valid header text degrade to an
/// empty value instead of failing the response.
fn make_header(key: &'static str, value: &str) -> Header {
    Header::from_bytes(key, value)
        .or_else(|()| Header::from_bytes(key, ""))
        .unwrap_or_else(|()| unreachable!("static header name `{key}` is valid"))
}

#[inline]
fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_for_mime() {
        assert_eq!(Strategy::for_mime(mime::types::PNG), Strategy::Image);
        assert_eq!(Strategy::for_mime(mime::types::SVG), Strategy::Image);
        assert_eq!(Strategy::for_mime(mime::types::MP4), Strategy::Video);
        assert_eq!(Strategy::for_mime(mime::types::HTML), Strategy::Stream);
        assert_eq!(Strategy::for_mime(mime::types::TTF), Strategy::Stream);
        assert_eq!(Strategy::for_mime(mime::types::OCTET_STREAM), Strategy::Stream);
    }

    #[test]
    fn test_accepts_encoding() {
        assert!(accepts_encoding("gzip, deflate, br", "br"));
        assert!(accepts_encoding("br;q=0.5", "br"));
        assert!(accepts_encoding("BR", "br"));
        assert!(!accepts_encoding("gzip, deflate", "br"));
        assert!(!accepts_encoding("br;q=0", "br"));
        assert!(!accepts_encoding("brotli", "br"));
    }

    #[test]
    fn test_inject_livereload() {
        let page = inject_livereload(b"<body><h1>Hello World</h1></body>");
        let page = String::from_utf8(page).unwrap();
        let script = page.find("/_has_update").unwrap();
        assert!(script < page.find("</body>").unwrap());
        assert!(page.starts_with("<body><h1>Hello World</h1>"));
    }

    #[test]
    fn test_make_header_survives_bad_value() {
        let header = make_header("Content-Type", "text/plain\u{00e9}");
        assert!(header.field.equiv("Content-Type"));
    }
}
