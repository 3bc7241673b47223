//! MIME type detection.
//!
//! Extension table first; unknown extensions fall back to the system
//! `file` utility. Callers memoize through [`crate::index::MimeCache`].

use std::path::Path;
use std::process::{Command, Stdio};

/// Common MIME type constants.
pub mod types {
    // Text
    pub const HTML: &str = "text/html";
    pub const PLAIN: &str = "text/plain";
    pub const CSS: &str = "text/css";
    pub const JAVASCRIPT: &str = "application/javascript";
    pub const JSON: &str = "application/json";
    pub const XML: &str = "application/xml";
    pub const MARKDOWN: &str = "text/markdown";
    pub const CSV: &str = "text/csv";

    // Binary
    pub const OCTET_STREAM: &str = "application/octet-stream";
    pub const WASM: &str = "application/wasm";
    pub const PDF: &str = "application/pdf";
    pub const MAP: &str = "application/json";

    // Images
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const GIF: &str = "image/gif";
    pub const WEBP: &str = "image/webp";
    pub const AVIF: &str = "image/avif";
    pub const SVG: &str = "image/svg+xml";
    pub const ICO: &str = "image/x-icon";
    pub const BMP: &str = "image/bmp";

    // Audio
    pub const MP3: &str = "audio/mpeg";
    pub const WAV: &str = "audio/wav";
    pub const OGG_AUDIO: &str = "audio/ogg";

    // Video
    pub const MP4: &str = "video/mp4";
    pub const WEBM: &str = "video/webm";
    pub const OGG_VIDEO: &str = "video/ogg";
    pub const MOV: &str = "video/quicktime";

    // Fonts
    pub const WOFF: &str = "font/woff";
    pub const WOFF2: &str = "font/woff2";
    pub const TTF: &str = "font/ttf";
    pub const OTF: &str = "font/otf";
}

/// Look up a MIME type by file extension (case-insensitive).
///
/// Returns `None` for extensions outside the table.
pub fn from_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    from_extension(&ext)
}

/// Look up a lowercase extension.
pub fn from_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext {
        // Web / Text
        "html" | "htm" => types::HTML,
        "css" => types::CSS,
        "js" | "mjs" | "cjs" => types::JAVASCRIPT,
        "json" => types::JSON,
        "map" => types::MAP,
        "xml" => types::XML,
        "txt" => types::PLAIN,
        "md" => types::MARKDOWN,
        "csv" => types::CSV,

        // Images
        "svg" => types::SVG,
        "png" => types::PNG,
        "jpg" | "jpeg" => types::JPEG,
        "gif" => types::GIF,
        "webp" => types::WEBP,
        "avif" => types::AVIF,
        "ico" => types::ICO,
        "bmp" => types::BMP,

        // Audio
        "mp3" => types::MP3,
        "wav" => types::WAV,
        "ogg" | "oga" => types::OGG_AUDIO,

        // Video
        "mp4" | "m4v" => types::MP4,
        "webm" => types::WEBM,
        "ogv" => types::OGG_VIDEO,
        "mov" => types::MOV,

        // Fonts
        "woff" => types::WOFF,
        "woff2" => types::WOFF2,
        "ttf" => types::TTF,
        "otf" => types::OTF,

        // Binary
        "wasm" => types::WASM,
        "pdf" => types::PDF,

        _ => return None,
    };
    Some(mime)
}

/// Ask the system content sniffer (`file --brief --mime-type`).
///
/// Returns `None` if the tool is missing, fails, or prints nothing useful.
pub fn sniff(path: &Path) -> Option<String> {
    let output = Command::new("file")
        .args(["--brief", "--mime-type", "--"])
        .arg(path)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let mime = String::from_utf8(output.stdout).ok()?;
    let mime = mime.trim();
    // `file` reports e.g. "cannot open" on odd inputs; only accept type/subtype
    (mime.contains('/') && !mime.contains(' ')).then(|| mime.to_string())
}

/// Check if the MIME type is an HTML document.
pub fn is_html(mime: &str) -> bool {
    mime.starts_with(types::HTML)
}

/// Check if the MIME type represents an image.
pub fn is_image(mime: &str) -> bool {
    mime.starts_with("image/")
}

/// Check if the MIME type represents video.
pub fn is_video(mime: &str) -> bool {
    mime.starts_with("video/")
}
