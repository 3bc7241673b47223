//! `Range: bytes=...` parsing for media seeking.

/// Largest slice returned for a single range request.
pub const CHUNK_SIZE: u64 = 1_000_000;

/// Inclusive byte range within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    #[inline]
    pub fn len(self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value.
    pub fn content_range(self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

/// The requested range starts at or beyond the end of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unsatisfiable;

/// Parse a `Range` header against a file of `size` bytes.
///
/// - `Ok(None)`: header is malformed or not a byte range; serve the whole file
/// - `Ok(Some(range))`: partial content, never longer than [`CHUNK_SIZE`]
/// - `Err(Unsatisfiable)`: answer 416
///
/// Supported forms are `N-`, `N-M` and `-N` (suffix). Only the first range
/// of a multi-range request is honored.
pub fn parse(header: &str, size: u64) -> Result<Option<ByteRange>, Unsatisfiable> {
    let header = header.trim();
    let Some(spec) = header
        .get(..6)
        .filter(|unit| unit.eq_ignore_ascii_case("bytes="))
        .map(|_| &header[6..])
    else {
        return Ok(None);
    };

    let first = spec.split(',').next().unwrap_or_default().trim();
    let Some((start, end)) = first.split_once('-') else {
        return Ok(None);
    };
    let (start, end) = (start.trim(), end.trim());

    let (start, requested_end) = match (start.is_empty(), end.is_empty()) {
        // "N-"
        (false, true) => match start.parse::<u64>() {
            Ok(start) => (start, None),
            Err(_) => return Ok(None),
        },
        // "N-M"
        (false, false) => match (start.parse::<u64>(), end.parse::<u64>()) {
            (Ok(start), Ok(end)) if end >= start => (start, Some(end)),
            _ => return Ok(None),
        },
        // "-N": last N bytes
        (true, false) => match end.parse::<u64>() {
            Ok(0) => return Err(Unsatisfiable),
            Ok(suffix) => (size.saturating_sub(suffix), None),
            Err(_) => return Ok(None),
        },
        (true, true) => return Ok(None),
    };

    if start >= size {
        return Err(Unsatisfiable);
    }

    let capped = start.saturating_add(CHUNK_SIZE - 1).min(size - 1);
    let end = requested_end.map_or(capped, |end| end.min(capped));

    Ok(Some(ByteRange { start, end }))
}
