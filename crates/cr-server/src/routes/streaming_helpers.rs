//! Range-serving for local video files: range parsing, content-type
//! selection, and chunked streaming via `ReaderStream`.

use std::path::Path;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

/// Read chunk size for streamed bodies.
const CHUNK_SIZE: usize = 64 * 1024;

/// Content type used when a video carries none and its name gives no hint.
pub const DEFAULT_CONTENT_TYPE: &str = "video/mp4";

/// Parse a `Range: bytes=START-END` header value.
///
/// Returns `(start, Option<end>)`; `end` is `None` for `bytes=500-`.
/// Suffix ranges (`bytes=-500`) and anything non-numeric yield `None`.
pub fn parse_range_header(value: &str) -> Option<(u64, Option<u64>)> {
    let spec = value.trim().strip_prefix("bytes=")?;
    let (start_str, end_str) = spec.split_once('-')?;

    let start: u64 = start_str.trim().parse().ok()?;
    let end_str = end_str.trim();
    let end = if end_str.is_empty() {
        None
    } else {
        Some(end_str.parse().ok()?)
    };
    Some((start, end))
}

/// How a request maps onto a file of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// No usable range: send the whole file.
    Full,
    /// Inclusive byte window.
    Partial { start: u64, end: u64 },
    /// Bounds lie outside the file.
    Unsatisfiable,
}

/// Resolve a raw `Range` header against `size`.
///
/// Unparsable headers fall back to [`ByteRange::Full`]. Bounds at or beyond
/// `size` are never clamped.
pub fn resolve_range(range_header: Option<&str>, size: u64) -> ByteRange {
    let Some((start, end)) = range_header.and_then(parse_range_header) else {
        return ByteRange::Full;
    };
    if size == 0 {
        return ByteRange::Unsatisfiable;
    }
    let end = end.unwrap_or(size - 1);
    if start >= size || end >= size || start > end {
        return ByteRange::Unsatisfiable;
    }
    ByteRange::Partial { start, end }
}

/// Guess a video MIME type from a file name's extension.
pub fn guess_content_type(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "ogv" => "video/ogg",
        "ts" => "video/mp2t",
        _ => return None,
    };
    Some(mime)
}

/// Serve `file_path` in full or as the requested byte range.
///
/// A missing file is [`cr_core::Error::Gone`]: the caller already knows
/// the video exists.
pub async fn serve_file_streaming(
    file_path: &Path,
    content_type: &str,
    range_header: Option<&str>,
) -> cr_core::Result<Response> {
    let metadata = match tokio::fs::metadata(file_path).await {
        Ok(m) if m.is_file() => m,
        Ok(_) => return Err(cr_core::Error::Gone("video file is missing".into())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(cr_core::Error::Gone("video file is missing".into()))
        }
        Err(e) => return Err(e.into()),
    };
    let file_size = metadata.len();

    match resolve_range(range_header, file_size) {
        ByteRange::Unsatisfiable => Ok((
            StatusCode::RANGE_NOT_SATISFIABLE,
            [(header::CONTENT_RANGE, format!("bytes */{file_size}"))],
            Body::empty(),
        )
            .into_response()),

        ByteRange::Partial { start, end } => {
            let length = end - start + 1;
            let mut file = tokio::fs::File::open(file_path).await?;
            file.seek(std::io::SeekFrom::Start(start)).await?;

            let stream = ReaderStream::with_capacity(file.take(length), CHUNK_SIZE);

            Ok((
                StatusCode::PARTIAL_CONTENT,
                [
                    (header::CONTENT_TYPE, content_type.to_string()),
                    (
                        header::CONTENT_RANGE,
                        format!("bytes {start}-{end}/{file_size}"),
                    ),
                    (header::CONTENT_LENGTH, length.to_string()),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                ],
                Body::from_stream(stream),
            )
                .into_response())
        }

        ByteRange::Full => {
            let file = tokio::fs::File::open(file_path).await?;
            let stream = ReaderStream::with_capacity(file, CHUNK_SIZE);

            Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type.to_string()),
                    (header::CONTENT_LENGTH, file_size.to_string()),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                ],
                Body::from_stream(stream),
            )
                .into_response())
        }
    }
}
