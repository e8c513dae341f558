//! SSE (Server-Sent Events) streaming utilities
//!
//! Provides line buffering for upstream byte streams and the translator that
//! turns provider-specific SSE into the normalized chunk stream the UI reads.

pub mod translator;

pub use translator::{
    format_sse_chunk, format_sse_done, translate_stream, StreamDialect, StreamError,
    StreamTranslator, TranslatedStream,
};

/// Buffer for accumulating incomplete SSE lines across chunk boundaries.
///
/// Network reads do not align with line boundaries, nor with UTF-8 code
/// point boundaries. Lines are split on the raw `\n` byte before decoding:
/// `\n` never occurs inside a multi-byte sequence, so every complete line
/// holds complete code points regardless of where the reads were cut.
///
/// # Example
/// ```
/// use switchboard::streaming::SseLineBuffer;
///
/// let mut buffer = SseLineBuffer::new();
///
/// // First chunk contains partial line
/// let lines1 = buffer.feed(b"data: {\"content\":\"hel");
/// assert!(lines1.is_empty()); // No complete lines yet
///
/// // Second chunk completes the line
/// let lines2 = buffer.feed(b"lo\"}\n");
/// assert_eq!(lines2, vec!["data: {\"content\":\"hello\"}"]);
/// ```
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    /// Bytes of the line currently being received
    incomplete: Vec<u8>,
}

impl SseLineBuffer {
    /// Create a new empty buffer
    pub fn new() -> Self {
        Self {
            incomplete: Vec::new(),
        }
    }

    /// Feed bytes into the buffer and return any complete lines.
    ///
    /// Complete lines are those ending with `\n`. The newline (and a
    /// preceding `\r`) is stripped from returned lines. Incomplete trailing
    /// data is retained for the next call. Empty lines are skipped since SSE
    /// uses them only as event separators.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.incomplete.extend_from_slice(bytes);

        let mut complete_lines = Vec::new();
        let mut start = 0;

        while let Some(offset) = self.incomplete[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            if let Some(line) = decode_line(&self.incomplete[start..end]) {
                complete_lines.push(line);
            }
            start = end + 1;
        }

        self.incomplete.drain(..start);
        complete_lines
    }

    /// Take whatever is left once the upstream has ended.
    ///
    /// Returns the final line when the stream did not end with a newline.
    pub fn flush(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.incomplete);
        decode_line(&rest)
    }
}

/// Decode one raw line, replacing invalid UTF-8 with U+FFFD
fn decode_line(raw: &[u8]) -> Option<String> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    if raw.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(raw).into_owned())
    }
}
