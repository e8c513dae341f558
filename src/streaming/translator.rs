//! Provider stream translation
//!
//! Consumes the raw byte stream of an upstream provider and re-emits it as the
//! normalized SSE stream: `data: {"choices":[{"delta":{"content":"..."}}]}\n\n`
//! events followed by exactly one `data: [DONE]\n\n`.
//!
//! The output is a pull-based stream: nothing is read from the upstream until
//! the consumer asks for the next event, and dropping the output drops the
//! upstream body, which releases the connection.

use std::fmt::Display;
use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::SseLineBuffer;
use crate::api::StreamChunk;

/// Normalized output stream
pub type TranslatedStream = Pin<Box<dyn Stream<Item = Result<Bytes, StreamError>> + Send>>;

/// Terminal sentinel payload
const DONE_SENTINEL: &str = "[DONE]";

/// Errors that end a translated stream.
///
/// They are delivered to the consumer as the final item instead of the
/// sentinel, so a broken upstream never looks like a finished generation.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Reading the upstream body failed
    #[error("Upstream stream failed: {0}")]
    Transport(String),

    /// The provider sent an error event in the middle of the stream
    #[error("Provider error: {message}")]
    Provider {
        message: String,
        code: Option<String>,
    },
}

/// How a provider frames text deltas inside its stream events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamDialect {
    /// OpenAI chat completion chunks, already in the target format.
    /// Events are forwarded verbatim.
    OpenAi,
    /// Gemini `GenerateContentResponse` events; the delta lives at
    /// `candidates[0].content.parts[0].text`.
    Gemini,
}

impl StreamDialect {
    /// Turn one upstream event payload into an output event.
    ///
    /// Returns `Ok(None)` for events that carry nothing for the UI and for
    /// payloads that are not valid JSON, which are dropped.
    pub fn translate_payload(&self, payload: &str) -> Result<Option<Bytes>, StreamError> {
        let event: Value = match serde_json::from_str(payload) {
            Ok(event) => event,
            Err(e) => {
                debug!(error = %e, payload_len = payload.len(), "Dropping unparseable stream event");
                return Ok(None);
            }
        };

        if let Some(error) = event.get("error").filter(|e| e.is_object()) {
            return Err(StreamError::Provider {
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown provider error")
                    .to_string(),
                code: error.get("code").map(|c| match c {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                }),
            });
        }

        match self {
            StreamDialect::OpenAi => Ok(Some(Bytes::from(format!("data: {}\n\n", payload)))),
            StreamDialect::Gemini => Ok(gemini_delta(&event).map(|text| format_sse_chunk(&StreamChunk::text(text)))),
        }
    }
}

/// Text delta of a Gemini stream event, if present and non-empty
pub fn gemini_delta(event: &Value) -> Option<&str> {
    event
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
}

/// Format a stream chunk as an SSE data event: `data: {json}\n\n`
pub fn format_sse_chunk(chunk: &StreamChunk) -> Bytes {
    let json = serde_json::to_string(chunk).expect("StreamChunk should always serialize");
    Bytes::from(format!("data: {}\n\n", json))
}

/// Format the SSE done marker: `data: [DONE]\n\n`
pub fn format_sse_done() -> Bytes {
    Bytes::from_static(b"data: [DONE]\n\n")
}

/// Incremental translator state for one in-flight stream.
#[derive(Debug)]
pub struct StreamTranslator {
    dialect: StreamDialect,
    lines: SseLineBuffer,
    emitted: usize,
}

impl StreamTranslator {
    pub fn new(dialect: StreamDialect) -> Self {
        Self {
            dialect,
            lines: SseLineBuffer::new(),
            emitted: 0,
        }
    }

    /// Number of content events emitted so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Process one network read and return the events it completes.
    ///
    /// When a line of the read is a provider error, the events translated
    /// before it come back together with the error and the rest of the read
    /// is discarded.
    pub fn feed(&mut self, bytes: &[u8]) -> (Vec<Bytes>, Option<StreamError>) {
        let mut events = Vec::new();
        for line in self.lines.feed(bytes) {
            match self.process_line(&line) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(e) => return (events, Some(e)),
            }
        }
        (events, None)
    }

    /// Drain the last unterminated line and append the sentinel
    pub fn finish(&mut self) -> Result<Vec<Bytes>, StreamError> {
        let mut events = Vec::new();
        if let Some(line) = self.lines.flush() {
            if let Some(event) = self.process_line(&line)? {
                events.push(event);
            }
        }
        events.push(format_sse_done());
        Ok(events)
    }

    fn process_line(&mut self, line: &str) -> Result<Option<Bytes>, StreamError> {
        let Some(payload) = extract_payload(line) else {
            return Ok(None);
        };

        let event = self.dialect.translate_payload(payload)?;
        if event.is_some() {
            self.emitted += 1;
        }
        Ok(event)
    }
}

/// Find the JSON payload of a stream line.
///
/// Handles `data:` framed SSE lines and, as a fallback, bare JSON objects
/// from array-framed streams (`[{...}`, `{...},`, `{...}]`).
fn extract_payload(line: &str) -> Option<&str> {
    let trimmed = line.trim();

    if let Some(rest) = trimmed.strip_prefix("data:") {
        let payload = rest.trim();
        if payload.is_empty() || payload == DONE_SENTINEL {
            return None;
        }
        return Some(payload);
    }

    if trimmed.starts_with('{') {
        let payload = trimmed
            .trim_start_matches([',', '['])
            .trim_end_matches([',', ']'])
            .trim();
        return Some(payload);
    }

    None
}

/// Translate an upstream byte stream into the normalized SSE stream.
///
/// Emits the sentinel only after the upstream ended cleanly. A read error
/// or provider error event is forwarded as the last item, after every event
/// already translated and without a sentinel.
pub fn translate_stream<S, E>(upstream: S, dialect: StreamDialect) -> TranslatedStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut translator = StreamTranslator::new(dialect);
        futures::pin_mut!(upstream);
        let mut failed = false;

        while let Some(item) = upstream.next().await {
            match item {
                Ok(bytes) => {
                    let (events, error) = translator.feed(&bytes);
                    for event in events {
                        yield Ok(event);
                    }
                    if let Some(e) = error {
                        warn!(error = %e, dialect = ?dialect, "Provider reported an error mid-stream");
                        yield Err(e);
                        failed = true;
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, dialect = ?dialect, "Upstream stream read failed");
                    yield Err(StreamError::Transport(e.to_string()));
                    failed = true;
                    break;
                }
            }
        }

        if !failed {
            match translator.finish() {
                Ok(events) => {
                    for event in events {
                        yield Ok(event);
                    }
                }
                Err(e) => yield Err(e),
            }
            debug!(dialect = ?dialect, chunks = translator.emitted(), "Upstream stream drained");
        }
    })
}
