//! Incremental decoder for streamed model output.
//!
//! The wire format is newline-delimited event lines, `"data: <json>"`,
//! where the payload is either a JSON frame or the `[DONE]` sentinel.
//! Chunk boundaries may split lines (and multi-byte UTF-8 sequences)
//! arbitrarily; the decoder buffers pending bytes across feeds so that
//! any chunking of the same logical stream yields the same final text.
//!
//! Consumers always receive the complete text-so-far, never a bare
//! delta, so they do not have to perform their own concatenation.

use std::fmt::Display;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};

use crate::{AppError, Result};

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// A value decoded from one complete protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// An incremental fragment of model text.
    TextDelta(String),
    /// The terminal sentinel; ends event extraction for the line.
    Done,
    /// A recognized frame that carries no text (ignored).
    Control,
}

/// One-shot incremental parser for a single stream instance.
///
/// Holds no state beyond the pending-bytes buffer and the running text
/// accumulator; it is not restartable across streams.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    pending: Vec<u8>,
    accumulated: String,
}

impl StreamDecoder {
    /// Create an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes and drain full-accumulator snapshots.
    ///
    /// Returns one snapshot per text delta applied by this feed. The last
    /// (possibly incomplete) line segment is retained for the next call;
    /// an incomplete multi-byte sequence can only sit at the buffer tail,
    /// so it is preserved intact.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut snapshots = Vec::new();

        while let Some(newline) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            // Malformed frames (including invalid UTF-8) are dropped, not fatal.
            let Ok(line) = std::str::from_utf8(&line[..line.len() - 1]) else {
                continue;
            };
            if let Some(StreamEvent::TextDelta(delta)) = parse_line(line) {
                self.accumulated.push_str(&delta);
                snapshots.push(self.accumulated.clone());
            }
        }

        snapshots
    }

    /// The complete text accumulated so far.
    #[must_use]
    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    /// Consume the decoder, returning the final accumulated text.
    #[must_use]
    pub fn into_text(self) -> String {
        self.accumulated
    }
}

/// Parse one complete, newline-stripped protocol line.
///
/// Lines without the `data:` prefix and payloads that fail to parse as
/// JSON are not events (`None`). Text deltas carrying empty text map to
/// [`StreamEvent::Control`].
#[must_use]
pub fn parse_line(line: &str) -> Option<StreamEvent> {
    let payload = line.trim().strip_prefix(DATA_PREFIX)?.trim();
    if payload == DONE_SENTINEL {
        return Some(StreamEvent::Done);
    }

    let value: serde_json::Value = serde_json::from_str(payload).ok()?;
    if value.get("type").and_then(serde_json::Value::as_str) == Some("text-delta") {
        match value.get("textDelta").and_then(serde_json::Value::as_str) {
            Some(delta) if !delta.is_empty() => {
                return Some(StreamEvent::TextDelta(delta.to_owned()));
            }
            _ => return Some(StreamEvent::Control),
        }
    }
    Some(StreamEvent::Control)
}

/// Drive a byte-chunk stream to completion, emitting accumulator
/// snapshots to `on_update` and returning the final text.
///
/// The loop ends when the underlying stream signals end-of-stream; it
/// does not depend on having seen the `[DONE]` sentinel (the stream may
/// carry trailing frames after it).
///
/// # Errors
///
/// Returns `AppError::Model` if a read from the underlying stream fails.
pub async fn decode_text_stream<S, E, F>(mut stream: S, mut on_update: F) -> Result<String>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: Display,
    F: FnMut(&str),
{
    let mut decoder = StreamDecoder::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| AppError::Model(format!("stream read failed: {err}")))?;
        for snapshot in decoder.feed(&chunk) {
            on_update(&snapshot);
        }
    }

    Ok(decoder.into_text())
}
