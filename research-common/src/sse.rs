//! Server-Sent Events (SSE) frame decoding
//!
//! Incremental decoder for `text/event-stream` bodies consumed by the client.
//! Byte chunks arrive in arbitrary sizes; complete lines are decoded as soon
//! as they are available and a frame is emitted on every blank line.
//!
//! ```text
//! : heartbeat
//! data: {"type":"progress","step":"curator"}
//!
//! event: ConnectionStatus
//! data: connected
//!
//! ```

use tracing::warn;

/// Longest line the decoder buffers; longer lines are dropped whole
pub const MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

/// One dispatched SSE event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// `event:` field, if any
    pub event: Option<String>,
    /// `data:` lines joined with `\n`
    pub data: String,
    /// `id:` field, if any
    pub id: Option<String>,
}

impl SseFrame {
    /// True for frames an EventSource would hand to `onmessage`
    /// (no event name, or the name `message`)
    pub fn is_message(&self) -> bool {
        matches!(self.event.as_deref(), None | Some("message"))
    }
}

/// Incremental SSE decoder
///
/// Lines may end in LF or CRLF. Partial lines are buffered as raw bytes, so a
/// multi-byte UTF-8 character split across chunks decodes correctly. A line
/// over [`MAX_LINE_BYTES`] is discarded up to its line end.
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Unterminated tail of the body
    buffer: Vec<u8>,
    /// Bytes of `buffer` already known to hold no line end
    scanned: usize,
    /// Discarding an oversized line until its line end
    skipping: bool,
    data_lines: Vec<String>,
    event: Option<String>,
    id: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of the response body, returning every frame it completes
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut line_start = 0;
        let mut search_from = self.scanned;
        while let Some(offset) = self.buffer[search_from..].iter().position(|b| *b == b'\n') {
            let line_end = search_from + offset;
            search_from = line_end + 1;
            let range = line_start..line_end;
            line_start = search_from;

            if std::mem::take(&mut self.skipping) {
                continue;
            }
            if range.len() > MAX_LINE_BYTES {
                warn!(bytes = range.len(), "Dropping oversized SSE line");
                continue;
            }
            let line = String::from_utf8_lossy(trim_cr(&self.buffer[range])).into_owned();
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
        }

        // One drain per chunk; the tail holds no line end
        self.buffer.drain(..line_start);
        self.scanned = self.buffer.len();

        if self.buffer.len() > MAX_LINE_BYTES {
            warn!(bytes = self.buffer.len(), "Dropping oversized SSE line");
            self.buffer.clear();
            self.scanned = 0;
            self.skipping = true;
        }
        frames
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }

        // Comment line
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => self.data_lines.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            // retry and unknown fields carry nothing for this client
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data_lines.is_empty() {
            return None;
        }
        Some(SseFrame {
            event,
            data: std::mem::take(&mut self.data_lines).join("\n"),
            id: self.id.clone(),
        })
    }
}

fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}
