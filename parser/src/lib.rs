//! Turns a raw byte stream from the child CLI into a sequence of validated
//! protocol messages.
//!
//! The stream interleaves well-formed NDJSON with terminal decorations
//! (ANSI escapes stripped upstream by the adapter, box-drawing glyphs,
//! progress ornaments) and, on Windows pseudo-consoles, lines that get
//! split or truncated in ways a plain `BufReader::lines()` can't recover
//! from. [`StreamParser`] is built to tolerate all of that without ever
//! losing its ability to resynchronize at the next newline.

use overseer_types::ProtocolMessage;
use overseer_util::starts_with_ansi_escape;
use thiserror::Error;

/// Hard cap on the bytes a [`StreamParser`] will accumulate while waiting
/// for a line delimiter. Exceeding it is a recoverable condition: the
/// buffer is dropped and framing resumes at the next newline.
pub const MAX_BUFFER_BYTES: usize = 10 * 1024 * 1024;

const DECORATION_GLYPHS: &[char] = &[
    '│', '┌', '┐', '└', '┘', '├', '┤', '┬', '┴', '┼', '─', '◆', '●', '○', '◇',
];

/// Diagnostic, non-fatal parser conditions. Never surfaced as a hard
/// `Result::Err` — the parser keeps running after emitting one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserError {
    #[error("Stream buffer size exceeded maximum limit")]
    BufferOverflow,
    #[error("received a message of an unrecognized type: {type_name}")]
    UnknownMessageType { type_name: String },
}

/// One outcome of feeding bytes into the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum ParserEvent {
    Message(ProtocolMessage),
    Error(ParserError),
}

/// Reassembles NDJSON protocol messages out of a byte stream that also
/// carries terminal decoration and partial lines.
///
/// `feed` is synchronous and infallible: it never panics and never loses
/// its ability to recover at the next newline, per the parser's contract.
pub struct StreamParser {
    /// Bytes accumulated since the last newline, waiting for more.
    accumulated: Vec<u8>,
    /// The most recent `{`-prefixed line that failed to parse, kept around
    /// in case it was merely truncated by a pseudo-console and the "real"
    /// continuation shows up later. Replaced (not appended to) by the next
    /// candidate line; the prior attempt is presumed lost, per the
    /// partial-JSON policy.
    pending_candidate: Option<String>,
    max_buffer_bytes: usize,
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            accumulated: Vec::new(),
            pending_candidate: None,
            max_buffer_bytes: MAX_BUFFER_BYTES,
        }
    }

    /// Construct a parser with a non-default buffer cap. Exists primarily
    /// so tests can exercise the overflow path without a 10 MiB fixture.
    #[must_use]
    pub fn with_max_buffer_bytes(max_buffer_bytes: usize) -> Self {
        Self {
            max_buffer_bytes,
            ..Self::new()
        }
    }

    /// Append `bytes` to the internal buffer and synchronously return
    /// every message/error event this feed produced, in arrival order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<ParserEvent> {
        let mut events = Vec::new();
        self.accumulated.extend_from_slice(bytes);

        while let Some(pos) = self.accumulated.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.accumulated.drain(..=pos).collect();
            let line = strip_line_terminator(&line[..line.len() - 1]);
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }

        // Only the undrained tail -- bytes still waiting for their line
        // delimiter -- counts toward the cap; complete lines were already
        // drained above regardless of how large this feed was.
        if self.accumulated.len() > self.max_buffer_bytes {
            events.push(ParserEvent::Error(ParserError::BufferOverflow));
            self.accumulated.clear();
        }

        events
    }

    /// Attempt to parse any trailing buffered content (a final line with no
    /// trailing newline, and/or a still-pending partial-JSON candidate) as
    /// a last-ditch effort before the stream closes.
    pub fn flush(&mut self) -> Vec<ParserEvent> {
        let mut events = Vec::new();

        if !self.accumulated.is_empty() {
            let remaining = std::mem::take(&mut self.accumulated);
            let line = strip_line_terminator(&remaining);
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }

        if let Some(candidate) = self.pending_candidate.take()
            && let Ok(message) = serde_json::from_str::<ProtocolMessage>(&candidate)
        {
            events.push(ParserEvent::Message(message));
        }

        events
    }

    /// Discard all buffered state and return to the initial, just-created
    /// state.
    pub fn reset(&mut self) {
        self.accumulated.clear();
        self.pending_candidate = None;
    }

    fn process_line(&mut self, line: &str) -> Option<ParserEvent> {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || !passes_decoration_filter(trimmed) {
            return None;
        }

        // Any line reaching here starts with `{`: it supersedes whatever
        // was previously pending, per the partial-JSON policy.
        self.pending_candidate = None;

        match serde_json::from_str::<ProtocolMessage>(trimmed) {
            Ok(message) => {
                if let ProtocolMessage::Unknown { raw } = &message {
                    let type_name = raw
                        .get("type")
                        .and_then(serde_json::Value::as_str)
                        .unwrap_or("<missing>")
                        .to_string();
                    tracing::debug!(type_name, "parser: forwarding unrecognized message type");
                }
                Some(ParserEvent::Message(message))
            }
            Err(_) => {
                self.pending_candidate = Some(trimmed.to_string());
                None
            }
        }
    }
}

fn strip_line_terminator(line: &[u8]) -> &str {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    std::str::from_utf8(line).unwrap_or_else(|_| {
        // Lossy conversion only matters for malformed UTF-8 boundaries, which
        // never happens for well-formed JSON text; fall back defensively.
        ""
    })
}

fn passes_decoration_filter(trimmed: &str) -> bool {
    let Some(first) = trimmed.chars().next() else {
        return false;
    };
    if (first as u32) < 0x20 && first != '\t' {
        return false;
    }
    if starts_with_ansi_escape(trimmed) {
        return false;
    }
    if DECORATION_GLYPHS.contains(&first) {
        return false;
    }
    first == '{'
}
