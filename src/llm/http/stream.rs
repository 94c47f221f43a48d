use std::collections::VecDeque;
use std::io::Read;

use tracing::{debug, trace};

use super::types::StreamEvent;
use crate::error::Result;

const DATA_PREFIX: &str = "data:";

/// Default read size for the streaming response body. One byte exercises the
/// framing maximally; callers wanting throughput should ask for more.
pub const DEFAULT_CHUNK_SIZE: usize = 1;

/// Incremental decoder for the line-oriented `data: <json>` framing used by
/// the streaming chat endpoint.
///
/// Bytes accumulate in an internal buffer and are split on newlines; a line
/// is decoded as UTF-8 and parsed only once fully assembled, so chunk
/// boundaries falling inside a line or inside a multi-byte sequence are
/// harmless. Malformed lines (bad UTF-8, invalid JSON) are dropped and the
/// stream continues.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Feed one raw chunk and collect every event it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = Self::decode_line(&line[..line.len() - 1]) {
                events.push(event);
            }
        }
        events
    }

    /// Best-effort decode of a trailing fragment left without a terminating
    /// newline. Malformed leftovers are dropped silently.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        let rest = std::mem::take(&mut self.buffer);
        if rest.is_empty() {
            return None;
        }
        Self::decode_line(&rest)
    }

    fn decode_line(line: &[u8]) -> Option<StreamEvent> {
        let line = match std::str::from_utf8(line) {
            Ok(text) => text.trim(),
            // Only genuinely malformed bytes end up here; sequences split
            // across chunks were reassembled before decoding.
            Err(_) => {
                trace!("dropping non-UTF-8 stream line");
                return None;
            }
        };
        if line.is_empty() {
            return None;
        }
        // Lines without the data prefix are protocol framing or comments.
        let data = line.strip_prefix(DATA_PREFIX)?.trim();
        match serde_json::from_str::<StreamEvent>(data) {
            Ok(event) => Some(event),
            Err(err) => {
                trace!(error = %err, "dropping malformed stream frame");
                None
            }
        }
    }
}

type OnMessage = Box<dyn FnMut(&StreamEvent) + Send>;

/// Options for a streaming chat call.
pub struct StreamOptions {
    pub chunk_size: usize,
    on_message: Option<OnMessage>,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            on_message: None,
        }
    }
}

impl StreamOptions {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Register a callback invoked for each event just before it is yielded.
    pub fn with_on_message(mut self, on_message: impl FnMut(&StreamEvent) + Send + 'static) -> Self {
        self.on_message = Some(Box::new(on_message));
        self
    }
}

/// Pull-based event source over an open streaming response body.
///
/// Finite and single-pass: once exhausted, a new HTTP call is required to
/// stream again. A read error yields one `Err` item and ends the stream.
pub struct EventStream {
    reader: Box<dyn Read + Send>,
    decoder: SseDecoder,
    pending: VecDeque<StreamEvent>,
    chunk: Vec<u8>,
    on_message: Option<OnMessage>,
    events_seen: usize,
    done: bool,
}

impl EventStream {
    pub fn new(reader: impl Read + Send + 'static, options: StreamOptions) -> Self {
        let chunk_size = options.chunk_size.max(1);
        Self {
            reader: Box::new(reader),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            chunk: vec![0u8; chunk_size],
            on_message: options.on_message,
            events_seen: 0,
            done: false,
        }
    }

    fn emit(&mut self, event: StreamEvent) -> StreamEvent {
        self.events_seen += 1;
        debug!(
            event = %event.event,
            answer_len = event.answer.len(),
            count = self.events_seen,
            "stream event"
        );
        if let Some(on_message) = self.on_message.as_mut() {
            on_message(&event);
        }
        event
    }
}

impl Iterator for EventStream {
    type Item = Result<StreamEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                let event = self.emit(event);
                return Some(Ok(event));
            }
            if self.done {
                return None;
            }
            match self.reader.read(&mut self.chunk) {
                Ok(0) => {
                    self.done = true;
                    debug!(events = self.events_seen, "stream completed");
                    if let Some(event) = self.decoder.finish() {
                        self.pending.push_back(event);
                    }
                }
                Ok(n) => self.pending.extend(self.decoder.feed(&self.chunk[..n])),
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err.into()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(body: &[u8], chunk_size: usize) -> Vec<StreamEvent> {
        let mut decoder = SseDecoder::new();
        let mut events = Vec::new();
        for chunk in body.chunks(chunk_size) {
            events.extend(decoder.feed(chunk));
        }
        events.extend(decoder.finish());
        events
    }

    #[test]
    fn test_single_event() {
        let body = b"data: {\"event\": \"message\", \"answer\": \"hi\"}\n";
        let events = decode_all(body, body.len());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "message");
        assert_eq!(events[0].answer, "hi");
    }

    #[test]
    fn test_multiple_events_in_one_chunk() {
        let body = b"data: {\"event\": \"message\", \"answer\": \"a\"}\ndata: {\"event\": \"message\", \"answer\": \"b\"}\n";
        let events = decode_all(body, body.len());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].answer, "a");
        assert_eq!(events[1].answer, "b");
    }

    #[test]
    fn test_one_byte_chunks_match_whole_body() {
        let body = b"data: {\"event\": \"message\", \"answer\": \"hello\"}\ndata: {\"event\": \"done\", \"answer\": \"\"}\n";
        let whole = decode_all(body, body.len());
        let split = decode_all(body, 1);
        assert_eq!(whole.len(), split.len());
        for (a, b) in whole.iter().zip(split.iter()) {
            assert_eq!(a.event, b.event);
            assert_eq!(a.answer, b.answer);
        }
    }

    #[test]
    fn test_trailing_fragment_without_newline() {
        let mut decoder = SseDecoder::new();
        assert!(decoder
            .feed(b"data: {\"event\": \"message\", \"answer\": \"tail\"}")
            .is_empty());
        let event = decoder.finish().expect("trailing frame decoded");
        assert_eq!(event.answer, "tail");
    }

    #[test]
    fn test_malformed_trailing_fragment_is_dropped() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: {\"event\": \"message\", \"answer\": \"ok\"}\ndata: {\"broken");
        assert_eq!(events.len(), 1);
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn test_lines_without_data_prefix_are_ignored() {
        let body = b": keep-alive comment\nevent: ping\n\ndata: {\"event\": \"message\", \"answer\": \"x\"}\n";
        let events = decode_all(body, body.len());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].answer, "x");
    }

    #[test]
    fn test_invalid_json_line_is_dropped() {
        let body = b"data: not json at all\ndata: {\"event\": \"message\", \"answer\": \"y\"}\n";
        let events = decode_all(body, 1);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].answer, "y");
    }

    #[test]
    fn test_multibyte_utf8_split_across_chunks() {
        let body = "data: {\"event\": \"message\", \"answer\": \"héllo wörld\"}\n".as_bytes();
        let events = decode_all(body, 1);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].answer, "héllo wörld");
    }

    #[test]
    fn test_invalid_utf8_line_does_not_corrupt_later_frames() {
        let mut body = b"data: \"".to_vec();
        body.extend_from_slice(&[0xff, 0xfe]);
        body.extend_from_slice(b"\"\ndata: {\"event\": \"message\", \"answer\": \"z\"}\n");
        let events = decode_all(&body, 1);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].answer, "z");
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let body = b"\n\n   \ndata: {\"event\": \"message\", \"answer\": \"w\"}\n\n";
        let events = decode_all(body, body.len());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].answer, "w");
    }
}
