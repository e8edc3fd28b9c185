//! Incremental parser for the answer event stream
//!
//! The answer server replies to a question with a `text/event-stream` body:
//! one event per line, each of the form `data: <json>`, where `<json>` is
//! either `{"answer": "<fragment>"}` (an incremental piece of the answer)
//! or `{"error": "<message>"}` (a terminal failure). [`AnswerStream`] turns
//! the raw byte stream into fragments, keeping all the cross-chunk state:
//!
//! - bytes of a multi-byte character split across chunk boundaries are
//!   carried until the character completes;
//! - a line not yet terminated by `\n` is retained and prefixed onto the
//!   next decoded chunk;
//! - fragments are accumulated so the full answer is available once the
//!   stream completes.
//!
//! A malformed event line is skipped (logged at `warn`), never fatal. An
//! `error` event stops all further consumption; fragments queued before it
//! are still delivered, anything after it is not.

use std::collections::VecDeque;
use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Deserialize;

use crate::error::{RagChatError, Result};

/// Literal prefix carried by every event line.
const DATA_PREFIX: &str = "data: ";

/// A single decoded event payload.
#[derive(Debug, Deserialize)]
struct AnswerEvent {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Lazy sequence of answer fragments read from one streaming response.
///
/// Pull fragments with [`next_fragment`](Self::next_fragment) until it
/// returns `Ok(None)`, or drive the whole stream with
/// [`collect`](Self::collect). Dropping the stream aborts the underlying
/// request; whatever was accumulated up to that point stands.
pub struct AnswerStream {
    chunks: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>,
    /// Undecoded trailing bytes of a character split across chunks.
    carry: Vec<u8>,
    /// Decoded text still waiting for its terminating newline.
    line_buf: String,
    /// Fragments parsed but not yet handed to the caller.
    pending: VecDeque<String>,
    /// Running concatenation of every emitted fragment.
    answer: String,
    /// Terminal error awaiting delivery, surfaced after queued fragments.
    terminal: Option<RagChatError>,
    done: bool,
}

impl std::fmt::Debug for AnswerStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerStream")
            .field("carry", &self.carry)
            .field("line_buf", &self.line_buf)
            .field("pending", &self.pending)
            .field("answer", &self.answer)
            .field("terminal", &self.terminal)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl AnswerStream {
    /// Wrap a raw byte stream (typically `Response::bytes_stream`).
    pub(crate) fn new(chunks: impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static) -> Self {
        Self {
            chunks: Box::pin(chunks),
            carry: Vec::new(),
            line_buf: String::new(),
            pending: VecDeque::new(),
            answer: String::new(),
            terminal: None,
            done: false,
        }
    }

    /// Pull the next answer fragment.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(fragment))` for each incremental piece, in arrival order
    /// - `Ok(None)` once the stream has completed (and after any error)
    ///
    /// # Errors
    ///
    /// Returns `RagChatError::Answer` when the server delivers an error
    /// payload, `RagChatError::Transport` when the connection fails
    /// mid-stream. The error is returned once; later calls yield `Ok(None)`.
    pub async fn next_fragment(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(fragment) = self.pending.pop_front() {
                return Ok(Some(fragment));
            }
            if let Some(err) = self.terminal.take() {
                return Err(err.into());
            }
            if self.done {
                return Ok(None);
            }

            match self.chunks.next().await {
                Some(Ok(chunk)) => self.ingest(&chunk),
                Some(Err(e)) => {
                    tracing::error!("Answer stream transport failure: {}", e);
                    self.done = true;
                    self.terminal = Some(RagChatError::Transport(format!(
                        "Answer stream failed: {}",
                        e
                    )));
                }
                None => {
                    self.done = true;
                    self.finish();
                }
            }
        }
    }

    /// Drive the stream to completion and return the full answer.
    ///
    /// # Errors
    ///
    /// Propagates the first terminal error, as `next_fragment` would.
    pub async fn collect(mut self) -> Result<String> {
        while self.next_fragment().await?.is_some() {}
        Ok(self.answer)
    }

    /// The answer accumulated so far (all fragments, in order).
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Feed one chunk of raw bytes through decode and line assembly.
    fn ingest(&mut self, chunk: &[u8]) {
        self.carry.extend_from_slice(chunk);
        let decoded = self.take_decoded();
        self.line_buf.push_str(&decoded);

        while let Some(pos) = self.line_buf.find('\n') {
            let rest = self.line_buf.split_off(pos + 1);
            let line = std::mem::replace(&mut self.line_buf, rest);
            self.process_line(trim_line_ending(&line));

            if self.terminal.is_some() {
                // Terminal error: stop consuming, drop any buffered tail.
                self.done = true;
                self.line_buf.clear();
                self.carry.clear();
                break;
            }
        }
    }

    /// Decode the maximal valid UTF-8 prefix of the carry buffer.
    ///
    /// An incomplete trailing sequence stays in the buffer for the next
    /// chunk; an invalid sequence decodes to U+FFFD and is skipped.
    fn take_decoded(&mut self) -> String {
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.carry) {
                Ok(text) => {
                    out.push_str(text);
                    self.carry.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.carry[..valid]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.carry.drain(..valid + len);
                        }
                        None => {
                            self.carry.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Parse one complete event line.
    fn process_line(&mut self, line: &str) {
        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            return;
        };

        match serde_json::from_str::<AnswerEvent>(payload) {
            Ok(event) => {
                if let Some(message) = event.error.filter(|m| !m.is_empty()) {
                    tracing::warn!("Answer stream returned an error payload: {}", message);
                    self.terminal = Some(RagChatError::Answer(message));
                    return;
                }
                if let Some(fragment) = event.answer {
                    self.answer.push_str(&fragment);
                    self.pending.push_back(fragment);
                }
            }
            Err(e) => {
                tracing::warn!("Skipping malformed event line: {}", e);
            }
        }
    }

    /// Flush state at end of stream: an unterminated final line is still a
    /// complete event once the input has ended.
    fn finish(&mut self) {
        if !self.carry.is_empty() {
            tracing::warn!(
                "Discarding {} undecodable trailing bytes at end of stream",
                self.carry.len()
            );
            self.carry.clear();
        }
        if !self.line_buf.is_empty() {
            let tail = std::mem::take(&mut self.line_buf);
            self.process_line(trim_line_ending(&tail));
        }
    }
}

/// Strip a trailing `\n` (and an optional `\r` before it) from a line.
fn trim_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a stream from pre-chunked bytes, exactly as they would arrive
    /// off the wire.
    fn stream_of(chunks: Vec<Vec<u8>>) -> AnswerStream {
        let items: Vec<reqwest::Result<Bytes>> =
            chunks.into_iter().map(|c| Ok(Bytes::from(c))).collect();
        AnswerStream::new(futures::stream::iter(items))
    }

    fn one_chunk(body: &str) -> AnswerStream {
        stream_of(vec![body.as_bytes().to_vec()])
    }

    async fn drain(stream: &mut AnswerStream) -> Vec<String> {
        let mut fragments = Vec::new();
        while let Some(fragment) = stream.next_fragment().await.expect("stream failed") {
            fragments.push(fragment);
        }
        fragments
    }

    #[tokio::test]
    async fn test_single_fragment() {
        let mut stream = one_chunk("data: {\"answer\":\"Hi\"}\n");
        assert_eq!(
            stream.next_fragment().await.unwrap(),
            Some("Hi".to_string())
        );
        assert_eq!(stream.next_fragment().await.unwrap(), None);
        assert_eq!(stream.answer(), "Hi");
    }

    #[tokio::test]
    async fn test_fragments_concatenate_in_order() {
        let mut stream = one_chunk("data: {\"answer\":\"Hi\"}\ndata: {\"answer\":\" there\"}\n");
        let fragments = drain(&mut stream).await;
        assert_eq!(fragments, vec!["Hi", " there"]);
        assert_eq!(stream.answer(), "Hi there");
    }

    #[tokio::test]
    async fn test_collect_returns_full_answer() {
        let stream = one_chunk("data: {\"answer\":\"Hi\"}\ndata: {\"answer\":\" there\"}\n");
        assert_eq!(stream.collect().await.unwrap(), "Hi there");
    }

    #[tokio::test]
    async fn test_error_event_is_terminal() {
        let mut stream = one_chunk("data: {\"error\":\"rate limited\"}\n");
        let err = stream.next_fragment().await.unwrap_err();
        match err.downcast_ref::<RagChatError>() {
            Some(RagChatError::Answer(message)) => assert_eq!(message, "rate limited"),
            other => panic!("Expected Answer error, got {:?}", other),
        }
        // The error is delivered once; the stream is finished afterwards.
        assert_eq!(stream.next_fragment().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_error_suppresses_later_events() {
        let mut stream =
            one_chunk("data: {\"error\":\"boom\"}\ndata: {\"answer\":\"ignored\"}\n");
        assert!(stream.next_fragment().await.is_err());
        assert_eq!(stream.next_fragment().await.unwrap(), None);
        assert_eq!(stream.answer(), "");
    }

    #[tokio::test]
    async fn test_fragments_before_error_still_delivered() {
        let mut stream = one_chunk("data: {\"answer\":\"Hi\"}\ndata: {\"error\":\"boom\"}\n");
        assert_eq!(
            stream.next_fragment().await.unwrap(),
            Some("Hi".to_string())
        );
        assert!(stream.next_fragment().await.is_err());
        assert_eq!(stream.answer(), "Hi");
    }

    #[tokio::test]
    async fn test_empty_error_field_is_not_terminal() {
        let mut stream =
            one_chunk("data: {\"error\":\"\",\"answer\":\"ok\"}\ndata: {\"answer\":\"!\"}\n");
        let fragments = drain(&mut stream).await;
        assert_eq!(fragments, vec!["ok", "!"]);
    }

    #[tokio::test]
    async fn test_malformed_line_skipped() {
        let mut stream = one_chunk("data: {not json}\ndata: {\"answer\":\"fine\"}\n");
        let fragments = drain(&mut stream).await;
        assert_eq!(fragments, vec!["fine"]);
    }

    #[tokio::test]
    async fn test_non_data_lines_ignored() {
        let mut stream =
            one_chunk(": comment\nevent: ping\n\ndata: {\"answer\":\"real\"}\n");
        let fragments = drain(&mut stream).await;
        assert_eq!(fragments, vec!["real"]);
    }

    #[tokio::test]
    async fn test_fragment_split_across_chunks() {
        // The event line is split mid-payload; the partial line must be
        // carried into the next read.
        let mut stream = stream_of(vec![
            b"data: {\"ans".to_vec(),
            b"wer\":\"Hi\"}\ndata: {\"answer\":\" there\"}\n".to_vec(),
        ]);
        let fragments = drain(&mut stream).await;
        assert_eq!(fragments, vec!["Hi", " there"]);
    }

    #[tokio::test]
    async fn test_multibyte_split_across_chunks() {
        // U+00E9 is 0xC3 0xA9; split between its two bytes.
        let body = "data: {\"answer\":\"h\u{e9}llo\"}\n".as_bytes().to_vec();
        let split = body.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let (head, tail) = body.split_at(split);
        let mut stream = stream_of(vec![head.to_vec(), tail.to_vec()]);
        let fragments = drain(&mut stream).await;
        assert_eq!(fragments, vec!["h\u{e9}llo"]);
    }

    #[tokio::test]
    async fn test_four_byte_character_split_three_ways() {
        let body = "data: {\"answer\":\"ok \u{1F600}\"}\n".as_bytes().to_vec();
        let start = body.iter().position(|&b| b == 0xF0).unwrap();
        let mut stream = stream_of(vec![
            body[..start + 1].to_vec(),
            body[start + 1..start + 3].to_vec(),
            body[start + 3..].to_vec(),
        ]);
        let fragments = drain(&mut stream).await;
        assert_eq!(fragments, vec!["ok \u{1F600}"]);
    }

    #[tokio::test]
    async fn test_arbitrary_chunking_matches_one_shot_decode() {
        let body = "data: {\"answer\":\"na\u{ef}ve \u{2014} caf\u{e9}\"}\ndata: {\"answer\":\" \u{2764}\"}\n";
        let bytes = body.as_bytes();

        let whole = one_chunk(body).collect().await.unwrap();

        // Byte-at-a-time is the worst possible chunking.
        let chunks: Vec<Vec<u8>> = bytes.iter().map(|b| vec![*b]).collect();
        let trickled = stream_of(chunks).collect().await.unwrap();

        assert_eq!(whole, trickled);
        assert_eq!(whole, "na\u{ef}ve \u{2014} caf\u{e9} \u{2764}");
    }

    #[tokio::test]
    async fn test_empty_answer_fragment_emitted() {
        let mut stream = one_chunk("data: {\"answer\":\"\"}\n");
        assert_eq!(stream.next_fragment().await.unwrap(), Some(String::new()));
        assert_eq!(stream.next_fragment().await.unwrap(), None);
        assert_eq!(stream.answer(), "");
    }

    #[tokio::test]
    async fn test_unterminated_final_line_processed() {
        // No trailing newline: the line completes when the stream ends.
        let mut stream = one_chunk("data: {\"answer\":\"tail\"}");
        let fragments = drain(&mut stream).await;
        assert_eq!(fragments, vec!["tail"]);
    }

    #[tokio::test]
    async fn test_crlf_line_endings() {
        let mut stream = one_chunk("data: {\"answer\":\"Hi\"}\r\ndata: {\"answer\":\"!\"}\r\n");
        let fragments = drain(&mut stream).await;
        assert_eq!(fragments, vec!["Hi", "!"]);
    }

    #[tokio::test]
    async fn test_invalid_byte_replaced_not_fatal() {
        let mut body = b"data: {\"answer\":\"a".to_vec();
        body.push(0xFF);
        body.extend_from_slice(b"b\"}\n");
        let mut stream = stream_of(vec![body]);
        let fragments = drain(&mut stream).await;
        assert_eq!(fragments, vec![format!("a{}b", char::REPLACEMENT_CHARACTER)]);
    }

    #[tokio::test]
    async fn test_empty_stream_completes_with_empty_answer() {
        let mut stream = stream_of(vec![]);
        assert_eq!(stream.next_fragment().await.unwrap(), None);
        assert_eq!(stream.answer(), "");
    }
}
