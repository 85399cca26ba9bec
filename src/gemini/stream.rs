//! Server-sent event decoding for streamGenerateContent

use futures::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;

use super::types::GenerateContentResponse;
use crate::error::AppError;

/// Incremental decoder for `text/event-stream` bodies
///
/// Feed raw body chunks with [`SseDecoder::push`]; complete events come back as
/// their joined `data:` payloads. Chunk boundaries may fall anywhere.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush whatever is left once the body ends
    pub fn finish(&mut self) -> Vec<String> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let raw = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&raw).trim_end_matches('\r').to_string();
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        if let Some(event) = self.dispatch() {
            events.push(event);
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if let Some(value) = line.strip_prefix("data:") {
            self.data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
        // Comments, event names and ids carry nothing we use
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.data).join("\n"))
    }
}

struct TextStreamState {
    body: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, AppError>>,
    finished: bool,
}

impl TextStreamState {
    fn enqueue(&mut self, payloads: Vec<String>) {
        for payload in payloads {
            match serde_json::from_str::<GenerateContentResponse>(&payload) {
                Ok(chunk) => {
                    let text = chunk.text();
                    if !text.is_empty() {
                        self.pending.push_back(Ok(text));
                    }
                }
                Err(e) => {
                    self.pending.push_back(Err(AppError::parse_error(format!(
                        "Malformed stream chunk: {}",
                        e
                    ))));
                    self.finished = true;
                    return;
                }
            }
        }
    }
}

/// Turn an SSE response body into the stream of text deltas it carries
///
/// Dropping the returned stream drops the body, which aborts the request.
pub fn text_stream(
    body: BoxStream<'static, reqwest::Result<Vec<u8>>>,
) -> BoxStream<'static, Result<String, AppError>> {
    let state = TextStreamState {
        body,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let payloads = state.decoder.push(&chunk);
                    state.enqueue(payloads);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    state.pending.push_back(Err(e.into()));
                }
                None => {
                    let payloads = state.decoder.finish();
                    state.enqueue(payloads);
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> String {
        let escaped = serde_json::to_string(text).unwrap();
        format!(
            "data: {{\"candidates\":[{{\"content\":{{\"parts\":[{{\"text\":{}}}]}}}}]}}\r\n\r\n",
            escaped
        )
    }

    #[test]
    fn test_decoder_handles_split_lines() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"a\"").is_empty());
        assert!(decoder.push(b":1}\r\n").is_empty());
        let events = decoder.push(b"\r\ndata: 2\n\n");
        assert_eq!(events, vec!["{\"a\":1}".to_string(), "2".to_string()]);
    }

    #[test]
    fn test_decoder_joins_multi_line_data_and_skips_comments() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b": keep-alive\nevent: message\ndata: one\ndata:two\n\n");
        assert_eq!(events, vec!["one\ntwo".to_string()]);
    }

    #[test]
    fn test_decoder_flushes_unterminated_event() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), vec!["tail".to_string()]);
        assert!(decoder.finish().is_empty());
    }

    #[tokio::test]
    async fn test_text_stream_yields_deltas_across_chunks() {
        let body = format!("{}{}", chunk("[{\"name\""), chunk(":\"Fire\"}]"));
        let (left, right) = body.as_bytes().split_at(17);
        let chunks: Vec<reqwest::Result<Vec<u8>>> = vec![Ok(left.to_vec()), Ok(right.to_vec())];

        let texts: Vec<_> = text_stream(stream::iter(chunks).boxed()).collect().await;
        let texts: Vec<String> = texts.into_iter().map(|t| t.unwrap()).collect();
        assert_eq!(texts, vec!["[{\"name\"".to_string(), ":\"Fire\"}]".to_string()]);
    }

    #[tokio::test]
    async fn test_text_stream_reports_malformed_chunk_once() {
        let chunks: Vec<reqwest::Result<Vec<u8>>> =
            vec![Ok(b"data: not json\n\ndata: {}\n\n".to_vec())];

        let items: Vec<_> = text_stream(stream::iter(chunks).boxed()).collect().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }
}
