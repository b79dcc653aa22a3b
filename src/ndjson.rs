//! Newline-delimited JSON processing for streaming responses.
//!
//! The chat route streams one JSON object per line.  This module turns the raw byte stream of an
//! HTTP response into a stream of text fragments, in arrival order, ending at the chunk marked
//! `done` or at the end of the body.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::types::ChatChunk;
use crate::{Error, Result};

/// Process a stream of bytes into a stream of text fragments.
///
/// Transport errors and malformed lines end the stream after yielding a single error.
pub fn process_ndjson<S, E>(byte_stream: S) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + Unpin + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    // Convert transport errors to our error type
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    stream::unfold(
        (stream, NdjsonDecoder::default()),
        move |(mut stream, mut decoder)| async move {
            loop {
                // First check if we have a complete fragment in the buffer
                if let Some(fragment) = decoder.next_fragment() {
                    return Some((fragment, (stream, decoder)));
                }
                if decoder.is_finished() {
                    return None;
                }

                // Read more data
                match stream.next().await {
                    Some(Ok(bytes)) => decoder.push(&bytes),
                    Some(Err(e)) => {
                        decoder.finish();
                        return Some((Err(e), (stream, decoder)));
                    }
                    None => decoder.end_of_input(),
                }
            }
        },
    )
}

/// Incremental decoder for newline-delimited chat chunks.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buffer: Vec<u8>,
    eof: bool,
    finished: bool,
}

impl NdjsonDecoder {
    /// Append raw bytes received from the transport.
    pub fn push(&mut self, bytes: &[u8]) {
        if !self.finished {
            self.buffer.extend_from_slice(bytes);
        }
    }

    /// Mark the end of the transport stream.  A trailing line without a newline is still decoded.
    pub fn end_of_input(&mut self) {
        self.eof = true;
    }

    /// True once no further fragments will be produced.
    pub fn is_finished(&self) -> bool {
        self.finished || (self.eof && self.buffer.iter().all(u8::is_ascii_whitespace))
    }

    fn finish(&mut self) {
        self.finished = true;
        self.buffer.clear();
    }

    /// Produce the next fragment that can be decoded from buffered bytes.
    ///
    /// Returns `None` when more input is needed or the stream is finished.
    pub fn next_fragment(&mut self) -> Option<Result<String>> {
        while !self.finished {
            let line: Vec<u8> = match self.buffer.iter().position(|b| *b == b'\n') {
                Some(pos) => self.buffer.drain(..=pos).collect(),
                None if self.eof && !self.buffer.is_empty() => std::mem::take(&mut self.buffer),
                None => return None,
            };
            let chunk = match decode_line(&line) {
                Ok(Some(chunk)) => chunk,
                Ok(None) => continue,
                Err(err) => {
                    self.finish();
                    return Some(Err(err));
                }
            };
            if let Some(message) = chunk.error {
                self.finish();
                return Some(Err(Error::streaming(message, None)));
            }
            if chunk.done {
                self.finish();
            }
            if !chunk.text().is_empty() {
                return Some(Ok(chunk.text().to_string()));
            }
        }
        None
    }
}

/// Decode a single line.  Blank lines decode to `None`.
fn decode_line(line: &[u8]) -> Result<Option<ChatChunk>> {
    let text = std::str::from_utf8(line)?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    serde_json::from_str::<ChatChunk>(text)
        .map(Some)
        .map_err(|e| {
            Error::serialization(
                format!("Failed to parse stream chunk '{text}': {e}"),
                Some(Box::new(e)),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, done: bool) -> String {
        format!(
            "{{\"message\":{{\"role\":\"assistant\",\"content\":{}}},\"done\":{}}}\n",
            serde_json::to_string(text).unwrap(),
            done
        )
    }

    fn collect(decoder: &mut NdjsonDecoder) -> Vec<Result<String>> {
        let mut out = Vec::new();
        while let Some(fragment) = decoder.next_fragment() {
            out.push(fragment);
        }
        out
    }

    #[test]
    fn decodes_fragments_in_order() {
        let mut decoder = NdjsonDecoder::default();
        decoder.push(chunk("Hel", false).as_bytes());
        decoder.push(chunk("lo!", false).as_bytes());
        decoder.push(chunk("", true).as_bytes());
        let fragments: Vec<String> = collect(&mut decoder)
            .into_iter()
            .map(|f| f.unwrap())
            .collect();
        assert_eq!(fragments, vec!["Hel".to_string(), "lo!".to_string()]);
        assert!(decoder.is_finished());
    }

    #[test]
    fn waits_for_partial_lines() {
        let mut decoder = NdjsonDecoder::default();
        let line = chunk("partial", false);
        let (head, tail) = line.split_at(10);
        decoder.push(head.as_bytes());
        assert!(decoder.next_fragment().is_none());
        assert!(!decoder.is_finished());
        decoder.push(tail.as_bytes());
        assert_eq!(decoder.next_fragment().unwrap().unwrap(), "partial");
    }

    #[test]
    fn multibyte_text_split_across_pushes() {
        let mut decoder = NdjsonDecoder::default();
        let line = chunk("héllo", false);
        let bytes = line.as_bytes();
        let split = line.find('é').unwrap() + 1;
        decoder.push(&bytes[..split]);
        assert!(decoder.next_fragment().is_none());
        decoder.push(&bytes[split..]);
        assert_eq!(decoder.next_fragment().unwrap().unwrap(), "héllo");
    }

    #[test]
    fn trailing_line_without_newline() {
        let mut decoder = NdjsonDecoder::default();
        let line = chunk("tail", true);
        decoder.push(line.trim_end().as_bytes());
        assert!(decoder.next_fragment().is_none());
        decoder.end_of_input();
        assert_eq!(decoder.next_fragment().unwrap().unwrap(), "tail");
        assert!(decoder.is_finished());
    }

    #[test]
    fn malformed_line_is_an_error() {
        let mut decoder = NdjsonDecoder::default();
        decoder.push(b"not json\n");
        decoder.push(chunk("ignored", false).as_bytes());
        let out = collect(&mut decoder);
        assert_eq!(out.len(), 1);
        assert!(out[0].as_ref().unwrap_err().is_serialization());
    }

    #[test]
    fn error_chunk_ends_stream() {
        let mut decoder = NdjsonDecoder::default();
        decoder.push(b"{\"error\":\"out of memory\"}\n");
        let out = collect(&mut decoder);
        assert_eq!(out.len(), 1);
        assert!(out[0].as_ref().unwrap_err().to_string().contains("out of memory"));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let mut decoder = NdjsonDecoder::default();
        decoder.push(b"\n\r\n");
        decoder.push(chunk("x", false).as_bytes());
        assert_eq!(decoder.next_fragment().unwrap().unwrap(), "x");
    }

    #[tokio::test]
    async fn process_ndjson_stream() {
        let parts: Vec<std::result::Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from(chunk("Hel", false))),
            Ok(Bytes::from(chunk("lo!", false))),
            Ok(Bytes::from(chunk("", true))),
        ];
        let fragments: Vec<String> = process_ndjson(stream::iter(parts))
            .map(|f| f.unwrap())
            .collect()
            .await;
        assert_eq!(fragments.concat(), "Hello!");
    }

    #[tokio::test]
    async fn transport_error_is_reported() {
        let parts: Vec<std::result::Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from(chunk("Hel", false))),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];
        let out: Vec<Result<String>> = process_ndjson(stream::iter(parts)).collect().await;
        assert_eq!(out.len(), 2);
        assert!(out[0].is_ok());
        assert!(matches!(out[1], Err(Error::Streaming { .. })));
    }
}
