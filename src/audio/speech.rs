//! HTTP client for the external speech-synthesis service.
//!
//! The service streams newline-delimited JSON events: audio chunks carrying
//! base64-encoded bytes, and word-boundary events carrying timing for the
//! subtitle builder.

use super::{SpeechSynthesizer, SynthesisEvent, WordBoundary};
use crate::error::{FortellError, Result};
use crate::retry::{self, RetryPolicy};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Client for the speech-service synthesis endpoint.
pub struct SpeechServiceClient {
    http: reqwest::Client,
    endpoint: String,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    voice: &'a str,
}

/// Wire format of one streamed event line.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    Audio { data: String },
    WordBoundary {
        offset_ms: u64,
        duration_ms: u64,
        text: String,
    },
}

impl SpeechServiceClient {
    /// Create a client for the given synthesis endpoint.
    pub fn new(endpoint: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FortellError::Synthesis(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            retry,
        })
    }

    async fn stream_events(&self, request: &SynthesisRequest<'_>) -> Result<Vec<SynthesisEvent>> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        let mut events = Vec::new();
        let mut buffer = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            buffer.extend_from_slice(&chunk?);

            while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline).collect();
                if let Some(event) = parse_line(&line[..line.len() - 1])? {
                    events.push(event);
                }
            }
        }

        // Final line without a trailing newline.
        if let Some(event) = parse_line(&buffer)? {
            events.push(event);
        }

        Ok(events)
    }
}

fn parse_line(line: &[u8]) -> Result<Option<SynthesisEvent>> {
    let text = std::str::from_utf8(line)
        .map_err(|e| FortellError::Synthesis(format!("non-UTF8 event line: {}", e)))?;
    if text.trim().is_empty() {
        return Ok(None);
    }

    let wire: WireEvent = serde_json::from_str(text)
        .map_err(|e| FortellError::Synthesis(format!("bad event line: {}", e)))?;

    let event = match wire {
        WireEvent::Audio { data } => {
            let bytes = BASE64
                .decode(data.as_bytes())
                .map_err(|e| FortellError::Synthesis(format!("bad audio chunk: {}", e)))?;
            SynthesisEvent::Audio(bytes)
        }
        WireEvent::WordBoundary {
            offset_ms,
            duration_ms,
            text,
        } => SynthesisEvent::WordBoundary(WordBoundary {
            offset_ms,
            duration_ms,
            text,
        }),
    };

    Ok(Some(event))
}

#[async_trait::async_trait]
impl SpeechSynthesizer for SpeechServiceClient {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<SynthesisEvent>> {
        debug!(
            "Synthesizing {} characters with voice '{}'",
            text.len(),
            voice
        );

        let request = SynthesisRequest { text, voice };

        retry::with_backoff(&self.retry, "speech synthesis", || {
            self.stream_events(&request)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_audio_line() {
        let encoded = BASE64.encode(b"mp3bytes");
        let line = format!(r#"{{"type":"audio","data":"{}"}}"#, encoded);

        let event = parse_line(line.as_bytes()).unwrap().unwrap();
        match event {
            SynthesisEvent::Audio(bytes) => assert_eq!(bytes, b"mp3bytes"),
            other => panic!("expected audio event, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_word_boundary_line() {
        let line = r#"{"type":"word_boundary","offset_ms":120,"duration_ms":80,"text":"villa"}"#;

        let event = parse_line(line.as_bytes()).unwrap().unwrap();
        match event {
            SynthesisEvent::WordBoundary(wb) => {
                assert_eq!(wb.offset_ms, 120);
                assert_eq!(wb.duration_ms, 80);
                assert_eq!(wb.text, "villa");
            }
            other => panic!("expected word boundary, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_lines_skipped() {
        assert!(parse_line(b"").unwrap().is_none());
        assert!(parse_line(b"   ").unwrap().is_none());
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        assert!(parse_line(b"{\"type\":\"unknown\"}").is_err());
        assert!(parse_line(b"not json").is_err());
    }
}
