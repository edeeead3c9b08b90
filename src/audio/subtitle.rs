//! SRT subtitle derivation from word-boundary events.
//!
//! The speech synthesizer reports one timing event per spoken word. The
//! builder groups consecutive words into cues and renders a SubRip track
//! whose cue timestamps are strictly increasing and never overlap.

use super::WordBoundary;
use serde::{Deserialize, Serialize};

/// Cue grouping tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CueConfig {
    /// Maximum words per cue.
    pub max_words_per_cue: usize,
    /// A silence gap longer than this (milliseconds) starts a new cue.
    pub max_gap_ms: u64,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            max_words_per_cue: 8,
            max_gap_ms: 1000,
        }
    }
}

/// Accumulates word boundaries and renders an SRT track.
pub struct SubtitleBuilder {
    config: CueConfig,
    cues: Vec<Cue>,
    current: Option<Cue>,
}

#[derive(Debug, Clone)]
struct Cue {
    start_ms: u64,
    end_ms: u64,
    words: Vec<String>,
}

impl SubtitleBuilder {
    pub fn new(config: CueConfig) -> Self {
        Self {
            config,
            cues: Vec::new(),
            current: None,
        }
    }

    /// Feed one word-boundary event. Events must arrive in spoken order.
    pub fn feed(&mut self, word: &WordBoundary) {
        let word_end = word.offset_ms + word.duration_ms;

        match self.current.as_mut() {
            Some(cue)
                if cue.words.len() < self.config.max_words_per_cue
                    && word.offset_ms.saturating_sub(cue.end_ms) <= self.config.max_gap_ms =>
            {
                cue.words.push(word.text.clone());
                cue.end_ms = cue.end_ms.max(word_end);
            }
            _ => {
                if let Some(done) = self.current.take() {
                    self.cues.push(done);
                }
                self.current = Some(Cue {
                    start_ms: word.offset_ms,
                    end_ms: word_end,
                    words: vec![word.text.clone()],
                });
            }
        }
    }

    /// Render the accumulated cues as an SRT document.
    ///
    /// Rendering clamps each cue to start strictly after the previous cue
    /// ends, so timestamps are strictly increasing and non-overlapping even
    /// when the synthesizer reports touching word timings.
    pub fn build(mut self) -> String {
        if let Some(done) = self.current.take() {
            self.cues.push(done);
        }

        let mut output = String::new();
        let mut prev_end_ms: Option<u64> = None;

        for (i, cue) in self.cues.iter().enumerate() {
            let mut start_ms = cue.start_ms;
            if let Some(prev) = prev_end_ms {
                start_ms = start_ms.max(prev + 1);
            }
            let end_ms = cue.end_ms.max(start_ms + 1);
            prev_end_ms = Some(end_ms);

            output.push_str(&format!("{}\n", i + 1));
            output.push_str(&format!(
                "{} --> {}\n",
                format_srt_timestamp(start_ms),
                format_srt_timestamp(end_ms)
            ));
            output.push_str(&cue.words.join(" "));
            output.push_str("\n\n");
        }

        output
    }
}

/// Format milliseconds for SRT (00:00:00,000).
fn format_srt_timestamp(total_ms: u64) -> String {
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, ms)
}
