//! Audio guide composition for Fortell.
//!
//! Converts a Silver script into Gold: each parsed section is synthesized to
//! speech, its word timings become an SRT subtitle track, and the measured
//! clip duration is recorded. Audio and subtitle files share a deterministic
//! stem so they can always be paired by name alone.

mod duration;
mod pacing;
mod speech;
mod subtitle;

pub use duration::{DurationProbe, FfprobeDurationProbe};
pub use pacing::SynthesisPacer;
pub use speech::SpeechServiceClient;
pub use subtitle::{CueConfig, SubtitleBuilder};

use crate::artifact::RunScope;
use crate::error::{FortellError, Result};
use crate::place::{AudioGuide, PlaceDataGold, PlaceDataSilver};
use crate::script::parse_sections;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

/// One event from the synthesis stream.
#[derive(Debug, Clone)]
pub enum SynthesisEvent {
    /// A chunk of encoded audio.
    Audio(Vec<u8>),
    /// Timing of one spoken word.
    WordBoundary(WordBoundary),
}

/// Timing of one spoken word, relative to the start of the clip.
#[derive(Debug, Clone)]
pub struct WordBoundary {
    pub offset_ms: u64,
    pub duration_ms: u64,
    pub text: String,
}

/// Trait for the external speech-synthesis service.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` in the given voice, returning the ordered event
    /// stream: audio chunks plus word boundaries.
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<SynthesisEvent>>;
}

/// Composes Gold data from Silver.
pub struct AudioComposer {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    probe: Arc<dyn DurationProbe>,
    pacer: SynthesisPacer,
    voice: String,
    cues: CueConfig,
}

impl AudioComposer {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        probe: Arc<dyn DurationProbe>,
        pacer: SynthesisPacer,
        voice: &str,
        cues: CueConfig,
    ) -> Self {
        Self {
            synthesizer,
            probe,
            pacer,
            voice: voice.to_string(),
            cues,
        }
    }

    /// Synthesize every section of the Silver script and merge the results
    /// into Gold.
    ///
    /// Sections are processed strictly one at a time, each call gated by the
    /// pacer. Any section failure fails the whole composition: Gold is only
    /// ever produced with one guide per section, in section order.
    #[instrument(skip(self, silver, scope), fields(place = %silver.bronze.name))]
    pub async fn compose(
        &self,
        silver: PlaceDataSilver,
        scope: &RunScope,
    ) -> Result<PlaceDataGold> {
        let sections = parse_sections(&silver.script)?;
        scope.ensure_dir()?;

        let mut audio_guides = Vec::with_capacity(sections.len());

        for section in &sections {
            self.pacer.ready().await;

            info!(
                "Synthesizing section {:02} '{}' with voice '{}'",
                section.number, section.title, self.voice
            );

            let events = self
                .synthesizer
                .synthesize(&section.content, &self.voice)
                .await?;

            let mut audio = Vec::new();
            let mut subtitles = SubtitleBuilder::new(self.cues.clone());
            for event in events {
                match event {
                    SynthesisEvent::Audio(bytes) => audio.extend_from_slice(&bytes),
                    SynthesisEvent::WordBoundary(word) => subtitles.feed(&word),
                }
            }

            if audio.is_empty() {
                return Err(FortellError::Synthesis(format!(
                    "section '{}' produced no audio",
                    section.title
                )));
            }

            let stem = section.file_stem();
            let audio_path = scope.artifact_path(&format!("{}.mp3", stem))?;
            let subtitle_path = scope.artifact_path(&format!("{}.srt", stem))?;

            std::fs::write(&audio_path, &audio)?;
            std::fs::write(&subtitle_path, subtitles.build())?;

            let measured = self.probe.duration_seconds(&audio_path).await?;
            let duration_seconds = duration::truncate_seconds(measured);

            info!(
                "Section {:02}: {} bytes of audio, {} seconds",
                section.number,
                audio.len(),
                duration_seconds
            );

            audio_guides.push(AudioGuide {
                title: section.title.clone(),
                full_subtitle: section.content.clone(),
                audio_url: audio_path.to_string_lossy().into_owned(),
                duration_seconds,
                subtitle_url: subtitle_path.to_string_lossy().into_owned(),
            });
        }

        Ok(silver.with_audio_guides(audio_guides))
    }
}
