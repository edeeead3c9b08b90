//! Data model for places and their enrichment tiers.
//!
//! A place's data moves through three tiers as the pipeline runs:
//!
//! - **Bronze**: raw harvest (page text + filtered image URLs + coordinates)
//! - **Silver**: Bronze + the generated narration script
//! - **Gold**: Silver + the narrated audio guides
//!
//! Each tier embeds the previous one (`#[serde(flatten)]`), so the persisted
//! JSON stays flat and a Gold file still parses as Silver or Bronze. Tiers
//! are extended with the consuming `with_*` methods; a tier is never mutated
//! after it has been written.

use crate::error::{FortellError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Crawl targets for one place, loaded from a JSON config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceConfig {
    /// Place name. Unique within a run; also the tier file stem.
    pub name: String,
    /// Coordinates as a "lat, lon" string.
    pub location: String,
    /// Source pages to harvest, in order.
    pub urls: Vec<String>,
}

impl PlaceConfig {
    /// Load a place config from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FortellError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: PlaceConfig = serde_json::from_str(&content)
            .map_err(|e| FortellError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the config invariants.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(FortellError::Config("place name is empty".to_string()));
        }
        if self.urls.is_empty() {
            return Err(FortellError::Config(format!(
                "place '{}' has no URLs to crawl",
                self.name
            )));
        }
        self.coordinates()?;
        Ok(())
    }

    /// Parse the `location` string into (latitude, longitude).
    pub fn coordinates(&self) -> Result<(f64, f64)> {
        let parts: Vec<&str> = self.location.split(',').collect();
        if parts.len() != 2 {
            return Err(FortellError::Config(format!(
                "location '{}' must be 'lat, lon'",
                self.location
            )));
        }
        let latitude: f64 = parts[0].trim().parse().map_err(|_| {
            FortellError::Config(format!("invalid latitude in '{}'", self.location))
        })?;
        let longitude: f64 = parts[1].trim().parse().map_err(|_| {
            FortellError::Config(format!("invalid longitude in '{}'", self.location))
        })?;
        Ok((latitude, longitude))
    }
}

/// First durable tier: the raw harvest of a place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceDataBronze {
    /// Place name, shared with the config.
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Extracted page text, one block per URL in crawl order, each block
    /// prefixed by its source URL.
    pub content: String,
    /// Filtered image URLs. Duplicates across source pages are preserved.
    pub images: Vec<String>,
}

impl PlaceDataBronze {
    /// Extend Bronze with a narration script, producing Silver.
    pub fn with_script(self, script: String) -> PlaceDataSilver {
        PlaceDataSilver {
            bronze: self,
            script,
        }
    }
}

/// Second tier: Bronze plus the generated narration script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceDataSilver {
    #[serde(flatten)]
    pub bronze: PlaceDataBronze,
    /// Raw narration text with `#`-marked section headers.
    pub script: String,
}

impl PlaceDataSilver {
    /// Extend Silver with narrated audio guides, producing Gold.
    pub fn with_audio_guides(self, audio_guides: Vec<AudioGuide>) -> PlaceDataGold {
        PlaceDataGold {
            silver: self,
            audio_guides,
        }
    }
}

/// Final tier: Silver plus one audio guide per script section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceDataGold {
    #[serde(flatten)]
    pub silver: PlaceDataSilver,
    /// Ordered to match section numbering; length equals the section count.
    pub audio_guides: Vec<AudioGuide>,
}

/// One published narrated section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioGuide {
    /// Section title.
    pub title: String,
    /// The section's full source text.
    pub full_subtitle: String,
    /// Local path while composing; durable storage URL after publishing.
    pub audio_url: String,
    /// Measured from the encoded audio, truncated to whole seconds.
    pub duration_seconds: u64,
    /// Local path while composing; durable storage URL after publishing.
    pub subtitle_url: String,
}

/// A titled chunk of the narration script. Transient: produced by the section
/// parser, consumed by the audio composer, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioScriptSection {
    /// 1-based, assigned in parse order.
    pub number: usize,
    /// First line of the section body.
    pub title: String,
    /// Remaining lines.
    pub content: String,
}

impl AudioScriptSection {
    /// Deterministic file stem shared by this section's audio and subtitle
    /// files: `{two-digit number}_{title with spaces replaced by hyphens}`.
    pub fn file_stem(&self) -> String {
        format!("{:02}_{}", self.number, self.title.replace(' ', "-"))
    }
}
