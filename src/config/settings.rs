//! Configuration settings for Fortell.

use crate::audio::CueConfig;
use crate::crawl::ImageFilterConfig;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub runs: RunSettings,
    pub crawl: CrawlSettings,
    pub script: ScriptSettings,
    pub audio: AudioSettings,
    pub publish: PublishSettings,
    pub retry: RetryPolicy,
    pub prompts: PromptSettings,
}


/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.fortell".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Tier output roots. Each pipeline execution writes under
/// `{tier root}/{run_id}/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    pub bronze_dir: String,
    pub silver_dir: String,
    pub gold_dir: String,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            bronze_dir: "~/.fortell/runs/bronze".to_string(),
            silver_dir: "~/.fortell/runs/silver".to_string(),
            gold_dir: "~/.fortell/runs/gold".to_string(),
        }
    }
}

/// Page harvesting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    /// Extraction endpoint of the page-fetch engine.
    pub endpoint: String,
    /// Minimum relevance score for extracted text regions.
    pub relevance_threshold: f64,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Image descriptors with a longer description are dropped.
    pub max_image_desc_length: usize,
    /// Image descriptors matching any of these substrings are dropped.
    pub image_desc_denylist: Vec<String>,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        let filter = ImageFilterConfig::default();
        Self {
            endpoint: "http://127.0.0.1:11235/extract".to_string(),
            relevance_threshold: 1.2,
            request_timeout_secs: 120,
            max_image_desc_length: filter.max_desc_length,
            image_desc_denylist: filter.desc_denylist,
        }
    }
}

impl CrawlSettings {
    /// Image filter tunables derived from these settings.
    pub fn image_filter(&self) -> ImageFilterConfig {
        ImageFilterConfig {
            max_desc_length: self.max_image_desc_length,
            desc_denylist: self.image_desc_denylist.clone(),
        }
    }
}

/// Narration script generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
    /// LLM model for script generation.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.2,
        }
    }
}

/// Speech synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Synthesis endpoint of the speech service.
    pub endpoint: String,
    /// Voice identifier used for every section.
    pub voice: String,
    /// Minimum interval between synthesis requests, in seconds. Zero
    /// disables pacing.
    pub min_interval_secs: u64,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Subtitle cue grouping.
    pub cues: CueConfig,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5002/synthesize".to_string(),
            voice: "vi-VN-NamMinhNeural".to_string(),
            min_interval_secs: 5,
            request_timeout_secs: 300,
            cues: CueConfig::default(),
        }
    }
}

impl AudioSettings {
    /// Minimum inter-request interval as a duration.
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs(self.min_interval_secs)
    }
}

/// Publishing settings. The service key is read from the environment, never
/// from this file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishSettings {
    /// Supabase project URL.
    pub supabase_url: String,
    /// Storage bucket for audio and subtitle files.
    pub bucket: String,
    /// Key prefix under which each run's files are stored.
    pub parent_folder: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            supabase_url: "http://127.0.0.1:54321".to_string(),
            bucket: "fortell-dev".to_string(),
            parent_folder: "audio-guides".to_string(),
            request_timeout_secs: 120,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}


impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::FortellError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fortell")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Expanded Bronze tier root.
    pub fn bronze_dir(&self) -> PathBuf {
        Self::expand_path(&self.runs.bronze_dir)
    }

    /// Expanded Silver tier root.
    pub fn silver_dir(&self) -> PathBuf {
        Self::expand_path(&self.runs.silver_dir)
    }

    /// Expanded Gold tier root.
    pub fn gold_dir(&self) -> PathBuf {
        Self::expand_path(&self.runs.gold_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip_through_toml() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        let reparsed: Settings = toml::from_str(&toml).unwrap();
        assert_eq!(reparsed.audio.voice, "vi-VN-NamMinhNeural");
        assert_eq!(reparsed.audio.min_interval_secs, 5);
        assert_eq!(reparsed.crawl.max_image_desc_length, 10_000);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [audio]
            voice = "en-US-GuyNeural"
            "#,
        )
        .unwrap();

        assert_eq!(settings.audio.voice, "en-US-GuyNeural");
        assert_eq!(settings.audio.min_interval_secs, 5);
        assert_eq!(settings.script.model, "gpt-4o");
    }
}
