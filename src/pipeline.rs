//! Pipeline orchestration for Fortell.
//!
//! Coordinates the four stages of one place's run: crawl (Bronze), script
//! (Silver), audio (Gold), publish. Stages run strictly in order; a failed
//! stage halts the place's run and leaves earlier tier files untouched, so a
//! retry can resume from the last good tier.

use crate::artifact::{read_tier, RunScope};
use crate::audio::{
    AudioComposer, DurationProbe, FfprobeDurationProbe, SpeechServiceClient, SpeechSynthesizer,
    SynthesisPacer,
};
use crate::config::{Prompts, Settings};
use crate::crawl::{self, FetchEngineClient, FetchOptions, PageFetcher};
use crate::error::{FortellError, Result};
use crate::place::{PlaceConfig, PlaceDataBronze, PlaceDataGold, PlaceDataSilver};
use crate::publish::{
    ObjectStore, PlaceStore, PublishReport, Publisher, SupabasePlaceStore, SupabaseStorage,
};
use crate::script::{self, OpenAiScriptGenerator, ScriptGenerator};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// The main pipeline for one or more place runs.
pub struct Pipeline {
    settings: Settings,
    prompts: Prompts,
    fetcher: Arc<dyn PageFetcher>,
    generator: Arc<dyn ScriptGenerator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    probe: Arc<dyn DurationProbe>,
    // Publish collaborators are created on demand in `run_publish` (their
    // service key lives in the environment), unless injected for tests.
    store: Option<Arc<dyn ObjectStore>>,
    database: Option<Arc<dyn PlaceStore>>,
}

/// Paths and results of a full run of one place.
#[derive(Debug)]
pub struct RunOutcome {
    pub run_id: String,
    pub bronze_path: PathBuf,
    pub silver_path: PathBuf,
    pub gold_path: PathBuf,
    pub report: Option<PublishReport>,
}

impl Pipeline {
    /// Create a pipeline with collaborators built from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let fetcher = Arc::new(FetchEngineClient::new(
            &settings.crawl.endpoint,
            Duration::from_secs(settings.crawl.request_timeout_secs),
            settings.retry.clone(),
        )?);

        let generator = Arc::new(OpenAiScriptGenerator::new(
            &settings.script.model,
            settings.script.temperature,
            settings.retry.clone(),
        ));

        let synthesizer = Arc::new(SpeechServiceClient::new(
            &settings.audio.endpoint,
            Duration::from_secs(settings.audio.request_timeout_secs),
            settings.retry.clone(),
        )?);

        Ok(Self {
            settings,
            prompts,
            fetcher,
            generator,
            synthesizer,
            probe: Arc::new(FfprobeDurationProbe),
            store: None,
            database: None,
        })
    }

    /// Create a pipeline with custom collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        fetcher: Arc<dyn PageFetcher>,
        generator: Arc<dyn ScriptGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        probe: Arc<dyn DurationProbe>,
        store: Arc<dyn ObjectStore>,
        database: Arc<dyn PlaceStore>,
    ) -> Self {
        Self {
            settings,
            prompts,
            fetcher,
            generator,
            synthesizer,
            probe,
            store: Some(store),
            database: Some(database),
        }
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Crawl a place's URLs and write the Bronze tier file.
    #[instrument(skip(self), fields(config = %config_path.display(), run_id = %run_id))]
    pub async fn run_crawl(&self, config_path: &Path, run_id: &str) -> Result<PathBuf> {
        let place = PlaceConfig::load(config_path)?;
        let (latitude, longitude) = place.coordinates()?;

        info!("Crawling {} URLs for '{}'", place.urls.len(), place.name);

        let options = FetchOptions::for_place(&place.name, self.settings.crawl.relevance_threshold);
        let harvest = crawl::harvest(self.fetcher.as_ref(), &place, &options, |done, total| {
            debug!("Crawl progress: {}/{}", done, total);
        })
        .await?;

        let images = crawl::filter_images(&harvest.images, &self.settings.crawl.image_filter())?;
        info!("Kept {} image URLs after filtering", images.len());

        let bronze = PlaceDataBronze {
            name: place.name.clone(),
            latitude,
            longitude,
            content: harvest.content,
            images,
        };

        let scope = RunScope::new(self.settings.bronze_dir(), run_id)?;
        let path = scope.write_place(&bronze.name, &bronze)?;
        info!("Bronze written to {}", path.display());
        Ok(path)
    }

    /// Generate the narration script for a Bronze file and write Silver.
    #[instrument(skip(self), fields(bronze = %bronze_path.display(), run_id = %run_id))]
    pub async fn run_script(&self, bronze_path: &Path, run_id: &str) -> Result<PathBuf> {
        let bronze: PlaceDataBronze = read_tier(bronze_path)?;

        let silver =
            script::compose_silver(self.generator.as_ref(), &self.prompts, bronze).await?;

        let name = silver.bronze.name.clone();
        let scope = RunScope::new(self.settings.silver_dir(), run_id)?;
        let path = scope.write_place(&name, &silver)?;
        info!("Silver written to {}", path.display());
        Ok(path)
    }

    /// Synthesize audio guides for a Silver file and write Gold.
    #[instrument(skip(self), fields(silver = %silver_path.display(), run_id = %run_id))]
    pub async fn run_audio(&self, silver_path: &Path, run_id: &str) -> Result<PathBuf> {
        let silver: PlaceDataSilver = read_tier(silver_path)?;

        let composer = AudioComposer::new(
            self.synthesizer.clone(),
            self.probe.clone(),
            SynthesisPacer::new(self.settings.audio.min_interval()),
            &self.settings.audio.voice,
            self.settings.audio.cues.clone(),
        );

        let scope = RunScope::new(self.settings.gold_dir(), run_id)?;
        let gold = composer.compose(silver, &scope).await?;

        let name = gold.silver.bronze.name.clone();
        let path = scope.write_place(&name, &gold)?;
        info!(
            "Gold written to {} ({} guides)",
            path.display(),
            gold.audio_guides.len()
        );
        Ok(path)
    }

    /// Publish a Gold file to object storage and the place database.
    #[instrument(skip(self), fields(gold = %gold_path.display(), run_id = %run_id))]
    pub async fn run_publish(&self, gold_path: &Path, run_id: &str) -> Result<PublishReport> {
        let gold: PlaceDataGold = read_tier(gold_path)?;

        let (store, database) = self.publish_collaborators()?;
        let publisher = Publisher::new(store, database, &self.settings.publish.parent_folder);

        let report = publisher.publish(&gold, run_id).await?;
        info!(
            "Published '{}': {} guides (place id {})",
            gold.silver.bronze.name, report.guides_published, report.place_id
        );
        Ok(report)
    }

    /// Run the full chain for one place. Stops after Gold when `publish` is
    /// false.
    pub async fn run_all(
        &self,
        config_path: &Path,
        run_id: &str,
        publish: bool,
    ) -> Result<RunOutcome> {
        let bronze_path = self.run_crawl(config_path, run_id).await?;
        let silver_path = self.run_script(&bronze_path, run_id).await?;
        let gold_path = self.run_audio(&silver_path, run_id).await?;

        let report = if publish {
            Some(self.run_publish(&gold_path, run_id).await?)
        } else {
            None
        };

        Ok(RunOutcome {
            run_id: run_id.to_string(),
            bronze_path,
            silver_path,
            gold_path,
            report,
        })
    }

    fn publish_collaborators(&self) -> Result<(Arc<dyn ObjectStore>, Arc<dyn PlaceStore>)> {
        if let (Some(store), Some(database)) = (&self.store, &self.database) {
            return Ok((store.clone(), database.clone()));
        }

        let publish = &self.settings.publish;
        let timeout = Duration::from_secs(publish.request_timeout_secs);

        let store = Arc::new(SupabaseStorage::new(
            &publish.supabase_url,
            &publish.bucket,
            timeout,
            self.settings.retry.clone(),
        )?);
        let database = Arc::new(SupabasePlaceStore::new(
            &publish.supabase_url,
            timeout,
            self.settings.retry.clone(),
        )?);

        Ok((store, database))
    }
}

/// Infer a run id from a tier file path (`{root}/{run_id}/{name}.json`).
pub fn infer_run_id(tier_path: &Path) -> Result<String> {
    tier_path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            FortellError::InvalidInput(format!(
                "cannot infer run id from '{}'; pass --run-id",
                tier_path.display()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{SynthesisEvent, WordBoundary};
    use crate::crawl::{ImageDescriptor, PageExtract};
    use crate::place::AudioGuide;
    use crate::publish::PlaceRecord;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeFetcher;

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str, _options: &FetchOptions) -> Result<PageExtract> {
            Ok(PageExtract {
                markdown: format!("extract of {}", url),
                images: vec![
                    ImageDescriptor {
                        src: "/content.jpg".to_string(),
                        desc: "the villa".to_string(),
                        width: None,
                    },
                    ImageDescriptor {
                        src: "/icon.png".to_string(),
                        desc: "icon".to_string(),
                        width: Some(32),
                    },
                ],
            })
        }
    }

    struct FakeGenerator;

    #[async_trait]
    impl ScriptGenerator for FakeGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok("# Intro\nWelcome to the villa.\n# History\nBuilt long ago.".to_string())
        }
    }

    struct FakeSynthesizer;

    #[async_trait]
    impl SpeechSynthesizer for FakeSynthesizer {
        async fn synthesize(&self, text: &str, _voice: &str) -> Result<Vec<SynthesisEvent>> {
            let mut events = vec![SynthesisEvent::Audio(vec![1, 2, 3])];
            for (i, word) in text.split_whitespace().enumerate() {
                events.push(SynthesisEvent::WordBoundary(WordBoundary {
                    offset_ms: i as u64 * 200,
                    duration_ms: 150,
                    text: word.to_string(),
                }));
            }
            Ok(events)
        }
    }

    struct FakeProbe;

    #[async_trait]
    impl DurationProbe for FakeProbe {
        async fn duration_seconds(&self, _path: &Path) -> Result<f64> {
            Ok(7.9)
        }
    }

    #[derive(Default)]
    struct FakeStore;

    #[async_trait]
    impl ObjectStore for FakeStore {
        async fn upload(&self, _local: &Path, remote_key: &str) -> Result<String> {
            Ok(format!("https://cdn.example.com/{}", remote_key))
        }
    }

    #[derive(Default)]
    struct FakeDatabase {
        guides: Mutex<Vec<AudioGuide>>,
    }

    #[async_trait]
    impl PlaceStore for FakeDatabase {
        async fn upsert_place(&self, _place: &PlaceRecord) -> Result<String> {
            Ok("place-1".to_string())
        }

        async fn replace_audio_guides(
            &self,
            _place_id: &str,
            guides: &[AudioGuide],
        ) -> Result<()> {
            *self.guides.lock().unwrap() = guides.to_vec();
            Ok(())
        }
    }

    fn test_settings(root: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.runs.bronze_dir = root.join("bronze").to_string_lossy().into_owned();
        settings.runs.silver_dir = root.join("silver").to_string_lossy().into_owned();
        settings.runs.gold_dir = root.join("gold").to_string_lossy().into_owned();
        settings.audio.min_interval_secs = 0;
        settings
    }

    fn test_pipeline(root: &Path, database: Arc<FakeDatabase>) -> Pipeline {
        Pipeline::with_components(
            test_settings(root),
            Prompts::default(),
            Arc::new(FakeFetcher),
            Arc::new(FakeGenerator),
            Arc::new(FakeSynthesizer),
            Arc::new(FakeProbe),
            Arc::new(FakeStore),
            database,
        )
    }

    fn write_config(dir: &Path) -> PathBuf {
        let path = dir.join("villa.json");
        std::fs::write(
            &path,
            r#"{
                "name": "White Villa",
                "location": "10.3460, 107.0843",
                "urls": ["http://site.com/villa", "http://site.com/history"]
            }"#,
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn test_full_run_produces_all_tiers() {
        let tmp = tempfile::tempdir().unwrap();
        let database = Arc::new(FakeDatabase::default());
        let pipeline = test_pipeline(tmp.path(), database.clone());
        let config_path = write_config(tmp.path());

        let outcome = pipeline
            .run_all(&config_path, "run-1", true)
            .await
            .unwrap();

        // Tier files land under {tier root}/{run_id}/{name}.json.
        assert!(outcome
            .bronze_path
            .ends_with("bronze/run-1/White Villa.json"));
        assert!(outcome
            .silver_path
            .ends_with("silver/run-1/White Villa.json"));
        assert!(outcome.gold_path.ends_with("gold/run-1/White Villa.json"));

        // Gold round-trip: guides count equals the parsed section count.
        let gold: PlaceDataGold = read_tier(&outcome.gold_path).unwrap();
        let sections = crate::script::parse_sections(&gold.silver.script).unwrap();
        assert_eq!(gold.audio_guides.len(), sections.len());

        // Published guides carry durable URLs, not local paths.
        let report = outcome.report.unwrap();
        assert_eq!(report.guides_published, 2);
        let published = database.guides.lock().unwrap();
        assert!(published
            .iter()
            .all(|g| g.audio_url.starts_with("https://cdn.example.com/audio-guides/run-1/")));
    }

    #[tokio::test]
    async fn test_bronze_contains_filtered_images_and_ordered_content() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = test_pipeline(tmp.path(), Arc::new(FakeDatabase::default()));
        let config_path = write_config(tmp.path());

        let bronze_path = pipeline.run_crawl(&config_path, "run-1").await.unwrap();
        let bronze: PlaceDataBronze = read_tier(&bronze_path).unwrap();

        assert_eq!(bronze.latitude, 10.3460);
        assert_eq!(bronze.longitude, 107.0843);

        // One filtered image per source page; the width-declaring icon is
        // dropped.
        assert_eq!(
            bronze.images,
            vec!["http://site.com/content.jpg", "http://site.com/content.jpg"]
        );

        // Content blocks keep URL order.
        let first = bronze.content.find("http://site.com/villa").unwrap();
        let second = bronze.content.find("http://site.com/history").unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn test_rerun_overwrites_same_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = test_pipeline(tmp.path(), Arc::new(FakeDatabase::default()));
        let config_path = write_config(tmp.path());

        let first = pipeline.run_crawl(&config_path, "run-1").await.unwrap();
        let second = pipeline.run_crawl(&config_path, "run-1").await.unwrap();
        assert_eq!(first, second);

        let entries = std::fs::read_dir(first.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_infer_run_id_from_tier_path() {
        let path = Path::new("/data/silver/8c0c7045/Bach Dinh.json");
        assert_eq!(infer_run_id(path).unwrap(), "8c0c7045");
    }
}
