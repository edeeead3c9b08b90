//! Publishing for Fortell.
//!
//! Uploads a Gold tier's audio and subtitle files to object storage,
//! rewrites the guides to their durable URLs, and updates the place database.
//! All uploads complete before any database write, so the database never
//! references a file that failed to upload.

mod supabase;

pub use supabase::{SupabasePlaceStore, SupabaseStorage, SERVICE_KEY_ENV};

use crate::error::Result;
use crate::place::{AudioGuide, PlaceDataGold};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

/// Trait for the object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload the file at `local` to `remote_key`, returning its durable URL.
    async fn upload(&self, local: &Path, remote_key: &str) -> Result<String>;
}

/// Place record upserted into the database.
#[derive(Debug, Clone, Serialize)]
pub struct PlaceRecord {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub images: Vec<String>,
    pub tags: Vec<String>,
}

/// Trait for the place database.
#[async_trait]
pub trait PlaceStore: Send + Sync {
    /// Upsert a place by name, returning its stable identifier.
    async fn upsert_place(&self, place: &PlaceRecord) -> Result<String>;

    /// Replace the place's full set of audio-guide children with `guides`.
    /// Delete-then-insert semantics: stale guides from earlier runs must not
    /// survive.
    async fn replace_audio_guides(&self, place_id: &str, guides: &[AudioGuide]) -> Result<()>;
}

/// Outcome of publishing one place.
#[derive(Debug)]
pub struct PublishReport {
    pub place_id: String,
    pub guides_published: usize,
}

/// Publishes Gold data to storage and database.
pub struct Publisher {
    store: Arc<dyn ObjectStore>,
    database: Arc<dyn PlaceStore>,
    parent_folder: String,
}

impl Publisher {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        database: Arc<dyn PlaceStore>,
        parent_folder: &str,
    ) -> Self {
        Self {
            store,
            database,
            parent_folder: parent_folder.to_string(),
        }
    }

    /// Publish a place: upload every guide's files under
    /// `{parent_folder}/{run_id}/`, rewrite the guides to the returned URLs,
    /// then upsert the place and replace its audio-guide children.
    #[instrument(skip(self, gold), fields(place = %gold.silver.bronze.name))]
    pub async fn publish(&self, gold: &PlaceDataGold, run_id: &str) -> Result<PublishReport> {
        let folder = format!("{}/{}", self.parent_folder, run_id);

        // Upload everything before touching the database.
        let mut uploaded = Vec::with_capacity(gold.audio_guides.len());
        for guide in &gold.audio_guides {
            let audio_url = self.upload_one(&guide.audio_url, &folder).await?;
            let subtitle_url = self.upload_one(&guide.subtitle_url, &folder).await?;

            uploaded.push(AudioGuide {
                title: guide.title.clone(),
                full_subtitle: guide.full_subtitle.clone(),
                duration_seconds: guide.duration_seconds,
                audio_url,
                subtitle_url,
            });
        }

        let bronze = &gold.silver.bronze;
        let record = PlaceRecord {
            name: bronze.name.clone(),
            latitude: bronze.latitude,
            longitude: bronze.longitude,
            images: bronze.images.clone(),
            tags: Vec::new(),
        };

        let place_id = self.database.upsert_place(&record).await?;
        info!("Upserted place '{}' (id {})", record.name, place_id);

        self.database
            .replace_audio_guides(&place_id, &uploaded)
            .await?;
        info!(
            "Replaced {} audio guides for place '{}'",
            uploaded.len(),
            record.name
        );

        Ok(PublishReport {
            place_id,
            guides_published: uploaded.len(),
        })
    }

    async fn upload_one(&self, local: &str, folder: &str) -> Result<String> {
        let local_path = PathBuf::from(local);
        let file_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                crate::error::FortellError::Publish(format!("bad local path '{}'", local))
            })?;

        let remote_key = format!("{}/{}", folder, file_name);
        let url = self.store.upload(&local_path, &remote_key).await?;
        info!("Uploaded {} to {}", file_name, url);
        Ok(url)
    }
}
