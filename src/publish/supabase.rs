//! Supabase-backed storage and database clients.
//!
//! Storage uploads go through the storage REST surface with upsert enabled,
//! so re-publishing a run overwrites the same objects. Database writes go
//! through PostgREST RPCs matching the production schema: `upsert_place`
//! and `update_audio_guides` (the latter replaces the place's full guide
//! set).

use super::{ObjectStore, PlaceRecord, PlaceStore};
use crate::error::{FortellError, Result};
use crate::place::AudioGuide;
use crate::retry::{self, RetryPolicy};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Environment variable holding the Supabase service key.
pub const SERVICE_KEY_ENV: &str = "SUPABASE_SERVICE_KEY";

fn service_key() -> Result<String> {
    std::env::var(SERVICE_KEY_ENV).map_err(|_| {
        FortellError::Config(format!("{} is not set in the environment", SERVICE_KEY_ENV))
    })
}

fn build_http(timeout: Duration, stage: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| FortellError::Publish(format!("{}: cannot build HTTP client: {}", stage, e)))
}

/// Object store backed by a Supabase storage bucket.
pub struct SupabaseStorage {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
    key: String,
    retry: RetryPolicy,
}

impl SupabaseStorage {
    /// Create a storage client for `bucket` on the given project URL. The
    /// service key comes from the process environment.
    pub fn new(base_url: &str, bucket: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        Ok(Self {
            http: build_http(timeout, "storage")?,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            key: service_key()?,
            retry,
        })
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn upload(&self, local: &Path, remote_key: &str) -> Result<String> {
        let bytes = std::fs::read(local)?;
        let upload_url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, remote_key
        );

        debug!("Uploading {} bytes to {}", bytes.len(), upload_url);

        retry::with_backoff(&self.retry, "storage upload", || async {
            self.http
                .post(&upload_url)
                .bearer_auth(&self.key)
                .header("x-upsert", "true")
                .body(bytes.clone())
                .send()
                .await?
                .error_for_status()
        })
        .await
        .map_err(|e| FortellError::Publish(format!("upload of {}: {}", remote_key, e)))?;

        Ok(format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, remote_key
        ))
    }
}

/// Place database backed by Supabase PostgREST.
pub struct SupabasePlaceStore {
    http: reqwest::Client,
    base_url: String,
    key: String,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct PlaceRow {
    id: serde_json::Value,
}

/// Guide payload for the `update_audio_guides` RPC.
#[derive(Debug, Serialize)]
struct GuidePayload<'a> {
    title: &'a str,
    full_subtitle: &'a str,
    audio_url: &'a str,
    duration_seconds: u64,
    subtitle_url: &'a str,
}

impl SupabasePlaceStore {
    /// Create a database client for the given project URL. The service key
    /// comes from the process environment.
    pub fn new(base_url: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        Ok(Self {
            http: build_http(timeout, "database")?,
            base_url: base_url.trim_end_matches('/').to_string(),
            key: service_key()?,
            retry,
        })
    }

    async fn rpc(&self, function: &str, payload: serde_json::Value) -> Result<reqwest::Response> {
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, function);

        retry::with_backoff(&self.retry, function, || async {
            self.http
                .post(&url)
                .bearer_auth(&self.key)
                .header("apikey", &self.key)
                .json(&payload)
                .send()
                .await?
                .error_for_status()
        })
        .await
        .map_err(|e| FortellError::Publish(format!("{}: {}", function, e)))
    }
}

#[async_trait]
impl PlaceStore for SupabasePlaceStore {
    async fn upsert_place(&self, place: &PlaceRecord) -> Result<String> {
        self.rpc(
            "upsert_place",
            json!({
                "p_name": place.name,
                "p_tags": place.tags,
                "p_latitude": place.latitude,
                "p_longitude": place.longitude,
                "p_images": place.images,
            }),
        )
        .await?;

        // PostgREST equality filter on name to recover the row id.
        let url = format!("{}/rest/v1/places", self.base_url);
        let name_filter = format!("eq.{}", place.name);
        let rows: Vec<PlaceRow> = retry::with_backoff(&self.retry, "place lookup", || async {
            self.http
                .get(&url)
                .query(&[("select", "id"), ("name", name_filter.as_str())])
                .bearer_auth(&self.key)
                .header("apikey", &self.key)
                .send()
                .await?
                .error_for_status()?
                .json::<Vec<PlaceRow>>()
                .await
        })
        .await
        .map_err(|e| FortellError::Publish(format!("place lookup: {}", e)))?;

        let row = rows.into_iter().next().ok_or_else(|| {
            FortellError::Publish(format!("place '{}' missing after upsert", place.name))
        })?;

        // ids may be integers or UUID strings depending on the schema.
        Ok(match row.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
    }

    async fn replace_audio_guides(&self, place_id: &str, guides: &[AudioGuide]) -> Result<()> {
        let payload: Vec<GuidePayload<'_>> = guides
            .iter()
            .map(|g| GuidePayload {
                title: &g.title,
                full_subtitle: &g.full_subtitle,
                audio_url: &g.audio_url,
                duration_seconds: g.duration_seconds,
                subtitle_url: &g.subtitle_url,
            })
            .collect();

        self.rpc(
            "update_audio_guides",
            json!({
                "p_place_id": place_id,
                "audio_guides": payload,
            }),
        )
        .await?;

        Ok(())
    }
}
