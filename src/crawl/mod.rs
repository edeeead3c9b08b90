//! Page harvesting for Fortell.
//!
//! Drives an external page-fetch engine over a place's URLs, one at a time,
//! concatenating the extracted text into the Bronze `content` field and
//! collecting raw image candidates for filtering.

mod client;
mod images;

pub use client::FetchEngineClient;
pub use images::{filter_images, ImageFilterConfig};

use crate::error::Result;
use crate::place::PlaceConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Extraction options passed to the page-fetch engine.
#[derive(Debug, Clone, Serialize)]
pub struct FetchOptions {
    /// Relevance query used to keep only content related to the place.
    pub relevance_query: String,
    /// Minimum relevance score for a text region to survive filtering.
    pub relevance_threshold: f64,
    /// CSS selector for regions to exclude (navigation, script, style).
    pub excluded_selector: String,
    /// Drop images hosted outside the page's own domain.
    pub exclude_external_images: bool,
    /// Drop links pointing outside the page's own domain.
    pub exclude_external_links: bool,
    /// Minimum engine-assigned score for an image to be reported.
    pub min_image_score: u32,
}

impl FetchOptions {
    /// Options for harvesting one place: relevance-filter against the place
    /// name, keep only in-domain media.
    pub fn for_place(name: &str, relevance_threshold: f64) -> Self {
        Self {
            relevance_query: name.to_string(),
            relevance_threshold,
            excluded_selector: "script, style, nav, footer".to_string(),
            exclude_external_images: true,
            exclude_external_links: true,
            min_image_score: 3,
        }
    }
}

/// One raw image candidate reported by the fetch engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageDescriptor {
    /// Absolute or root-relative image URL.
    pub src: String,
    /// Surrounding/alternate text the engine attached to the image.
    #[serde(default)]
    pub desc: String,
    /// Declared width, if the page specified one.
    #[serde(default)]
    pub width: Option<u32>,
}

/// Extracted content of one page.
#[derive(Debug, Clone, Deserialize)]
pub struct PageExtract {
    /// Markdown-like text extract of the page.
    pub markdown: String,
    /// Raw image candidates found on the page.
    #[serde(default)]
    pub images: Vec<ImageDescriptor>,
}

/// Raw image candidates of one source page, keyed by where they were found.
#[derive(Debug, Clone)]
pub struct PageImages {
    pub source_url: String,
    pub images: Vec<ImageDescriptor>,
}

/// Trait for the external page-fetch engine.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one URL and extract its text and image candidates.
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<PageExtract>;
}

/// Everything a crawl produces before Bronze composition.
#[derive(Debug)]
pub struct Harvest {
    /// Per-URL text blocks concatenated in crawl order.
    pub content: String,
    /// Raw image candidates grouped by source page, in crawl order.
    pub images: Vec<PageImages>,
}

/// Harvest a place's URLs sequentially.
///
/// Each page contributes a `"{url}\n{markdown}\n\n\n"` block to the content
/// accumulator, preserving the order of `PlaceConfig.urls`. Any failing URL
/// fails the whole harvest; there is no per-URL isolation. The per-URL
/// progress reported through `on_progress` is advisory telemetry only.
pub async fn harvest(
    fetcher: &dyn PageFetcher,
    place: &PlaceConfig,
    options: &FetchOptions,
    mut on_progress: impl FnMut(usize, usize),
) -> Result<Harvest> {
    let total = place.urls.len();
    let mut content = String::new();
    let mut images = Vec::with_capacity(total);

    for (i, url) in place.urls.iter().enumerate() {
        let extract = fetcher.fetch(url, options).await?;

        info!(
            "Fetched '{}': {} characters, {} image candidates",
            url,
            extract.markdown.len(),
            extract.images.len()
        );

        content.push_str(&format!("{}\n{}\n\n\n", url, extract.markdown));
        images.push(PageImages {
            source_url: url.clone(),
            images: extract.images,
        });

        on_progress(i + 1, total);
    }

    Ok(Harvest { content, images })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeFetcher {
        pages: HashMap<String, PageExtract>,
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str, _options: &FetchOptions) -> Result<PageExtract> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| crate::error::FortellError::Fetch(format!("no page for {}", url)))
        }
    }

    fn place(urls: &[&str]) -> PlaceConfig {
        PlaceConfig {
            name: "Test Place".to_string(),
            location: "1.0, 2.0".to_string(),
            urls: urls.iter().map(|u| u.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_harvest_preserves_url_order() {
        let mut pages = HashMap::new();
        pages.insert(
            "http://a.com".to_string(),
            PageExtract {
                markdown: "first".to_string(),
                images: vec![],
            },
        );
        pages.insert(
            "http://b.com".to_string(),
            PageExtract {
                markdown: "second".to_string(),
                images: vec![],
            },
        );
        let fetcher = FakeFetcher { pages };

        let place = place(&["http://a.com", "http://b.com"]);
        let options = FetchOptions::for_place(&place.name, 1.2);

        let harvest = harvest(&fetcher, &place, &options, |_, _| {}).await.unwrap();

        assert_eq!(
            harvest.content,
            "http://a.com\nfirst\n\n\nhttp://b.com\nsecond\n\n\n"
        );
        assert_eq!(harvest.images.len(), 2);
        assert_eq!(harvest.images[0].source_url, "http://a.com");
        assert_eq!(harvest.images[1].source_url, "http://b.com");
    }

    #[tokio::test]
    async fn test_harvest_fails_on_any_url() {
        let fetcher = FakeFetcher {
            pages: HashMap::new(),
        };
        let place = place(&["http://missing.com"]);
        let options = FetchOptions::for_place(&place.name, 1.2);

        assert!(harvest(&fetcher, &place, &options, |_, _| {}).await.is_err());
    }

    #[tokio::test]
    async fn test_harvest_reports_progress() {
        let mut pages = HashMap::new();
        for url in ["http://a.com", "http://b.com", "http://c.com"] {
            pages.insert(
                url.to_string(),
                PageExtract {
                    markdown: "x".to_string(),
                    images: vec![],
                },
            );
        }
        let fetcher = FakeFetcher { pages };
        let place = place(&["http://a.com", "http://b.com", "http://c.com"]);
        let options = FetchOptions::for_place(&place.name, 1.2);

        let mut seen = Vec::new();
        harvest(&fetcher, &place, &options, |done, total| {
            seen.push((done, total))
        })
        .await
        .unwrap();

        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }
}
