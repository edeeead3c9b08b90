//! Image candidate filtering.
//!
//! Reduces the raw image descriptors collected during a crawl to a clean,
//! ordered list of absolute URLs. Pure and deterministic: same input, same
//! output, no I/O.

use super::PageImages;
use crate::error::{FortellError, Result};
use url::Url;

/// Tunables for the image filter.
#[derive(Debug, Clone)]
pub struct ImageFilterConfig {
    /// Descriptors with a longer `desc` are dropped.
    pub max_desc_length: usize,
    /// Descriptors whose `desc` contains any of these substrings are dropped.
    pub desc_denylist: Vec<String>,
}

impl Default for ImageFilterConfig {
    fn default() -> Self {
        Self {
            max_desc_length: 10_000,
            desc_denylist: vec!["Google Maps".to_string()],
        }
    }
}

/// Filter raw image candidates down to usable absolute URLs.
///
/// Per descriptor, in encounter order:
/// - drop if `desc` exceeds the configured length,
/// - drop if `width` is declared (only width-unspecified images are treated
///   as full-resolution content images),
/// - drop if `desc` matches the denylist,
/// - root-relative `src` values are prefixed with the source page's origin.
///
/// Duplicates appearing under different source pages are preserved; there is
/// no cross-source deduplication.
pub fn filter_images(pages: &[PageImages], config: &ImageFilterConfig) -> Result<Vec<String>> {
    let mut cleaned = Vec::new();

    for page in pages {
        let origin = page_origin(&page.source_url)?;

        for image in &page.images {
            if image.desc.len() > config.max_desc_length {
                continue;
            }
            if image.width.is_some() {
                continue;
            }
            if config.desc_denylist.iter().any(|d| image.desc.contains(d)) {
                continue;
            }

            if image.src.starts_with('/') {
                cleaned.push(format!("{}{}", origin, image.src));
            } else {
                cleaned.push(image.src.clone());
            }
        }
    }

    Ok(cleaned)
}

/// `scheme://host[:port]` of a source page URL.
fn page_origin(source_url: &str) -> Result<String> {
    let url = Url::parse(source_url)
        .map_err(|e| FortellError::InvalidInput(format!("bad source URL '{}': {}", source_url, e)))?;
    let host = url
        .host_str()
        .ok_or_else(|| FortellError::InvalidInput(format!("source URL '{}' has no host", source_url)))?;

    match url.port() {
        Some(port) => Ok(format!("{}://{}:{}", url.scheme(), host, port)),
        None => Ok(format!("{}://{}", url.scheme(), host)),
    }
}
