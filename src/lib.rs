//! Fortell - Audio Guide Pipeline
//!
//! A local-first CLI pipeline that turns places into narrated audio guides.
//!
//! The name "Fortell" comes from the Norwegian word for "tell" or "narrate."
//!
//! # Overview
//!
//! Fortell carries a place's data through three progressively enriched tiers:
//!
//! - **Bronze**: text and images harvested from the place's source pages
//! - **Silver**: Bronze plus an LLM-generated narration script
//! - **Gold**: Silver plus per-section narrated audio with SRT subtitles
//!
//! Gold data is then published to object storage and the place database.
//! Every tier file is addressed as `{tier root}/{run id}/{place name}.json`,
//! which makes re-runs idempotent and lets a failed run resume from its last
//! good tier.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `place` - Tier data model
//! - `artifact` - Run-scoped artifact addressing
//! - `crawl` - Page harvesting and image filtering
//! - `script` - Narration script generation and section parsing
//! - `audio` - Speech synthesis, subtitles, and Gold composition
//! - `publish` - Object storage uploads and database updates
//! - `pipeline` - Stage coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use fortell::config::Settings;
//! use fortell::pipeline::Pipeline;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(settings)?;
//!
//!     // Crawl one place into the Bronze tier.
//!     let bronze = pipeline
//!         .run_crawl(Path::new("places/bach_dinh.json"), "run-1")
//!         .await?;
//!     println!("Bronze written to {}", bronze.display());
//!
//!     Ok(())
//! }
//! ```

pub mod artifact;
pub mod audio;
pub mod cli;
pub mod config;
pub mod crawl;
pub mod error;
pub mod pipeline;
pub mod place;
pub mod publish;
pub mod retry;
pub mod script;

pub use error::{FortellError, Result};
