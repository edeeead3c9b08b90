//! Pipeline stage commands.

use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::{infer_run_id, Pipeline};
use anyhow::Result;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Use the given run id, or mint a fresh one for a new run.
fn new_run_id(run_id: Option<String>) -> String {
    run_id.unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Use the given run id, or recover it from the tier file's run directory.
fn resume_run_id(run_id: Option<String>, tier_path: &Path) -> Result<String> {
    match run_id {
        Some(id) => Ok(id),
        None => Ok(infer_run_id(tier_path)?),
    }
}

/// Run the crawl command.
pub async fn run_crawl(
    place_config: &str,
    run_id: Option<String>,
    settings: Settings,
) -> Result<()> {
    let run_id = new_run_id(run_id);
    Output::info(&format!("Run id: {}", run_id));

    let pipeline = Pipeline::new(settings)?;

    let spinner = Output::spinner("Crawling source pages...");
    let result = pipeline
        .run_crawl(&PathBuf::from(place_config), &run_id)
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(path) => {
            Output::success(&format!("Bronze written to {}", path.display()));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Crawl failed: {}", e));
            Err(e.into())
        }
    }
}

/// Run the script command.
pub async fn run_script(bronze: &str, run_id: Option<String>, settings: Settings) -> Result<()> {
    let bronze_path = PathBuf::from(bronze);
    let run_id = resume_run_id(run_id, &bronze_path)?;
    Output::info(&format!("Run id: {}", run_id));

    let pipeline = Pipeline::new(settings)?;

    let spinner = Output::spinner("Generating narration script...");
    let result = pipeline.run_script(&bronze_path, &run_id).await;
    spinner.finish_and_clear();

    match result {
        Ok(path) => {
            Output::success(&format!("Silver written to {}", path.display()));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Script generation failed: {}", e));
            Err(e.into())
        }
    }
}

/// Run the audio command.
pub async fn run_audio(silver: &str, run_id: Option<String>, settings: Settings) -> Result<()> {
    let silver_path = PathBuf::from(silver);
    let run_id = resume_run_id(run_id, &silver_path)?;
    Output::info(&format!("Run id: {}", run_id));

    let pipeline = Pipeline::new(settings)?;

    let spinner = Output::spinner("Synthesizing audio guides...");
    let result = pipeline.run_audio(&silver_path, &run_id).await;
    spinner.finish_and_clear();

    match result {
        Ok(path) => {
            Output::success(&format!("Gold written to {}", path.display()));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Audio composition failed: {}", e));
            Err(e.into())
        }
    }
}

/// Run the publish command.
pub async fn run_publish(gold: &str, run_id: Option<String>, settings: Settings) -> Result<()> {
    let gold_path = PathBuf::from(gold);
    let run_id = resume_run_id(run_id, &gold_path)?;
    Output::info(&format!("Run id: {}", run_id));

    let pipeline = Pipeline::new(settings)?;

    let spinner = Output::spinner("Uploading audio guides...");
    let result = pipeline.run_publish(&gold_path, &run_id).await;
    spinner.finish_and_clear();

    match result {
        Ok(report) => {
            Output::success(&format!(
                "Published {} audio guides (place id {})",
                report.guides_published, report.place_id
            ));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Publish failed: {}", e));
            Err(e.into())
        }
    }
}

/// Run the full pipeline for one place.
pub async fn run_full(
    place_config: &str,
    run_id: Option<String>,
    no_publish: bool,
    settings: Settings,
) -> Result<()> {
    let run_id = new_run_id(run_id);
    Output::info(&format!("Run id: {}", run_id));
    Output::info(&format!("Processing: {}", place_config));

    let pipeline = Pipeline::new(settings)?;

    match pipeline
        .run_all(&PathBuf::from(place_config), &run_id, !no_publish)
        .await
    {
        Ok(outcome) => {
            Output::kv("bronze", &outcome.bronze_path.display().to_string());
            Output::kv("silver", &outcome.silver_path.display().to_string());
            Output::kv("gold", &outcome.gold_path.display().to_string());

            match outcome.report {
                Some(report) => Output::success(&format!(
                    "Published {} audio guides (place id {})",
                    report.guides_published, report.place_id
                )),
                None => Output::success("Stopped after Gold (publishing skipped)"),
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Pipeline failed: {}", e));
            Err(e.into())
        }
    }
}
