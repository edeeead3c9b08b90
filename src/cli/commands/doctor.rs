//! Doctor command: check system requirements and configuration.

use crate::cli::Output;
use crate::config::Settings;
use crate::publish::SERVICE_KEY_ENV;
use anyhow::Result;
use std::process::Stdio;
use tokio::process::Command;

/// Run the doctor command.
pub async fn run_doctor(settings: &Settings) -> Result<()> {
    Output::header("Fortell Doctor");

    let mut problems = 0;

    Output::header("External tools");
    if tool_available("ffprobe").await {
        Output::success("ffprobe found");
    } else {
        Output::error("ffprobe not found (required to measure audio durations)");
        problems += 1;
    }

    Output::header("Environment");
    if std::env::var("OPENAI_API_KEY").is_ok() {
        Output::success("OPENAI_API_KEY is set");
    } else {
        Output::error("OPENAI_API_KEY is not set (required for script generation)");
        problems += 1;
    }
    if std::env::var(SERVICE_KEY_ENV).is_ok() {
        Output::success(&format!("{} is set", SERVICE_KEY_ENV));
    } else {
        Output::warning(&format!(
            "{} is not set (required only for publishing)",
            SERVICE_KEY_ENV
        ));
    }

    Output::header("Services");
    Output::kv("fetch engine", &settings.crawl.endpoint);
    Output::kv("speech service", &settings.audio.endpoint);
    Output::kv("supabase", &settings.publish.supabase_url);

    Output::header("Run directories");
    Output::kv("bronze", &settings.bronze_dir().display().to_string());
    Output::kv("silver", &settings.silver_dir().display().to_string());
    Output::kv("gold", &settings.gold_dir().display().to_string());

    println!();
    if problems == 0 {
        Output::success("No problems found");
        Ok(())
    } else {
        Output::warning(&format!("{} problem(s) found", problems));
        Ok(())
    }
}

async fn tool_available(name: &str) -> bool {
    Command::new(name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}
