//! Measured audio clip duration.
//!
//! Gold's `duration_seconds` must come from the encoded audio itself, not
//! from a text-length estimate. The default probe shells out to ffprobe and
//! reads the container duration; the trait lets tests substitute a fake.

use crate::error::{FortellError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Trait for measuring the duration of an encoded audio file.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    /// Duration of the clip in seconds.
    async fn duration_seconds(&self, path: &Path) -> Result<f64>;
}

/// Probe backed by ffprobe.
pub struct FfprobeDurationProbe;

#[async_trait]
impl DurationProbe for FfprobeDurationProbe {
    async fn duration_seconds(&self, path: &Path) -> Result<f64> {
        let result = Command::new("ffprobe")
            .arg("-v").arg("quiet")
            .arg("-print_format").arg("json")
            .arg("-show_format")
            .arg(path)
            .stdout(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FortellError::ToolNotFound("ffprobe".into()));
            }
            Err(e) => {
                return Err(FortellError::Synthesis(format!("ffprobe failed: {e}")));
            }
        };

        if !output.status.success() {
            return Err(FortellError::Synthesis(format!(
                "ffprobe returned error for {}",
                path.display()
            )));
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        let parsed: serde_json::Value = serde_json::from_str(&json_str)
            .map_err(|_| FortellError::Synthesis("Invalid ffprobe output".into()))?;

        parsed["format"]["duration"]
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| {
                FortellError::Synthesis(format!(
                    "Could not determine duration of {}",
                    path.display()
                ))
            })
    }
}

/// Truncate a measured duration to whole seconds.
pub fn truncate_seconds(duration: f64) -> u64 {
    duration as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_not_round() {
        assert_eq!(truncate_seconds(0.0), 0);
        assert_eq!(truncate_seconds(12.4), 12);
        assert_eq!(truncate_seconds(12.9), 12);
    }
}
