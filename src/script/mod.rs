//! Narration script generation for Fortell.
//!
//! Renders the narration prompt with a place's Bronze content, submits it to
//! the external text-generation service, and merges the resulting script into
//! Bronze to produce Silver.

mod openai;
pub mod sections;

pub use openai::OpenAiScriptGenerator;
pub use sections::parse_sections;

use crate::config::Prompts;
use crate::error::{FortellError, Result};
use crate::place::{PlaceDataBronze, PlaceDataSilver};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::info;

/// Trait for the external text-generation service.
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    /// Generate a narration script from a rendered prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Compose Silver: render the narration prompt, generate the script, and
/// merge it into the Bronze data.
///
/// The pipeline halts here when generation fails or returns an empty script;
/// Silver is only ever produced with a non-empty script.
pub async fn compose_silver(
    generator: &dyn ScriptGenerator,
    prompts: &Prompts,
    bronze: PlaceDataBronze,
) -> Result<PlaceDataSilver> {
    let mut vars = HashMap::new();
    vars.insert("name".to_string(), bronze.name.clone());
    vars.insert("content".to_string(), bronze.content.clone());

    let prompt = prompts.render_with_custom(&prompts.narration.user, &vars);

    let script = generator.generate(&prompt).await?;
    if script.trim().is_empty() {
        return Err(FortellError::Script(
            "generation returned an empty script".to_string(),
        ));
    }

    info!(
        "Generated narration script for '{}' ({} characters)",
        bronze.name,
        script.len()
    );

    Ok(bronze.with_script(script))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedGenerator(String);

    #[async_trait]
    impl ScriptGenerator for FixedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct EchoGenerator;

    #[async_trait]
    impl ScriptGenerator for EchoGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            Ok(prompt.to_string())
        }
    }

    fn bronze() -> PlaceDataBronze {
        PlaceDataBronze {
            name: "Bach Dinh".to_string(),
            latitude: 10.0,
            longitude: 107.0,
            content: "http://a.com\nsome text\n\n\n".to_string(),
            images: vec![],
        }
    }

    #[tokio::test]
    async fn test_compose_silver_merges_script() {
        let generator = FixedGenerator("# Intro\nWelcome.".to_string());
        let silver = compose_silver(&generator, &Prompts::default(), bronze())
            .await
            .unwrap();

        assert_eq!(silver.script, "# Intro\nWelcome.");
        assert_eq!(silver.bronze.name, "Bach Dinh");
    }

    #[tokio::test]
    async fn test_empty_script_halts_silver() {
        let generator = FixedGenerator("   \n".to_string());
        let result = compose_silver(&generator, &Prompts::default(), bronze()).await;
        assert!(matches!(result, Err(FortellError::Script(_))));
    }

    #[tokio::test]
    async fn test_prompt_carries_name_and_content() {
        let silver = compose_silver(&EchoGenerator, &Prompts::default(), bronze())
            .await
            .unwrap();

        // The rendered prompt (echoed back as the script) must contain the
        // place name and the harvested content.
        assert!(silver.script.contains("Bach Dinh"));
        assert!(silver.script.contains("some text"));
    }
}
