//! Prompt templates for Fortell.
//!
//! Prompts can be customized by placing TOML files in the custom prompts
//! directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub narration: NarrationPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}


/// Prompt for narration script generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationPrompts {
    pub user: String,
}

impl Default for NarrationPrompts {
    fn default() -> Self {
        Self {
            user: r##"You are a local tour guide writing the narration script for an audio
guide about {{name}}.

Source material collected from the web (each block starts with its source
URL):

{{content}}

Write a narration script of 3 to 6 sections covering the most interesting
aspects of the place: its history, architecture, notable stories, and
practical context for a visitor standing in front of it.

Format rules:
- Every section starts with a line of the form "# Title" (a '#' followed by
  a short section title).
- The narration text follows on the lines after the title.
- Begin the script directly with the first section header. No preamble, no
  closing remarks outside a section.
- Do not use the '#' character anywhere except section headers.
- Write flowing spoken prose suitable for narration: no bullet points, no
  markdown emphasis, no URLs.
- Only use facts found in the source material. If the sources conflict,
  prefer the more detailed account."##
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory
    /// and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        // Store custom variables
        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            // Load narration prompt if file exists
            let narration_path = custom_path.join("narration.toml");
            if narration_path.exists() {
                let content = std::fs::read_to_string(&narration_path)?;
                prompts.narration = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom
    /// config variables. Provided variables take precedence.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
