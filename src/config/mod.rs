//! Configuration module for Fortell.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{NarrationPrompts, Prompts};
pub use settings::{
    AudioSettings, CrawlSettings, GeneralSettings, PromptSettings, PublishSettings, RunSettings,
    ScriptSettings, Settings,
};
