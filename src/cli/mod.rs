//! CLI module for Fortell.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Fortell - Audio Guide Pipeline
///
/// A local-first CLI pipeline that turns places into narrated audio guides.
/// The name "Fortell" comes from the Norwegian word for "tell" or "narrate."
#[derive(Parser, Debug)]
#[command(name = "fortell")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a place's source pages and write the Bronze tier file
    Crawl {
        /// Path to the place config JSON ({name, location, urls})
        place_config: String,

        /// Run id shared by all tiers of this run (generated if omitted)
        #[arg(long)]
        run_id: Option<String>,
    },

    /// Generate the narration script for a Bronze file and write Silver
    Script {
        /// Path to the Bronze tier file
        bronze: String,

        /// Run id (inferred from the Bronze path if omitted)
        #[arg(long)]
        run_id: Option<String>,
    },

    /// Synthesize narrated audio guides for a Silver file and write Gold
    Audio {
        /// Path to the Silver tier file
        silver: String,

        /// Run id (inferred from the Silver path if omitted)
        #[arg(long)]
        run_id: Option<String>,
    },

    /// Upload a Gold file's audio guides and update the place database
    Publish {
        /// Path to the Gold tier file
        gold: String,

        /// Run id (inferred from the Gold path if omitted)
        #[arg(long)]
        run_id: Option<String>,
    },

    /// Run the full pipeline for one place
    Run {
        /// Path to the place config JSON
        place_config: String,

        /// Run id shared by all tiers of this run (generated if omitted)
        #[arg(long)]
        run_id: Option<String>,

        /// Stop after Gold composition instead of publishing
        #[arg(long)]
        no_publish: bool,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
