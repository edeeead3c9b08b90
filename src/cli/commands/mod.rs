//! CLI command implementations.

mod config;
mod doctor;
mod stages;

pub use config::run_config;
pub use doctor::run_doctor;
pub use stages::{run_audio, run_crawl, run_full, run_publish, run_script};
