//! Core infrastructure shared by the pipeline and the binaries
//!
//! - `config`: mirror / key / keyserver lists and their providers
//! - `settings`: optional TOML tunables
//! - `lock`: exclusive output directory lock
//! - `output`: colored terminal output and progress bars

pub mod config;
pub mod lock;
pub mod output;
pub mod settings;
