//! shelterscope-agent — Configuration and pipeline orchestration for the
//! `shelterscope` binary.

pub mod config;
pub mod pipeline;

pub use config::Config;
pub use pipeline::{Pipeline, PipelineReport};
