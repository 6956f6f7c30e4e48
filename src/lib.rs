pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::Cli;

pub use adapters::{GeminiClient, LocalStorage};
pub use app::{Orchestrator, PipelineOptions, VisualizerSession};
pub use config::AnalyticsConfig;
pub use domain::model::Dataset;
pub use utils::error::{AnalyticsError, Result};
