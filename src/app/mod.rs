// 應用層：代理、流程協調與圖表對話

pub mod agents;
pub mod orchestrator;
pub mod session;

pub use orchestrator::{Orchestrator, PipelineOptions, PipelineOutcome, WhatIfOutcome};
pub use session::{VisualizerReply, VisualizerSession};
