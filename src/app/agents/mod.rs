// 四個角色：Cleaner、Profiler（inference）、Analyst、Visualizer

pub mod analyzer;
pub mod cleaning;
pub mod executor;
pub mod inference;
pub mod prompts;
pub mod visualizer;

pub use analyzer::AnalyzerChain;
pub use cleaning::{create_cleaning_agent, CleaningToolSet, DatasetHandle};
pub use executor::{AgentExecutor, AgentOutcome, AgentStep};
pub use inference::{create_inference_agent, InferenceToolSet};
pub use visualizer::{create_visualizer_agent, ChartSlot, VisualizerToolSet};
