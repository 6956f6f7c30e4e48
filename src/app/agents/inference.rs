use crate::app::agents::executor::{unknown_tool, AgentExecutor};
use crate::app::agents::prompts::INFERENCE_SYSTEM_PROMPT;
use crate::core::profiler;
use crate::domain::chat::ToolDefinition;
use crate::domain::model::Dataset;
use crate::domain::ports::{LanguageModel, ToolSet};
use crate::utils::error::Result;
use serde_json::json;
use std::sync::Arc;

/// 以工具形式提供 Profiler 的三項統計
pub struct InferenceToolSet {
    dataset: Dataset,
    iqr_multiplier: f64,
}

impl InferenceToolSet {
    pub fn new(dataset: Dataset, iqr_multiplier: f64) -> Self {
        Self {
            dataset,
            iqr_multiplier,
        }
    }

    pub fn get_basic_statistics(&self) -> Result<String> {
        if self.dataset.numeric_column_names().is_empty() {
            return Ok(json!({ "message": "No numerical columns found." }).to_string());
        }
        Ok(serde_json::to_string(&profiler::basic_statistics(&self.dataset))?)
    }

    pub fn detect_outliers(&self) -> Result<String> {
        if self.dataset.numeric_column_names().is_empty() {
            let message = "No numerical columns found for outlier detection.";
            return Ok(json!({ "message": message }).to_string());
        }
        let counts = profiler::outliers_count(&self.dataset, self.iqr_multiplier);
        Ok(json!({ "outliers_count": counts }).to_string())
    }

    pub fn analyze_categorical_data(&self) -> Result<String> {
        if self.dataset.categorical_column_names().is_empty() {
            return Ok(json!({ "message": "No categorical columns found." }).to_string());
        }
        Ok(serde_json::to_string(&profiler::categorical_analysis(&self.dataset))?)
    }
}

impl ToolSet for InferenceToolSet {
    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "get_basic_statistics",
                "Calculates and returns basic descriptive statistics for numerical columns.",
            ),
            ToolDefinition::new(
                "detect_outliers",
                "Detects and returns the count of outliers in numerical columns using the IQR method.",
            ),
            ToolDefinition::new(
                "analyze_categorical_data",
                "Analyzes categorical columns, returning value counts and unique value counts.",
            ),
        ]
    }

    fn invoke(&self, name: &str, _arguments: &serde_json::Value) -> Result<String> {
        match name {
            "get_basic_statistics" => self.get_basic_statistics(),
            "detect_outliers" => self.detect_outliers(),
            "analyze_categorical_data" => self.analyze_categorical_data(),
            other => Err(unknown_tool(other, &self.definitions())),
        }
    }
}

pub fn create_inference_agent<M: LanguageModel>(
    model: Arc<M>,
    dataset: Dataset,
    iqr_multiplier: f64,
) -> AgentExecutor<M, InferenceToolSet> {
    AgentExecutor::new(
        "Inference",
        model,
        InferenceToolSet::new(dataset, iqr_multiplier),
        INFERENCE_SYSTEM_PROMPT,
    )
}

/// 代理輸出若為 JSON（可能包在 ``` 區塊中）則重新排版，否則原樣回傳
pub fn normalize_agent_json(output: &str) -> String {
    let trimmed = output.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    match serde_json::from_str::<serde_json::Value>(unfenced) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| unfenced.to_string()),
        Err(_) => trimmed.to_string(),
    }
}
