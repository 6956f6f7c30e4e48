use crate::app::agents::prompts::analyzer_prompt;
use crate::domain::chat::{ChatRequest, Message};
use crate::domain::ports::LanguageModel;
use crate::utils::error::{AnalyticsError, Result};
use std::sync::Arc;

/// 單輪鏈：把統計摘要放進提示，取回 markdown 報告
pub struct AnalyzerChain<M: LanguageModel> {
    model: Arc<M>,
    temperature: f32,
}

impl<M: LanguageModel> AnalyzerChain<M> {
    pub fn new(model: Arc<M>) -> Self {
        Self {
            model,
            temperature: 0.5,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub async fn invoke(&self, stats_json: &str) -> Result<String> {
        tracing::info!("📝 Analyst is writing the report ({})", self.model.model_name());

        let request = ChatRequest {
            system_prompt: None,
            messages: vec![Message::user(analyzer_prompt(stats_json))],
            tools: Vec::new(),
            temperature: self.temperature,
        };
        let response = self.model.chat(&request).await?;

        let report = response.content.trim().to_string();
        if report.is_empty() {
            return Err(AnalyticsError::LlmResponseError {
                message: "Analyst returned an empty report".to_string(),
            });
        }
        tracing::debug!(
            "Analyst token usage: {} prompt / {} completion",
            response.usage.prompt_tokens,
            response.usage.completion_tokens
        );
        Ok(report)
    }
}
