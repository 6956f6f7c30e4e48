use crate::domain::chat::{ChatRequest, Message};
use crate::domain::ports::{LanguageModel, ToolSet};
use crate::utils::error::{AnalyticsError, Result};
use serde::Serialize;
use std::sync::Arc;

pub const DEFAULT_MAX_ITERATIONS: usize = 15;
pub const ITERATION_LIMIT_MESSAGE: &str = "Agent stopped due to iteration limit.";

/// 一次工具呼叫與其結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentStep {
    pub tool: String,
    pub arguments: serde_json::Value,
    pub observation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutcome {
    pub output: String,
    pub steps: Vec<AgentStep>,
    pub iterations: usize,
    pub stopped_early: bool,
}

/// 工具呼叫迴圈：模型要求工具時執行並回傳結果，直到模型給出最終答案
pub struct AgentExecutor<M: LanguageModel, T: ToolSet> {
    name: String,
    model: Arc<M>,
    tools: T,
    system_prompt: String,
    temperature: f32,
    max_iterations: usize,
}

impl<M: LanguageModel, T: ToolSet> AgentExecutor<M, T> {
    pub fn new(
        name: impl Into<String>,
        model: Arc<M>,
        tools: T,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            model,
            tools,
            system_prompt: system_prompt.into(),
            temperature: 0.5,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn tools(&self) -> &T {
        &self.tools
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn invoke(&self, input: &str) -> Result<AgentOutcome> {
        self.invoke_with_history(&[], input).await
    }

    pub async fn invoke_with_history(
        &self,
        history: &[Message],
        input: &str,
    ) -> Result<AgentOutcome> {
        let definitions = self.tools.definitions();
        let mut messages: Vec<Message> = history.to_vec();
        messages.push(Message::user(input));

        let mut steps = Vec::new();
        tracing::info!("🤖 {} agent started ({} tools)", self.name, definitions.len());

        for iteration in 1..=self.max_iterations {
            let request = ChatRequest {
                system_prompt: Some(self.system_prompt.clone()),
                messages: messages.clone(),
                tools: definitions.clone(),
                temperature: self.temperature,
            };
            let response = self.model.chat(&request).await?;

            if response.tool_calls.is_empty() {
                if response.content.trim().is_empty() {
                    return Err(AnalyticsError::AgentError {
                        message: format!("{} agent returned an empty answer", self.name),
                    });
                }
                tracing::info!(
                    "✅ {} agent finished after {} iteration(s), {} tool call(s)",
                    self.name,
                    iteration,
                    steps.len()
                );
                return Ok(AgentOutcome {
                    output: response.content,
                    steps,
                    iterations: iteration,
                    stopped_early: false,
                });
            }

            let calls = response.tool_calls.clone();
            messages.push(Message::assistant_with_tools(response.content, response.tool_calls));

            for call in &calls {
                tracing::info!("🔧 {} → {}({})", self.name, call.name, call.arguments);
                // 工具錯誤以文字回傳給模型，讓它自行修正
                let observation = match self.tools.invoke(&call.name, &call.arguments) {
                    Ok(result) => result,
                    Err(e) => format!("Error: {}", e),
                };
                tracing::debug!("Tool {} returned: {}", call.name, observation);

                messages.push(Message::tool_result(call, observation.clone()));
                steps.push(AgentStep {
                    tool: call.name.clone(),
                    arguments: call.arguments.clone(),
                    observation,
                });
            }
        }

        tracing::warn!(
            "⚠️ {} agent hit the iteration limit ({})",
            self.name,
            self.max_iterations
        );
        Ok(AgentOutcome {
            output: ITERATION_LIMIT_MESSAGE.to_string(),
            steps,
            iterations: self.max_iterations,
            stopped_early: true,
        })
    }
}

/// 取出字串參數
pub fn string_arg(arguments: &serde_json::Value, name: &str) -> Result<String> {
    match arguments.get(name) {
        Some(serde_json::Value::String(value)) => Ok(value.clone()),
        Some(serde_json::Value::Null) | None => Err(AnalyticsError::ValidationError {
            message: format!("Missing required argument '{}'", name),
        }),
        Some(other) => Ok(other.to_string()),
    }
}

pub fn unknown_tool(
    name: &str,
    definitions: &[crate::domain::chat::ToolDefinition],
) -> AnalyticsError {
    let available: Vec<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
    AnalyticsError::AgentError {
        message: format!(
            "{} is not a valid tool, try one of [{}]",
            name,
            available.join(", ")
        ),
    }
}
