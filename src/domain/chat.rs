use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

/// 模型要求呼叫的工具
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// 工具結果對應的呼叫 id 與工具名稱
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name: None,
        }
    }

    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::assistant(content)
        }
    }

    pub fn tool_result(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(call.id.clone()),
            tool_name: Some(call.name.clone()),
        }
    }
}

/// 提供給模型的工具宣告；`parameters` 為 JSON Schema，無參數時為 `None`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: None,
        }
    }

    /// 以字串參數建立 object schema，所有參數皆為必填
    pub fn with_string_params(mut self, params: &[(&str, &str)]) -> Self {
        let mut properties = serde_json::Map::new();
        for (name, description) in params {
            properties.insert(
                name.to_string(),
                serde_json::json!({ "type": "string", "description": description }),
            );
        }
        let required: Vec<&str> = params.iter().map(|(name, _)| *name).collect();
        self.parameters = Some(serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        }));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system_prompt: Option<String>,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub temperature: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: TokenUsage,
    pub finish_reason: Option<String>,
}

impl ModelResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
            usage: TokenUsage::default(),
            finish_reason: Some("STOP".to_string()),
        }
    }

    pub fn with_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: String::new(),
            tool_calls,
            usage: TokenUsage::default(),
            finish_reason: Some("STOP".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_param_schema() {
        let def = ToolDefinition::new("plot_scatter", "Creates a scatter plot")
            .with_string_params(&[("x_column", "x axis"), ("y_column", "y axis")]);
        let params = def.parameters.unwrap();
        assert_eq!(params["type"], "object");
        assert_eq!(params["properties"]["x_column"]["type"], "string");
        assert_eq!(params["required"], serde_json::json!(["x_column", "y_column"]));
    }

    #[test]
    fn test_tool_result_links_call() {
        let call = ToolCall {
            id: "call_0".to_string(),
            name: "detect_outliers".to_string(),
            arguments: serde_json::json!({}),
        };
        let message = Message::tool_result(&call, "{}");
        assert_eq!(message.role, Role::Tool);
        assert_eq!(message.tool_name.as_deref(), Some("detect_outliers"));
    }
}
