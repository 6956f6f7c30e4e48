use crate::domain::chat::{ChatRequest, ModelResponse, ToolDefinition};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// 檔案在儲存空間中的完整位置，用於顯示
    fn location(&self, path: &str) -> String;
}

/// 聊天模型供應者
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> Result<ModelResponse>;

    fn model_name(&self) -> &str;
}

/// 代理可以呼叫的一組工具
pub trait ToolSet: Send + Sync {
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// 執行工具；回傳給模型的文字結果。未知的工具名稱回傳 `Err`
    fn invoke(&self, name: &str, arguments: &serde_json::Value) -> Result<String>;
}
