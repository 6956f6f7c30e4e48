use crate::app::agents::executor::AgentExecutor;
use crate::app::agents::visualizer::{create_visualizer_agent, VisualizerToolSet};
use crate::core::charts::ChartSpec;
use crate::domain::chat::Message;
use crate::domain::model::Dataset;
use crate::domain::ports::{LanguageModel, Storage};
use crate::utils::error::Result;
use std::sync::Arc;

/// 單輪對話的結果：代理文字、產生的圖表與儲存位置
#[derive(Debug, Clone)]
pub struct VisualizerReply {
    pub text: String,
    pub chart: Option<ChartSpec>,
    pub saved_path: Option<String>,
}

/// 與 Visualizer 代理的多輪對話，保留使用者與助手的訊息歷史
pub struct VisualizerSession<M: LanguageModel, S: Storage> {
    agent: AgentExecutor<M, VisualizerToolSet>,
    storage: S,
    history: Vec<Message>,
}

impl<M: LanguageModel, S: Storage> VisualizerSession<M, S> {
    pub fn new(model: Arc<M>, dataset: Dataset, storage: S) -> Self {
        Self {
            agent: create_visualizer_agent(model, dataset),
            storage,
            history: Vec::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.agent = self.agent.with_temperature(temperature);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.agent = self.agent.with_max_iterations(max_iterations);
        self
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn column_names(&self) -> Vec<String> {
        self.agent.tools().dataset().column_names()
    }

    pub async fn ask(&mut self, prompt: &str) -> Result<VisualizerReply> {
        self.agent.tools().slot().clear();

        let outcome = self.agent.invoke_with_history(&self.history, prompt).await?;
        let chart = self.agent.tools().take_chart();

        let saved_path = match &chart {
            Some(chart) => Some(save_chart(&self.storage, chart).await?),
            None => None,
        };

        let mut remembered = outcome.output.clone();
        if let Some(chart) = &chart {
            remembered.push_str(&format!("\n[chart: {}]", chart.title));
        }
        self.history.push(Message::user(prompt));
        self.history.push(Message::assistant(remembered));

        Ok(VisualizerReply {
            text: outcome.output,
            chart,
            saved_path,
        })
    }
}

/// 儲存為 `charts/chart_<timestamp>_<kind>.json`，回傳完整位置
pub async fn save_chart<S: Storage>(storage: &S, chart: &ChartSpec) -> Result<String> {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S_%3f");
    let path = format!("charts/chart_{}_{}.json", timestamp, chart.kind);

    storage
        .write_file(&path, chart.to_json_pretty()?.as_bytes())
        .await?;

    let location = storage.location(&path);
    tracing::info!("📊 Chart '{}' saved to {}", chart.title, location);
    Ok(location)
}
