use crate::app::agents::analyzer::AnalyzerChain;
use crate::app::agents::cleaning::{create_cleaning_agent, DatasetHandle};
use crate::app::agents::inference::{create_inference_agent, normalize_agent_json};
use crate::app::agents::prompts::INFERENCE_USER_PROMPT;
use crate::app::session::VisualizerSession;
use crate::config::toml_config::AnalyticsConfig;
use crate::core::bundle::build_bundle;
use crate::core::cleaner::{self, CleaningReport};
use crate::core::profiler::{self, DatasetProfile};
use crate::core::what_if::{self, Modification, ScenarioResult};
use crate::domain::model::Dataset;
use crate::domain::ports::{LanguageModel, Storage};
use crate::utils::error::{AnalyticsError, Result};
use crate::utils::monitor::SystemMonitor;
use serde::Serialize;
use std::sync::Arc;

pub const REPORT_FILE: &str = "report.md";
pub const CLEANED_FILE: &str = "cleaned.csv";
pub const PROFILE_FILE: &str = "profile.json";
pub const SKIPPED_ANALYSIS_NOTE: &str =
    "_AI analysis skipped. See `profile.json` for the full statistical summary._";

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// 有值時改由清理代理依指示清理
    pub clean_instructions: Option<String>,
    /// 由推論代理產生交給 Analyst 的統計摘要
    pub agentic_profile: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningSummary {
    pub missing_before: usize,
    pub missing_after: usize,
    /// 預設清理的紀錄；代理清理時為 `None`
    pub report: Option<CleaningReport>,
    /// 清理代理的最終回覆
    pub agent_response: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub report: String,
    pub cleaned: Dataset,
    pub profile: DatasetProfile,
    /// 寫入 profile.json 的統計摘要
    pub profile_json: String,
    /// 推論代理的摘要；有值時取代 profile_json 交給 Analyst
    pub agent_profile: Option<String>,
    pub cleaning: CleaningSummary,
}

#[derive(Debug, Clone)]
pub struct WhatIfOutcome {
    pub scenario: ScenarioResult,
    pub ai_analysis: String,
    pub report: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavedOutputs {
    pub report: String,
    pub cleaned: String,
    pub profile: String,
    pub bundle: Option<String>,
}

/// 串接 Cleaner → Profiler → Analyst，並負責輸出檔案
pub struct Orchestrator<M: LanguageModel, S: Storage> {
    model: Option<Arc<M>>,
    storage: S,
    config: AnalyticsConfig,
    monitor: SystemMonitor,
}

impl<M: LanguageModel, S: Storage> Orchestrator<M, S> {
    pub fn new(model: Option<Arc<M>>, storage: S, config: AnalyticsConfig) -> Self {
        let monitor_enabled = config.monitoring.enabled;
        Self::new_with_monitoring(model, storage, config, monitor_enabled)
    }

    pub fn new_with_monitoring(
        model: Option<Arc<M>>,
        storage: S,
        config: AnalyticsConfig,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            model,
            storage,
            config,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    fn require_model(&self, role: &str) -> Result<Arc<M>> {
        self.model.clone().ok_or_else(|| AnalyticsError::AgentError {
            message: format!("The {} needs a language model but AI is disabled", role),
        })
    }

    /// 清理資料；有指示時使用清理代理，否則使用預設策略
    pub async fn clean(
        &self,
        dataset: &Dataset,
        instructions: Option<&str>,
    ) -> Result<(Dataset, CleaningSummary)> {
        let missing_before = dataset.total_missing();
        tracing::info!(
            "🧹 Cleaner started: {} rows, {} columns, {} missing cells",
            dataset.row_count(),
            dataset.column_count(),
            missing_before
        );

        let (cleaned, report, agent_response) = match instructions {
            Some(instructions) => {
                let model = self.require_model("cleaning agent")?;
                let handle = DatasetHandle::new(dataset.clone());
                let agent = create_cleaning_agent(model, handle.clone())
                    .with_temperature(self.config.agents.cleaning_temperature)
                    .with_max_iterations(self.config.agents.max_iterations);

                let outcome = agent.invoke(instructions).await?;
                (handle.get(), None, Some(outcome.output))
            }
            None => {
                let (cleaned, report) = cleaner::clean_dataset(dataset);
                (cleaned, Some(report), None)
            }
        };

        let summary = CleaningSummary {
            missing_before,
            missing_after: cleaned.total_missing(),
            report,
            agent_response,
        };
        tracing::info!(
            "✅ Cleaner finished: {} → {} missing cells",
            summary.missing_before,
            summary.missing_after
        );
        self.monitor.log_stats("Clean");
        Ok((cleaned, summary))
    }

    /// 產生統計摘要與交給 Analyst 的內容
    pub async fn profile(
        &self,
        dataset: &Dataset,
        agentic: bool,
    ) -> Result<(DatasetProfile, String)> {
        tracing::info!("📊 Profiler started");
        let profile = profiler::profile_dataset(dataset, self.config.profile.iqr_multiplier);

        let analyst_input = if agentic {
            let model = self.require_model("inference agent")?;
            let iqr_multiplier = self.config.profile.iqr_multiplier;
            let agent = create_inference_agent(model, dataset.clone(), iqr_multiplier)
                .with_temperature(self.config.agents.inference_temperature)
                .with_max_iterations(self.config.agents.max_iterations);
            let outcome = agent.invoke(INFERENCE_USER_PROMPT).await?;
            normalize_agent_json(&outcome.output)
        } else {
            profile.to_json_pretty()?
        };

        tracing::info!(
            "✅ Profiler finished: {} numeric, {} categorical columns",
            profile.basic_statistics.len(),
            profile.categorical_analysis.len()
        );
        self.monitor.log_stats("Profile");
        Ok((profile, analyst_input))
    }

    /// 由 Analyst 撰寫報告；未設定模型時回傳說明文字
    pub async fn analyze(&self, profile_json: &str) -> Result<String> {
        let Some(model) = self.model.clone() else {
            tracing::info!("⏭️ Analyst skipped (AI disabled)");
            return Ok(SKIPPED_ANALYSIS_NOTE.to_string());
        };

        let analysis = AnalyzerChain::new(model)
            .with_temperature(self.config.agents.analyzer_temperature)
            .invoke(profile_json)
            .await?;
        self.monitor.log_stats("Analyze");
        Ok(analysis)
    }

    pub async fn run_pipeline(
        &self,
        dataset: &Dataset,
        options: &PipelineOptions,
    ) -> Result<PipelineOutcome> {
        tracing::info!("🚀 Starting analysis pipeline");

        let (cleaned, cleaning) = self
            .clean(dataset, options.clean_instructions.as_deref())
            .await?;
        let (profile, analyst_input) = self.profile(&cleaned, options.agentic_profile).await?;
        let analysis = self.analyze(&analyst_input).await?;

        // profile.json 一律是確定性的統計摘要
        let profile_json = profile.to_json_pretty()?;
        let agent_profile = options.agentic_profile.then_some(analyst_input);

        let report = render_pipeline_report(&cleaned, &cleaning, &analysis);
        self.monitor.log_final_stats();
        tracing::info!("✅ Analysis pipeline completed");

        Ok(PipelineOutcome {
            report,
            cleaned,
            profile,
            profile_json,
            agent_profile,
            cleaning,
        })
    }

    pub async fn run_what_if(
        &self,
        cleaned: &Dataset,
        modification: &Modification,
    ) -> Result<WhatIfOutcome> {
        tracing::info!("🔮 Running scenario: {}", modification.description());

        let scenario = what_if::run_scenario(
            cleaned,
            modification,
            self.config.what_if.correlation_threshold,
        )?;
        tracing::info!(
            "✅ Scenario applied: {} related variable(s)",
            scenario.impacts.len()
        );

        let modified_profile =
            profiler::profile_dataset(&scenario.modified, self.config.profile.iqr_multiplier);
        let ai_analysis = self.analyze(&modified_profile.to_json_pretty()?).await?;

        let report = what_if::render_report(&scenario, &ai_analysis);
        self.monitor.log_final_stats();
        Ok(WhatIfOutcome {
            scenario,
            ai_analysis,
            report,
        })
    }

    /// 寫出 report.md、cleaned.csv、profile.json，設定 bundle 時另外打包
    pub async fn save_outputs(&self, outcome: &PipelineOutcome) -> Result<SavedOutputs> {
        let csv = outcome.cleaned.to_csv_bytes()?;

        self.storage
            .write_file(REPORT_FILE, outcome.report.as_bytes())
            .await?;
        self.storage.write_file(CLEANED_FILE, &csv).await?;
        self.storage
            .write_file(PROFILE_FILE, outcome.profile_json.as_bytes())
            .await?;

        let bundle = if self.config.output.bundle {
            let data = build_bundle(&[
                (REPORT_FILE, outcome.report.as_bytes()),
                (CLEANED_FILE, &csv),
                (PROFILE_FILE, outcome.profile_json.as_bytes()),
            ])?;
            let name = self.config.output.bundle_filename.as_str();
            tracing::debug!("Writing bundle ({} bytes) to storage", data.len());
            self.storage.write_file(name, &data).await?;
            Some(self.storage.location(name))
        } else {
            None
        };

        let saved = SavedOutputs {
            report: self.storage.location(REPORT_FILE),
            cleaned: self.storage.location(CLEANED_FILE),
            profile: self.storage.location(PROFILE_FILE),
            bundle,
        };
        tracing::info!("📁 Outputs saved to {}", saved.report);
        Ok(saved)
    }

    pub async fn save_cleaned(&self, cleaned: &Dataset) -> Result<String> {
        self.storage
            .write_file(CLEANED_FILE, &cleaned.to_csv_bytes()?)
            .await?;
        Ok(self.storage.location(CLEANED_FILE))
    }

    pub async fn save_what_if(&self, outcome: &WhatIfOutcome) -> Result<String> {
        let name = format!(
            "what_if_{}.md",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        );
        self.storage.write_file(&name, outcome.report.as_bytes()).await?;
        Ok(self.storage.location(&name))
    }
}

impl<M: LanguageModel, S: Storage + Clone> Orchestrator<M, S> {
    pub fn visualizer_session(&self, dataset: Dataset) -> Result<VisualizerSession<M, S>> {
        let model = self.require_model("visualizer agent")?;
        Ok(VisualizerSession::new(model, dataset, self.storage.clone())
            .with_temperature(self.config.agents.visualizer_temperature)
            .with_max_iterations(self.config.agents.max_iterations))
    }
}

fn render_pipeline_report(
    cleaned: &Dataset,
    cleaning: &CleaningSummary,
    analysis: &str,
) -> String {
    let mut report = String::from("# Augmented Analytics Report\n\n");
    report.push_str(&format!(
        "_Generated {}_\n\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    report.push_str(&format!(
        "**Dataset:** {} rows × {} columns  \n**Missing cells:** {} before cleaning, {} after\n\n",
        cleaned.row_count(),
        cleaned.column_count(),
        cleaning.missing_before,
        cleaning.missing_after
    ));

    if let Some(cleaning_report) = &cleaning.report {
        for record in &cleaning_report.imputations {
            report.push_str(&format!(
                "- `{}`: filled {} cell(s) with {} ({})\n",
                record.column, record.filled, record.strategy, record.fill_value
            ));
        }
        for column in &cleaning_report.skipped_columns {
            report.push_str(&format!(
                "- `{}`: no values to impute from, left as is\n",
                column
            ));
        }
        if !cleaning_report.imputations.is_empty()
            || !cleaning_report.skipped_columns.is_empty()
        {
            report.push('\n');
        }
    }
    if let Some(response) = &cleaning.agent_response {
        report.push_str(&format!("**Cleaning agent:** {}\n\n", response.trim()));
    }

    report.push_str("---\n\n");
    report.push_str(analysis.trim());
    report.push('\n');
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::what_if::ChangeType;
    use crate::domain::chat::{ChatRequest, ModelResponse, ToolCall};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct MemoryStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl Storage for MemoryStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files
                .lock()
                .unwrap()
                .insert(path.to_string(), data.to_vec());
            Ok(())
        }

        fn location(&self, path: &str) -> String {
            format!("mem://{}", path)
        }
    }

    struct ScriptedModel {
        responses: Mutex<VecDeque<ModelResponse>>,
    }

    impl ScriptedModel {
        fn new(responses: Vec<ModelResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn chat(&self, _request: &ChatRequest) -> Result<ModelResponse> {
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| ModelResponse::text("### 1. Executive Summary\nFine.")))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn dataset() -> Dataset {
        Dataset::from_csv_bytes(
            b"Age,Salary,City\n25,50000,Paris\n,60000,Lyon\n35,,Paris\n45,90000,\n",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_pipeline_without_model() {
        let storage = MemoryStorage::default();
        let orchestrator: Orchestrator<ScriptedModel, _> =
            Orchestrator::new(None, storage.clone(), AnalyticsConfig::default());

        let outcome = orchestrator
            .run_pipeline(&dataset(), &PipelineOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.cleaning.missing_before, 3);
        assert_eq!(outcome.cleaning.missing_after, 0);
        assert!(outcome.report.contains(SKIPPED_ANALYSIS_NOTE));

        let saved = orchestrator.save_outputs(&outcome).await.unwrap();
        assert_eq!(saved.report, "mem://report.md");
        assert!(saved.bundle.is_none());
        assert_eq!(storage.files.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_pipeline_with_analyst_and_bundle() {
        let storage = MemoryStorage::default();
        let mut config = AnalyticsConfig::default();
        config.output.bundle = true;
        let model = ScriptedModel::new(vec![ModelResponse::text(
            "### 1. Executive Summary\nSalaries vary.",
        )]);
        let orchestrator = Orchestrator::new(Some(model), storage.clone(), config);

        let outcome = orchestrator
            .run_pipeline(&dataset(), &PipelineOptions::default())
            .await
            .unwrap();
        assert!(outcome.report.contains("Salaries vary."));

        let saved = orchestrator.save_outputs(&outcome).await.unwrap();
        assert_eq!(saved.bundle.as_deref(), Some("mem://analysis_bundle.zip"));
        assert!(storage.files.lock().unwrap().contains_key("analysis_bundle.zip"));
    }

    #[tokio::test]
    async fn test_agent_cleaning_follows_tool_calls() {
        let model = ScriptedModel::new(vec![
            ModelResponse::with_tool_calls(vec![ToolCall {
                id: "call_0".to_string(),
                name: "impute_column".to_string(),
                arguments: json!({"column_name": "Age", "strategy": "mean"}),
            }]),
            ModelResponse::text("Imputed Age with the mean."),
        ]);
        let orchestrator =
            Orchestrator::new(Some(model), MemoryStorage::default(), AnalyticsConfig::default());

        let (cleaned, summary) = orchestrator
            .clean(&dataset(), Some("fill age with the mean"))
            .await
            .unwrap();
        assert_eq!(
            summary.agent_response.as_deref(),
            Some("Imputed Age with the mean.")
        );
        assert!(summary.report.is_none());
        assert_eq!(cleaned.column("Age").unwrap().data.missing_count(), 0);
        assert_eq!(summary.missing_after, 2);
    }

    #[tokio::test]
    async fn test_agentic_profile_keeps_profile_file_as_json() {
        let storage = MemoryStorage::default();
        let model = ScriptedModel::new(vec![
            ModelResponse::text("The salary column has one outlier."),
            ModelResponse::text("### 1. Executive Summary\nOne outlier."),
        ]);
        let orchestrator =
            Orchestrator::new(Some(model), storage.clone(), AnalyticsConfig::default());
        let options = PipelineOptions {
            clean_instructions: None,
            agentic_profile: true,
        };

        let outcome = orchestrator.run_pipeline(&dataset(), &options).await.unwrap();
        assert_eq!(
            outcome.agent_profile.as_deref(),
            Some("The salary column has one outlier.")
        );
        orchestrator.save_outputs(&outcome).await.unwrap();

        let written = storage.files.lock().unwrap()[PROFILE_FILE].clone();
        let profile: serde_json::Value = serde_json::from_slice(&written).unwrap();
        assert_eq!(profile["basic_statistics"]["Age"]["count"], 4);
    }

    #[tokio::test]
    async fn test_agent_cleaning_requires_model() {
        let orchestrator: Orchestrator<ScriptedModel, _> =
            Orchestrator::new(None, MemoryStorage::default(), AnalyticsConfig::default());
        assert!(matches!(
            orchestrator.clean(&dataset(), Some("clean it")).await,
            Err(AnalyticsError::AgentError { .. })
        ));
    }

    #[tokio::test]
    async fn test_what_if_report() {
        let orchestrator: Orchestrator<ScriptedModel, _> =
            Orchestrator::new(None, MemoryStorage::default(), AnalyticsConfig::default());
        let (cleaned, _) = orchestrator.clean(&dataset(), None).await.unwrap();

        let modification = Modification::new("Salary", ChangeType::PercentageIncrease, 10.0);
        let outcome = orchestrator.run_what_if(&cleaned, &modification).await.unwrap();
        assert!(outcome.report.contains("increased all Salary values by 10%"));
        assert_eq!(outcome.ai_analysis, SKIPPED_ANALYSIS_NOTE);
    }
}
