use crate::adapters::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::core::profiler::DEFAULT_IQR_MULTIPLIER;
use crate::core::what_if::DEFAULT_CORRELATION_THRESHOLD;
use crate::utils::error::{AnalyticsError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub llm: LlmConfig,
    pub agents: AgentsConfig,
    pub profile: ProfileConfig,
    pub what_if: WhatIfConfig,
    pub output: OutputConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub retry_delay_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 120,
            retry_attempts: 2,
            retry_delay_seconds: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    pub max_iterations: usize,
    pub analyzer_temperature: f32,
    pub cleaning_temperature: f32,
    pub inference_temperature: f32,
    pub visualizer_temperature: f32,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            analyzer_temperature: 0.5,
            cleaning_temperature: 0.5,
            inference_temperature: 0.5,
            visualizer_temperature: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub iqr_multiplier: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatIfConfig {
    pub correlation_threshold: f64,
}

impl Default for WhatIfConfig {
    fn default() -> Self {
        Self {
            correlation_threshold: DEFAULT_CORRELATION_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub output_path: String,
    pub bundle: bool,
    pub bundle_filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
            bundle: false,
            bundle_filename: "analysis_bundle.zip".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

fn env_placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
    })
}

impl AnalyticsConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| AnalyticsError::ConfigError {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| AnalyticsError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GOOGLE_API_KEY})；未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> String {
        env_placeholder()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    /// 設定檔中的 API key；仍是未解析的 ${VAR} 時視為未設定
    pub fn configured_api_key(&self) -> Option<&str> {
        self.llm
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && !env_placeholder().is_match(key))
    }

    /// 依序取 CLI 參數、設定檔、環境變數 GOOGLE_API_KEY
    pub fn resolve_api_key(&self, cli_key: Option<&str>) -> Result<String> {
        if let Some(key) = cli_key.map(str::trim).filter(|k| !k.is_empty()) {
            return Ok(key.to_string());
        }
        if let Some(key) = self.configured_api_key() {
            return Ok(key.to_string());
        }
        std::env::var(API_KEY_ENV)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AnalyticsError::MissingConfigError {
                field: API_KEY_ENV.to_string(),
            })
    }
}

impl Validate for AnalyticsConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("llm.model", &self.llm.model)?;
        validation::validate_url("llm.base_url", &self.llm.base_url)?;
        validation::validate_positive_number(
            "llm.timeout_seconds",
            self.llm.timeout_seconds as usize,
            1,
        )?;
        validation::validate_positive_number(
            "agents.max_iterations",
            self.agents.max_iterations,
            1,
        )?;

        for (field, value) in [
            ("agents.analyzer_temperature", self.agents.analyzer_temperature),
            ("agents.cleaning_temperature", self.agents.cleaning_temperature),
            ("agents.inference_temperature", self.agents.inference_temperature),
            ("agents.visualizer_temperature", self.agents.visualizer_temperature),
        ] {
            validation::validate_range(field, value, 0.0, 2.0)?;
        }

        if !(self.profile.iqr_multiplier > 0.0) {
            return Err(AnalyticsError::InvalidConfigValueError {
                field: "profile.iqr_multiplier".to_string(),
                value: self.profile.iqr_multiplier.to_string(),
                reason: "Value must be greater than 0".to_string(),
            });
        }
        validation::validate_range(
            "what_if.correlation_threshold",
            self.what_if.correlation_threshold,
            0.0,
            1.0,
        )?;

        validation::validate_path("output.output_path", &self.output.output_path)?;
        validation::validate_path("output.bundle_filename", &self.output.bundle_filename)?;

        Ok(())
    }
}
