use crate::config::toml_config::AnalyticsConfig;
use crate::core::what_if::{ChangeType, Modification};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "analytics.toml";

#[derive(Debug, Clone, Parser)]
#[command(name = "augmented-analytics")]
#[command(about = "Agent-driven CSV analytics: clean, profile, report, chart and what-if")]
#[command(version)]
pub struct Cli {
    /// TOML 設定檔（預設讀取存在的 analytics.toml）
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Output directory (overrides output.output_path)")]
    pub output: Option<String>,

    /// 指定 env 檔（預設讀取工作目錄的 .env）
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    #[arg(long, global = true, help = "Gemini API key (overrides GOOGLE_API_KEY)")]
    pub api_key: Option<String>,

    #[arg(long, global = true, help = "Model name (overrides llm.model)")]
    pub model: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log CPU and memory usage per stage")]
    pub monitor: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// 完整流程：清理 → 統計 → 報告
    Analyze(AnalyzeArgs),
    /// 輸出統計摘要 JSON
    Profile(InputArgs),
    /// 清理資料並寫出 cleaned.csv
    Clean(CleanArgs),
    /// 套用假設情境並產生報告
    WhatIf(WhatIfArgs),
    /// 不經模型直接產生圖表
    Plot(PlotArgs),
    /// 以一句話請 Visualizer 代理畫圖
    Visualize(VisualizeArgs),
    /// 與 Visualizer 代理互動對話
    Chat(InputArgs),
}

#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// CSV 檔案路徑
    pub csv: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct AnalyzeArgs {
    pub csv: PathBuf,

    #[arg(long, help = "Skip the Analyst and write only deterministic outputs")]
    pub skip_ai: bool,

    #[arg(long, help = "Let the inference agent build the summary for the Analyst")]
    pub agentic_profile: bool,

    #[arg(long, help = "Instructions for the cleaning agent (replaces default cleaning)")]
    pub clean_instructions: Option<String>,

    #[arg(long, help = "Also write a zip bundle of all outputs")]
    pub bundle: bool,
}

#[derive(Debug, Clone, Args)]
pub struct CleanArgs {
    pub csv: PathBuf,

    #[arg(long, help = "Instructions for the cleaning agent")]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct WhatIfArgs {
    pub csv: PathBuf,

    #[arg(long)]
    pub column: String,

    #[arg(long, help = "percentage-increase, percentage-decrease or set-to-value")]
    pub change: String,

    #[arg(long, allow_negative_numbers = true)]
    pub value: f64,

    #[arg(long, help = "Skip the AI analysis of the modified data")]
    pub skip_ai: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlotKind {
    Histogram,
    Bar,
    Scatter,
}

#[derive(Debug, Clone, Args)]
pub struct PlotArgs {
    pub csv: PathBuf,

    #[arg(value_enum)]
    pub kind: PlotKind,

    /// 直方圖與長條圖的欄位；散佈圖的 x 軸
    pub column: String,

    /// 散佈圖的 y 軸
    pub y_column: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct VisualizeArgs {
    pub csv: PathBuf,

    #[arg(long)]
    pub prompt: String,
}

impl Cli {
    pub fn csv_path(&self) -> &Path {
        match &self.command {
            Commands::Analyze(args) => &args.csv,
            Commands::Profile(args) | Commands::Chat(args) => &args.csv,
            Commands::Clean(args) => &args.csv,
            Commands::WhatIf(args) => &args.csv,
            Commands::Plot(args) => &args.csv,
            Commands::Visualize(args) => &args.csv,
        }
    }

    /// 是否需要呼叫語言模型（決定是否必須提供 API key）
    pub fn needs_model(&self) -> bool {
        match &self.command {
            Commands::Analyze(args) => !args.skip_ai,
            Commands::Clean(args) => args.instructions.is_some(),
            Commands::WhatIf(args) => !args.skip_ai,
            Commands::Visualize(_) | Commands::Chat(_) => true,
            Commands::Profile(_) | Commands::Plot(_) => false,
        }
    }

    /// 讀取設定檔並套用 CLI 覆寫：CLI > TOML > 預設值
    pub fn load_config(&self) -> Result<AnalyticsConfig> {
        let mut config = match &self.config {
            Some(path) => AnalyticsConfig::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                AnalyticsConfig::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => AnalyticsConfig::default(),
        };

        if let Some(output) = &self.output {
            config.output.output_path = output.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if self.monitor {
            config.monitoring.enabled = true;
        }
        if let Commands::Analyze(args) = &self.command {
            if args.bundle {
                config.output.bundle = true;
            }
        }
        Ok(config)
    }
}

impl WhatIfArgs {
    pub fn modification(&self) -> Result<Modification> {
        let change: ChangeType = self.change.parse()?;
        Ok(Modification::new(self.column.clone(), change, self.value))
    }
}

impl Validate for Cli {
    fn validate(&self) -> Result<()> {
        let csv = self.csv_path().to_string_lossy();
        validation::validate_path("csv", &csv)?;
        validation::validate_file_extension("csv", &csv, &["csv"])?;

        if let Some(output) = &self.output {
            validation::validate_path("output", output)?;
        }
        if let Some(model) = &self.model {
            validation::validate_non_empty_string("model", model)?;
        }
        if let Commands::Plot(args) = &self.command {
            if args.kind == PlotKind::Scatter && args.y_column.is_none() {
                return Err(crate::utils::error::AnalyticsError::ValidationError {
                    message: "Scatter plots need a second column: plot <csv> scatter <x> <y>"
                        .to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze_with_global_flags() {
        let cli = Cli::try_parse_from([
            "augmented-analytics",
            "analyze",
            "data.csv",
            "--skip-ai",
            "--bundle",
            "--output",
            "out",
            "--env-file",
            "custom.env",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.env_file.as_deref(), Some(Path::new("custom.env")));
        assert!(!cli.needs_model());
        assert!(cli.validate().is_ok());

        let config = cli.load_config().unwrap();
        assert_eq!(config.output.output_path, "out");
        assert!(config.output.bundle);
    }

    #[test]
    fn test_parse_what_if() {
        let cli = Cli::try_parse_from([
            "augmented-analytics",
            "what-if",
            "data.csv",
            "--column",
            "Salary",
            "--change",
            "percentage-increase",
            "--value",
            "10",
        ])
        .unwrap();

        let Commands::WhatIf(args) = &cli.command else {
            panic!("expected what-if");
        };
        let modification = args.modification().unwrap();
        assert_eq!(modification.change_type, ChangeType::PercentageIncrease);
        assert_eq!(modification.value, 10.0);
        assert!(cli.needs_model());
    }

    #[test]
    fn test_scatter_requires_two_columns() {
        let cli = Cli::try_parse_from([
            "augmented-analytics",
            "plot",
            "data.csv",
            "scatter",
            "Age",
        ])
        .unwrap();
        assert!(cli.validate().is_err());

        let cli = Cli::try_parse_from(["augmented-analytics", "plot", "data.txt", "bar", "City"])
            .unwrap();
        assert!(cli.validate().is_err());
    }
}
