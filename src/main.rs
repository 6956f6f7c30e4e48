use augmented_analytics::app::session::save_chart;
use augmented_analytics::config::cli::{Commands, PlotKind};
use augmented_analytics::config::env::load_dotenv;
use augmented_analytics::core::charts;
use augmented_analytics::utils::error::AnalyticsError;
use augmented_analytics::utils::{logger, validation::Validate};
use augmented_analytics::{
    Cli, Dataset, GeminiClient, LocalStorage, Orchestrator, PipelineOptions, Result,
};
use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

type App = Orchestrator<GeminiClient, LocalStorage>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // .env 需在讀取設定前載入，GOOGLE_API_KEY 才能被讀到
    let dotenv_path = load_dotenv(cli.env_file.as_deref());

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting augmented-analytics CLI");
    if let Some(path) = dotenv_path {
        tracing::debug!("Loaded environment from {}", path.display());
    }
    if cli.verbose {
        tracing::debug!("CLI arguments: {:?}", cli);
    }

    if let Err(e) = run(cli).await {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ Analysis failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        // 輸出用戶友好的錯誤信息
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = e.exit_code();
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    // 驗證配置
    cli.validate()?;
    let config = cli.load_config()?;
    config.validate()?;

    if config.monitoring.enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let dataset = Dataset::from_path(cli.csv_path())?;
    tracing::info!(
        "📥 Loaded {} ({} rows, {} columns)",
        cli.csv_path().display(),
        dataset.row_count(),
        dataset.column_count()
    );

    let model = if cli.needs_model() {
        let api_key = config.resolve_api_key(cli.api_key.as_deref())?;
        Some(Arc::new(GeminiClient::new(api_key, &config.llm)?))
    } else {
        None
    };

    let storage = LocalStorage::new(config.output.output_path.clone());
    let app: App = Orchestrator::new(model, storage, config);

    match &cli.command {
        Commands::Analyze(args) => {
            let options = PipelineOptions {
                clean_instructions: args.clean_instructions.clone(),
                agentic_profile: args.agentic_profile,
            };
            let outcome = app.run_pipeline(&dataset, &options).await?;
            let saved = app.save_outputs(&outcome).await?;

            println!("✅ Analysis completed successfully!");
            println!("📄 Report: {}", saved.report);
            println!("🧹 Cleaned data: {}", saved.cleaned);
            println!("📊 Profile: {}", saved.profile);
            if let Some(bundle) = saved.bundle {
                println!("📦 Bundle: {}", bundle);
            }
        }
        Commands::Profile(_) => {
            let (_, profile_json) = app.profile(&dataset, false).await?;
            println!("{}", profile_json);
        }
        Commands::Clean(args) => {
            let (cleaned, summary) = app.clean(&dataset, args.instructions.as_deref()).await?;
            if let Some(response) = &summary.agent_response {
                println!("🤖 {}", response);
            }
            let path = app.save_cleaned(&cleaned).await?;
            println!(
                "✅ Missing cells: {} → {}",
                summary.missing_before, summary.missing_after
            );
            println!("📁 Cleaned data saved to: {}", path);
        }
        Commands::WhatIf(args) => {
            let modification = args.modification()?;
            let (cleaned, _) = app.clean(&dataset, None).await?;
            let outcome = app.run_what_if(&cleaned, &modification).await?;
            let path = app.save_what_if(&outcome).await?;

            println!("{}", outcome.report);
            println!("📁 Scenario report saved to: {}", path);
        }
        Commands::Plot(args) => {
            let (cleaned, _) = app.clean(&dataset, None).await?;
            let chart = match (args.kind, args.y_column.as_deref()) {
                (PlotKind::Histogram, _) => charts::histogram(&cleaned, &args.column)?,
                (PlotKind::Bar, _) => charts::bar_chart(&cleaned, &args.column)?,
                (PlotKind::Scatter, Some(y_column)) => {
                    charts::check_scatter_columns(&cleaned, &args.column, y_column)?;
                    charts::scatter(&cleaned, &args.column, y_column)?
                }
                (PlotKind::Scatter, None) => {
                    return Err(AnalyticsError::ValidationError {
                        message: "Scatter plots need a y column".to_string(),
                    })
                }
            };
            let path = save_chart(app.storage(), &chart).await?;
            println!("✅ {} ({} points)", chart.title, chart.data_len());
            println!("📁 Chart saved to: {}", path);
        }
        Commands::Visualize(args) => {
            let (cleaned, _) = app.clean(&dataset, None).await?;
            let mut session = app.visualizer_session(cleaned)?;
            let reply = session.ask(&args.prompt).await?;

            println!("{}", reply.text);
            if let Some(path) = reply.saved_path {
                println!("📁 Chart saved to: {}", path);
            }
        }
        Commands::Chat(_) => {
            let (cleaned, _) = app.clean(&dataset, None).await?;
            let mut session = app.visualizer_session(cleaned)?;
            chat_loop(&mut session).await?;
        }
    }

    Ok(())
}

async fn chat_loop(
    session: &mut augmented_analytics::VisualizerSession<GeminiClient, LocalStorage>,
) -> Result<()> {
    println!("📊 Visualizer ready. Columns: {}", session.column_names().join(", "));
    println!("Ask for a chart (e.g. \"histogram of Age\"), or type 'exit' to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }
        if prompt.eq_ignore_ascii_case("exit") || prompt.eq_ignore_ascii_case("quit") {
            break;
        }

        // 單輪失敗不結束對話
        match session.ask(prompt).await {
            Ok(reply) => {
                println!("{}", reply.text);
                if let Some(path) = reply.saved_path {
                    println!("📁 Chart saved to: {}", path);
                }
            }
            Err(e) => {
                tracing::warn!("⚠️ Visualizer turn failed: {}", e);
                eprintln!("❌ {}", e.user_friendly_message());
            }
        }
    }

    println!("👋 Bye");
    Ok(())
}
