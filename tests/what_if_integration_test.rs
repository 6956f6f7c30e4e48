mod common;

use augmented_analytics::core::what_if::{ChangeType, Modification};
use augmented_analytics::{
    AnalyticsConfig, AnalyticsError, Dataset, GeminiClient, LocalStorage, Orchestrator,
};
use common::*;
use httpmock::prelude::*;
use std::sync::Arc;
use tempfile::TempDir;

fn employees() -> Dataset {
    Dataset::from_csv_bytes(
        b"Experience,Salary,Bonus,City\n1,40000,2000,Paris\n3,52000,2600,Lyon\n5,61000,3100,Paris\n8,80000,4000,Nice\n10,95000,4700,Paris\n",
    )
    .unwrap()
}

#[tokio::test]
async fn test_percentage_scenario_without_ai() {
    let temp_dir = TempDir::new().unwrap();
    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap());
    let orchestrator: Orchestrator<GeminiClient, _> =
        Orchestrator::new(None, storage, AnalyticsConfig::default());

    let modification = Modification::new("Salary", ChangeType::PercentageIncrease, 10.0);
    let outcome = orchestrator
        .run_what_if(&employees(), &modification)
        .await
        .unwrap();

    let scenario = &outcome.scenario;
    let original_mean = scenario.original_stats.mean.unwrap();
    let new_mean = scenario.new_stats.mean.unwrap();
    assert!((new_mean - original_mean * 1.1).abs() < 1e-6);

    // 與薪資高度相關的 Experience 與 Bonus 都應列出
    let related: Vec<&str> = scenario.impacts.iter().map(|i| i.column.as_str()).collect();
    assert!(related.contains(&"Experience"));
    assert!(related.contains(&"Bonus"));
    assert!(scenario
        .impacts
        .iter()
        .all(|i| i.estimated_impact.map(|v| v > 0.0).unwrap_or(false)));

    assert!(outcome.report.contains("increased all Salary values by 10%"));
    assert!(outcome.report.contains("| Statistic | Original | New | Change | % Change |"));

    let path = orchestrator.save_what_if(&outcome).await.unwrap();
    assert!(std::fs::read_to_string(path).unwrap().contains("What-If Scenario"));
}

#[tokio::test]
async fn test_set_to_value_scenario_with_ai_analysis() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    let analyst = server.mock(|when, then| {
        when.method(POST)
            .path(GENERATE_PATH)
            .body_contains("expert data analyst");
        then.status(200).json_body(text_response("Bonuses would look out of line."));
    });

    let mut config = AnalyticsConfig::default();
    config.llm = llm_config(&server);
    let model = Arc::new(GeminiClient::new(TEST_API_KEY, &config.llm).unwrap());
    let orchestrator = Orchestrator::new(
        Some(model),
        LocalStorage::new(temp_dir.path().to_str().unwrap()),
        config,
    );

    let modification = Modification::new("Salary", ChangeType::SetToValue, 70000.0);
    let outcome = orchestrator
        .run_what_if(&employees(), &modification)
        .await
        .unwrap();

    analyst.assert();
    assert_eq!(outcome.scenario.new_stats.std, Some(0.0));
    assert!(outcome.report.contains("set all Salary values to 70000"));
    assert!(outcome.report.contains("Bonuses would look out of line."));
}

#[tokio::test]
async fn test_scenario_rejects_categorical_column() {
    let temp_dir = TempDir::new().unwrap();
    let orchestrator: Orchestrator<GeminiClient, _> = Orchestrator::new(
        None,
        LocalStorage::new(temp_dir.path().to_str().unwrap()),
        AnalyticsConfig::default(),
    );

    let modification = Modification::new("City", ChangeType::PercentageDecrease, 5.0);
    let result = orchestrator.run_what_if(&employees(), &modification).await;
    assert!(matches!(result, Err(AnalyticsError::ColumnNotNumeric { .. })));
}
