use crate::app::agents::executor::{string_arg, unknown_tool, AgentExecutor};
use crate::app::agents::prompts::CLEANING_SYSTEM_PROMPT;
use crate::core::cleaner::{self, ImputeStrategy};
use crate::domain::chat::ToolDefinition;
use crate::domain::model::Dataset;
use crate::domain::ports::{LanguageModel, ToolSet};
use crate::utils::error::Result;
use std::sync::{Arc, Mutex};

/// 代理工具共享的資料集狀態
#[derive(Debug, Clone)]
pub struct DatasetHandle {
    inner: Arc<Mutex<Dataset>>,
}

impl DatasetHandle {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            inner: Arc::new(Mutex::new(dataset)),
        }
    }

    /// 取得目前資料集的副本
    pub fn get(&self) -> Dataset {
        match self.inner.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update(&self, dataset: Dataset) {
        match self.inner.lock() {
            Ok(mut guard) => *guard = dataset,
            Err(poisoned) => *poisoned.into_inner() = dataset,
        }
        tracing::debug!("Dataset has been updated by a tool");
    }
}

pub struct CleaningToolSet {
    handle: DatasetHandle,
}

impl CleaningToolSet {
    pub fn new(handle: DatasetHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &DatasetHandle {
        &self.handle
    }

    pub fn get_missing_values_summary(&self) -> String {
        let dataset = self.handle.get();
        let rows = dataset.row_count();

        let missing: Vec<(String, usize)> = dataset
            .columns()
            .iter()
            .map(|c| (c.name.clone(), c.data.missing_count()))
            .filter(|(_, count)| *count > 0)
            .collect();

        if missing.is_empty() {
            return "No missing values found in the DataFrame.".to_string();
        }

        let width = missing
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max("column".len());

        let mut summary = format!(
            "Missing Values Summary:\n{:<width$}  missing_count  missing_percentage",
            "column",
            width = width
        );
        for (name, count) in missing {
            let percentage = if rows == 0 {
                0.0
            } else {
                count as f64 / rows as f64 * 100.0
            };
            summary.push_str(&format!(
                "\n{:<width$}  {:>13}  {:>18.2}",
                name,
                count,
                percentage,
                width = width
            ));
        }
        summary
    }

    pub fn impute_column(&self, column_name: &str, strategy: &str) -> String {
        let mut dataset = self.handle.get();
        if dataset.column(column_name).is_none() {
            return format!("Error: Column '{}' not found.", column_name);
        }

        let strategy: ImputeStrategy = match strategy.parse() {
            Ok(strategy) => strategy,
            Err(_) => {
                return format!(
                    "Error: Invalid strategy '{}'. Use 'mean', 'median', or 'mode'.",
                    strategy
                )
            }
        };

        match cleaner::impute_column(&mut dataset, column_name, strategy) {
            Ok(_) => {
                self.handle.update(dataset);
                format!(
                    "Successfully imputed column '{}' with strategy '{}'.",
                    column_name, strategy
                )
            }
            Err(e) => format!("An error occurred while imputing {}: {}", column_name, e),
        }
    }
}

impl ToolSet for CleaningToolSet {
    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "get_missing_values_summary",
                "Analyzes the current dataset and returns a string summary of columns that have missing values.",
            ),
            ToolDefinition::new(
                "impute_column",
                "Imputes missing values in a specified column using a given strategy ('mean', 'median', or 'mode').",
            )
            .with_string_params(&[
                ("column_name", "The name of the column to impute."),
                ("strategy", "One of 'mean', 'median' (numeric columns) or 'mode' (any column)."),
            ]),
        ]
    }

    fn invoke(&self, name: &str, arguments: &serde_json::Value) -> Result<String> {
        match name {
            "get_missing_values_summary" => Ok(self.get_missing_values_summary()),
            "impute_column" => {
                let column = string_arg(arguments, "column_name")?;
                let strategy = string_arg(arguments, "strategy")?;
                Ok(self.impute_column(&column, &strategy))
            }
            other => Err(unknown_tool(other, &self.definitions())),
        }
    }
}

pub fn create_cleaning_agent<M: LanguageModel>(
    model: Arc<M>,
    handle: DatasetHandle,
) -> AgentExecutor<M, CleaningToolSet> {
    AgentExecutor::new(
        "Cleaning",
        model,
        CleaningToolSet::new(handle),
        CLEANING_SYSTEM_PROMPT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tools() -> CleaningToolSet {
        let dataset =
            Dataset::from_csv_bytes(b"Age,City\n20,Paris\n,Lyon\n40,\n30,Lyon\n").unwrap();
        CleaningToolSet::new(DatasetHandle::new(dataset))
    }

    #[test]
    fn test_missing_summary_lists_only_incomplete_columns() {
        let summary = tools().get_missing_values_summary();
        assert!(summary.starts_with("Missing Values Summary:"));
        assert!(summary.contains("Age"));
        assert!(summary.contains("25.00"));
    }

    #[test]
    fn test_impute_updates_shared_dataset() {
        let tools = tools();
        let message = tools.impute_column("Age", "mean");
        assert_eq!(message, "Successfully imputed column 'Age' with strategy 'mean'.");

        let message = tools.impute_column("City", "mode");
        assert_eq!(message, "Successfully imputed column 'City' with strategy 'mode'.");

        assert_eq!(tools.handle().get().total_missing(), 0);
        assert_eq!(
            tools.get_missing_values_summary(),
            "No missing values found in the DataFrame."
        );
    }

    #[test]
    fn test_impute_error_messages() {
        let tools = tools();
        assert_eq!(tools.impute_column("Height", "mean"), "Error: Column 'Height' not found.");
        assert_eq!(
            tools.impute_column("Age", "average"),
            "Error: Invalid strategy 'average'. Use 'mean', 'median', or 'mode'."
        );
        assert!(tools
            .impute_column("City", "median")
            .starts_with("An error occurred while imputing City:"));
    }

    #[test]
    fn test_impute_all_missing_column() {
        let dataset = Dataset::from_csv_bytes(b"a,b\n1,\n2,\n").unwrap();
        let tools = CleaningToolSet::new(DatasetHandle::new(dataset));

        assert_eq!(
            tools.impute_column("b", "mean"),
            "Successfully imputed column 'b' with strategy 'mean'."
        );
        assert_eq!(
            tools.impute_column("b", "median"),
            "Successfully imputed column 'b' with strategy 'median'."
        );
        assert_eq!(tools.handle().get().total_missing(), 2);
        assert!(tools
            .impute_column("b", "mode")
            .starts_with("An error occurred while imputing b:"));
    }

    #[test]
    fn test_invoke_dispatch() {
        let tools = tools();
        let result = tools
            .invoke("impute_column", &json!({"column_name": "Age", "strategy": "median"}))
            .unwrap();
        assert!(result.starts_with("Successfully"));
        assert!(tools.invoke("drop_column", &json!({})).is_err());
        assert!(tools.invoke("impute_column", &json!({"column_name": "Age"})).is_err());
    }
}
