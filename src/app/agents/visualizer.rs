use crate::app::agents::executor::{string_arg, unknown_tool, AgentExecutor};
use crate::app::agents::prompts::VISUALIZER_SYSTEM_PROMPT;
use crate::core::charts::{self, ChartSpec};
use crate::domain::chat::ToolDefinition;
use crate::domain::model::{ColumnKind, Dataset};
use crate::domain::ports::{LanguageModel, ToolSet};
use crate::utils::error::Result;
use std::sync::{Arc, Mutex};

/// 最近一次工具產生的圖表；每輪對話由呼叫端取走
#[derive(Debug, Clone, Default)]
pub struct ChartSlot {
    inner: Arc<Mutex<Option<ChartSpec>>>,
}

impl ChartSlot {
    pub fn store(&self, chart: ChartSpec) {
        match self.inner.lock() {
            Ok(mut guard) => *guard = Some(chart),
            Err(poisoned) => *poisoned.into_inner() = Some(chart),
        }
    }

    pub fn take(&self) -> Option<ChartSpec> {
        match self.inner.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    pub fn clear(&self) {
        let _ = self.take();
    }
}

pub struct VisualizerToolSet {
    dataset: Dataset,
    slot: ChartSlot,
}

impl VisualizerToolSet {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            slot: ChartSlot::default(),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn slot(&self) -> &ChartSlot {
        &self.slot
    }

    pub fn take_chart(&self) -> Option<ChartSpec> {
        self.slot.take()
    }

    pub fn plot_histogram(&self, column_name: &str) -> String {
        match self.dataset.column(column_name) {
            None => return format!("Error: Column '{}' not found in the data.", column_name),
            Some(column) if column.kind() != ColumnKind::Numeric => {
                return format!(
                    "Error: Column '{}' is not numerical. Histograms require numerical data.",
                    column_name
                )
            }
            Some(_) => {}
        }

        match charts::histogram(&self.dataset, column_name) {
            Ok(chart) => {
                self.slot.store(chart);
                format!("✅ Successfully created histogram for '{}'", column_name)
            }
            Err(e) => format!("Error creating histogram: {}", e),
        }
    }

    pub fn plot_bar_chart(&self, column_name: &str) -> String {
        if self.dataset.column(column_name).is_none() {
            return format!("Error: Column '{}' not found in the data.", column_name);
        }

        match charts::bar_chart(&self.dataset, column_name) {
            Ok(chart) => {
                self.slot.store(chart);
                format!("✅ Successfully created bar chart for '{}'", column_name)
            }
            Err(e) => format!("Error creating bar chart: {}", e),
        }
    }

    pub fn plot_scatter(&self, x_column: &str, y_column: &str) -> String {
        if let Err(e) = charts::check_scatter_columns(&self.dataset, x_column, y_column) {
            return match e {
                crate::utils::error::AnalyticsError::ValidationError { message } => {
                    format!("Error: {}", message)
                }
                other => format!("Error creating scatter plot: {}", other),
            };
        }

        match charts::scatter(&self.dataset, x_column, y_column) {
            Ok(chart) => {
                self.slot.store(chart);
                format!(
                    "✅ Successfully created scatter plot of '{}' vs '{}'",
                    x_column, y_column
                )
            }
            Err(e) => format!("Error creating scatter plot: {}", e),
        }
    }
}

impl ToolSet for VisualizerToolSet {
    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "plot_histogram",
                "Creates a histogram for a numerical column. Returns success message.",
            )
            .with_string_params(&[("column_name", "The name of the numerical column to plot.")]),
            ToolDefinition::new(
                "plot_bar_chart",
                "Creates a bar chart for a categorical column. Returns success message.",
            )
            .with_string_params(&[("column_name", "The name of the categorical column to plot.")]),
            ToolDefinition::new(
                "plot_scatter",
                "Creates a scatter plot for two numerical columns. Returns success message.",
            )
            .with_string_params(&[
                ("x_column", "The column for the x-axis."),
                ("y_column", "The column for the y-axis."),
            ]),
        ]
    }

    fn invoke(&self, name: &str, arguments: &serde_json::Value) -> Result<String> {
        match name {
            "plot_histogram" => Ok(self.plot_histogram(&string_arg(arguments, "column_name")?)),
            "plot_bar_chart" => Ok(self.plot_bar_chart(&string_arg(arguments, "column_name")?)),
            "plot_scatter" => {
                let x = string_arg(arguments, "x_column")?;
                let y = string_arg(arguments, "y_column")?;
                Ok(self.plot_scatter(&x, &y))
            }
            other => Err(unknown_tool(other, &self.definitions())),
        }
    }
}

pub fn create_visualizer_agent<M: LanguageModel>(
    model: Arc<M>,
    dataset: Dataset,
) -> AgentExecutor<M, VisualizerToolSet> {
    AgentExecutor::new(
        "Visualizer",
        model,
        VisualizerToolSet::new(dataset),
        VISUALIZER_SYSTEM_PROMPT,
    )
    .with_temperature(0.1)
}
