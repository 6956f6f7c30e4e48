use crate::core::stats;
use crate::domain::model::{ColumnData, Dataset};
use crate::utils::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Histogram,
    Bar,
    Scatter,
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartKind::Histogram => write!(f, "histogram"),
            ChartKind::Bar => write!(f, "bar"),
            ChartKind::Scatter => write!(f, "scatter"),
        }
    }
}

/// 可攜式的圖表定義（Vega-Lite v5，資料內嵌）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub spec: Value,
}

impl ChartSpec {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.spec)?)
    }

    /// 內嵌資料的筆數
    pub fn data_len(&self) -> usize {
        self.spec["data"]["values"]
            .as_array()
            .map(Vec::len)
            .unwrap_or(0)
    }
}

pub fn histogram(dataset: &Dataset, column_name: &str) -> Result<ChartSpec> {
    let values = dataset.require_numeric(column_name)?;
    let rows: Vec<Value> = values
        .iter()
        .flatten()
        .map(|v| json!({ column_name: v }))
        .collect();

    let title = format!("Distribution of {}", column_name);
    Ok(ChartSpec {
        kind: ChartKind::Histogram,
        spec: json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": title,
            "data": { "values": rows },
            "mark": "bar",
            "encoding": {
                "x": { "field": column_name, "type": "quantitative", "bin": true },
                "y": { "aggregate": "count", "type": "quantitative" }
            }
        }),
        title,
    })
}

pub fn bar_chart(dataset: &Dataset, column_name: &str) -> Result<ChartSpec> {
    let column = dataset.require_column(column_name)?;
    let labels: Vec<String> = (0..dataset.row_count())
        .filter_map(|row| column.data.display_value(row))
        .collect();
    let counts = stats::value_counts(labels.iter().map(String::as_str));

    let rows: Vec<Value> = counts
        .iter()
        .map(|(value, count)| json!({ column_name: value, "count": count }))
        .collect();

    let title = format!("Value Counts of {}", column_name);
    Ok(ChartSpec {
        kind: ChartKind::Bar,
        spec: json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": title,
            "data": { "values": rows },
            "mark": "bar",
            "encoding": {
                "x": { "field": column_name, "type": "nominal", "sort": "-y" },
                "y": { "field": "count", "type": "quantitative" }
            }
        }),
        title,
    })
}

pub fn scatter(dataset: &Dataset, x_column: &str, y_column: &str) -> Result<ChartSpec> {
    let x = dataset.require_numeric(x_column)?;
    let y = dataset.require_numeric(y_column)?;

    let rows: Vec<Value> = x
        .iter()
        .zip(y.iter())
        .filter_map(|pair| match pair {
            (Some(a), Some(b)) => Some(json!({ x_column: a, y_column: b })),
            _ => None,
        })
        .collect();

    let title = format!("Relationship between {} and {}", x_column, y_column);
    Ok(ChartSpec {
        kind: ChartKind::Scatter,
        spec: json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": title,
            "data": { "values": rows },
            "mark": "point",
            "encoding": {
                "x": { "field": x_column, "type": "quantitative" },
                "y": { "field": y_column, "type": "quantitative" }
            }
        }),
        title,
    })
}

/// 檢查散佈圖的兩個欄位，錯誤訊息列出缺少或非數值的欄位
pub fn check_scatter_columns(dataset: &Dataset, x_column: &str, y_column: &str) -> Result<()> {
    let missing: Vec<String> = [x_column, y_column]
        .iter()
        .filter(|c| dataset.column(c).is_none())
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AnalyticsError::ValidationError {
            message: format!(
                "Column(s) {:?} not found. Available columns: {:?}",
                missing,
                dataset.column_names()
            ),
        });
    }

    let non_numeric: Vec<String> = [x_column, y_column]
        .iter()
        .filter(|c| {
            dataset
                .column(c)
                .map(|col| !matches!(col.data, ColumnData::Numeric(_)))
                .unwrap_or(false)
        })
        .map(|c| c.to_string())
        .collect();
    if !non_numeric.is_empty() {
        return Err(AnalyticsError::ValidationError {
            message: format!(
                "Column(s) {:?} are not numerical. Scatter plots require numerical data.",
                non_numeric
            ),
        });
    }

    Ok(())
}
