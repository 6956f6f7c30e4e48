use crate::core::stats;
use crate::domain::model::{format_number, ColumnData, Dataset};
use crate::utils::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImputeStrategy {
    Mean,
    Median,
    Mode,
}

impl std::fmt::Display for ImputeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImputeStrategy::Mean => write!(f, "mean"),
            ImputeStrategy::Median => write!(f, "median"),
            ImputeStrategy::Mode => write!(f, "mode"),
        }
    }
}

impl std::str::FromStr for ImputeStrategy {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mean" => Ok(ImputeStrategy::Mean),
            "median" => Ok(ImputeStrategy::Median),
            "mode" => Ok(ImputeStrategy::Mode),
            other => Err(AnalyticsError::ValidationError {
                message: format!(
                    "Invalid strategy '{}'. Use 'mean', 'median', or 'mode'.",
                    other
                ),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationRecord {
    pub column: String,
    pub strategy: ImputeStrategy,
    pub fill_value: String,
    pub filled: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub imputations: Vec<ImputationRecord>,
    /// 沒有任何可用值、無法補值的欄位
    pub skipped_columns: Vec<String>,
}

impl CleaningReport {
    pub fn total_filled(&self) -> usize {
        self.imputations.iter().map(|r| r.filled).sum()
    }
}

/// 預設清理：數值欄位以中位數補值，類別欄位以眾數補值
pub fn clean_dataset(dataset: &Dataset) -> (Dataset, CleaningReport) {
    let mut cleaned = dataset.clone();
    let mut report = CleaningReport::default();

    for column in dataset.columns() {
        let missing = column.data.missing_count();
        if missing == 0 {
            continue;
        }
        if missing == column.data.len() {
            tracing::warn!("⚠️ Leaving column '{}' unfilled: no values", column.name);
            report.skipped_columns.push(column.name.clone());
            continue;
        }

        let strategy = match column.data {
            ColumnData::Numeric(_) => ImputeStrategy::Median,
            ColumnData::Categorical(_) => ImputeStrategy::Mode,
        };

        match impute_column(&mut cleaned, &column.name, strategy) {
            Ok(record) => report.imputations.push(record),
            Err(e) => {
                tracing::warn!("⚠️ Leaving column '{}' unfilled: {}", column.name, e);
                report.skipped_columns.push(column.name.clone());
            }
        }
    }

    tracing::info!(
        "✅ Dataset cleaned: {} cells filled across {} columns",
        report.total_filled(),
        report.imputations.len()
    );
    (cleaned, report)
}

/// 以指定策略補齊單一欄位的缺值。
/// 全為缺值的數值欄位以 mean/median 補值時維持原樣（`filled` 為 0）
pub fn impute_column(
    dataset: &mut Dataset,
    column_name: &str,
    strategy: ImputeStrategy,
) -> Result<ImputationRecord> {
    let column = dataset.require_column(column_name)?;
    let filled = column.data.missing_count();

    let (data, fill_value) = match (&column.data, strategy) {
        (ColumnData::Numeric(values), _) => {
            let present = column.data.present_numbers();
            let fill = match strategy {
                ImputeStrategy::Mean => stats::mean(&present),
                ImputeStrategy::Median => stats::median(&present),
                ImputeStrategy::Mode => stats::numeric_mode(&present),
            };
            let fill = match fill {
                Some(fill) => fill,
                None if strategy == ImputeStrategy::Mode => {
                    return Err(AnalyticsError::ProcessingError {
                        message: format!(
                            "column '{}' has no values to compute the mode",
                            column_name
                        ),
                    })
                }
                None => {
                    tracing::debug!("No values in '{}', {} left as is", column_name, strategy);
                    return Ok(ImputationRecord {
                        column: column_name.to_string(),
                        strategy,
                        fill_value: "NaN".to_string(),
                        filled: 0,
                    });
                }
            };
            let data = values.iter().map(|v| Some(v.unwrap_or(fill))).collect();
            (ColumnData::Numeric(data), format_number(fill))
        }
        (ColumnData::Categorical(values), ImputeStrategy::Mode) => {
            let fill = stats::mode(values.iter().flatten().map(String::as_str)).ok_or_else(|| {
                AnalyticsError::ProcessingError {
                    message: format!("column '{}' has no values to compute the mode", column_name),
                }
            })?;
            let data = values
                .iter()
                .map(|v| Some(v.clone().unwrap_or_else(|| fill.clone())))
                .collect();
            (ColumnData::Categorical(data), fill)
        }
        (ColumnData::Categorical(_), _) => {
            return Err(AnalyticsError::ProcessingError {
                message: format!(
                    "cannot compute the {} of categorical column '{}'",
                    strategy, column_name
                ),
            })
        }
    };

    dataset.replace_column(column_name, data)?;
    tracing::debug!(
        "Imputed {} cells in '{}' with {} = {}",
        filled,
        column_name,
        strategy,
        fill_value
    );

    Ok(ImputationRecord {
        column: column_name.to_string(),
        strategy,
        fill_value,
        filled,
    })
}
