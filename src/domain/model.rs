use crate::utils::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
        }
    }
}

/// 欄位資料；`None` 代表缺值
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

impl ColumnData {
    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Numeric(_) => ColumnKind::Numeric,
            ColumnData::Categorical(_) => ColumnKind::Categorical,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Categorical(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn missing_count(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.iter().filter(|v| v.is_none()).count(),
            ColumnData::Categorical(values) => values.iter().filter(|v| v.is_none()).count(),
        }
    }

    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match self {
            ColumnData::Numeric(values) => Some(values),
            ColumnData::Categorical(_) => None,
        }
    }

    /// 數值欄位中所有非缺值
    pub fn present_numbers(&self) -> Vec<f64> {
        match self {
            ColumnData::Numeric(values) => values.iter().flatten().copied().collect(),
            ColumnData::Categorical(_) => Vec::new(),
        }
    }

    /// 以字串表示某列的值（圖表與次數統計共用）
    pub fn display_value(&self, row: usize) -> Option<String> {
        match self {
            ColumnData::Numeric(values) => values.get(row).copied().flatten().map(format_number),
            ColumnData::Categorical(values) => values.get(row).cloned().flatten(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn categorical(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Categorical(values),
        }
    }

    pub fn kind(&self) -> ColumnKind {
        self.data.kind()
    }
}

/// 記憶體中的表格資料，欄位順序與 CSV 標頭一致
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(AnalyticsError::DatasetError {
                    message: format!("Duplicate column name '{}'", column.name),
                });
            }
        }

        if let Some(first) = columns.first() {
            let rows = first.data.len();
            if let Some(bad) = columns.iter().find(|c| c.data.len() != rows) {
                return Err(AnalyticsError::DatasetError {
                    message: format!(
                        "Column '{}' has {} rows, expected {}",
                        bad.name,
                        bad.data.len(),
                        rows
                    ),
                });
            }
        }

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| AnalyticsError::ColumnNotFound {
                column: name.to_string(),
                available: self.column_names(),
            })
    }

    pub fn require_numeric(&self, name: &str) -> Result<&[Option<f64>]> {
        self.require_column(name)?
            .data
            .as_numeric()
            .ok_or_else(|| AnalyticsError::ColumnNotNumeric {
                column: name.to_string(),
            })
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn numeric_column_names(&self) -> Vec<String> {
        self.names_of_kind(ColumnKind::Numeric)
    }

    pub fn categorical_column_names(&self) -> Vec<String> {
        self.names_of_kind(ColumnKind::Categorical)
    }

    fn names_of_kind(&self, kind: ColumnKind) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.kind() == kind)
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.data.len()).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(|c| c.data.missing_count()).sum()
    }

    pub fn replace_column(&mut self, name: &str, data: ColumnData) -> Result<()> {
        let rows = self.row_count();
        let available = self.column_names();
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| AnalyticsError::ColumnNotFound {
                column: name.to_string(),
                available,
            })?;

        if data.len() != rows {
            return Err(AnalyticsError::DatasetError {
                message: format!(
                    "Replacement for '{}' has {} rows, expected {}",
                    name,
                    data.len(),
                    rows
                ),
            });
        }

        column.data = data;
        Ok(())
    }
}

/// 整數值不帶小數點輸出
pub fn format_number(value: f64) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new(vec![
            Column::numeric("Age", vec![Some(25.0), None, Some(40.0)]),
            Column::categorical(
                "City",
                vec![Some("Paris".to_string()), Some("Lyon".to_string()), None],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_column_lookup_by_kind() {
        let dataset = sample();
        assert_eq!(dataset.row_count(), 3);
        assert_eq!(dataset.numeric_column_names(), vec!["Age"]);
        assert_eq!(dataset.categorical_column_names(), vec!["City"]);
        assert_eq!(dataset.total_missing(), 2);
    }

    #[test]
    fn test_require_numeric_errors() {
        let dataset = sample();
        assert!(matches!(
            dataset.require_numeric("City"),
            Err(AnalyticsError::ColumnNotNumeric { .. })
        ));
        assert!(matches!(
            dataset.require_numeric("Salary"),
            Err(AnalyticsError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let result = Dataset::new(vec![
            Column::numeric("a", vec![Some(1.0)]),
            Column::numeric("b", vec![Some(1.0), Some(2.0)]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_replace_column_checks_length() {
        let mut dataset = sample();
        assert!(dataset
            .replace_column("Age", ColumnData::Numeric(vec![Some(1.0)]))
            .is_err());
        dataset
            .replace_column("Age", ColumnData::Numeric(vec![Some(1.0); 3]))
            .unwrap();
        assert_eq!(dataset.column("Age").unwrap().data.missing_count(), 0);
    }

    #[test]
    fn test_format_number_drops_integral_fraction() {
        assert_eq!(format_number(30.0), "30");
        assert_eq!(format_number(2.5), "2.5");
    }
}
