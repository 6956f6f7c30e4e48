use crate::domain::model::{format_number, Column, ColumnData, Dataset};
use crate::utils::error::{AnalyticsError, Result};
use std::io::Read;
use std::path::Path;

/// 視為缺值的字串（比對前先去除空白）
const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "<NA>", "#N/A",
];

fn is_missing(raw: &str) -> bool {
    MISSING_TOKENS.contains(&raw.trim())
}

impl Dataset {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Reading CSV from {}", path.display());
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_csv_bytes(data: &[u8]) -> Result<Self> {
        Self::from_reader(data)
    }

    /// 讀取含標頭的 CSV，並推斷每個欄位的型別
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(AnalyticsError::DatasetError {
                message: "CSV has no header row".to_string(),
            });
        }

        let mut raw_columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        for record in csv_reader.records() {
            let record = record?;
            for (index, field) in record.iter().enumerate() {
                let cell = if is_missing(field) {
                    None
                } else {
                    Some(field.to_string())
                };
                raw_columns[index].push(cell);
            }
        }

        let columns = headers
            .into_iter()
            .zip(raw_columns)
            .map(|(name, values)| infer_column(name, values))
            .collect();

        let dataset = Dataset::new(columns)?;
        tracing::debug!(
            "Loaded {} rows x {} columns ({} numeric)",
            dataset.row_count(),
            dataset.column_count(),
            dataset.numeric_column_names().len()
        );
        Ok(dataset)
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(self.columns().iter().map(|c| c.name.as_str()))?;

        for row in 0..self.row_count() {
            let record: Vec<String> = self
                .columns()
                .iter()
                .map(|c| match &c.data {
                    ColumnData::Numeric(values) => {
                        values[row].map(format_number).unwrap_or_default()
                    }
                    ColumnData::Categorical(values) => values[row].clone().unwrap_or_default(),
                })
                .collect();
            writer.write_record(&record)?;
        }

        writer
            .into_inner()
            .map_err(|e| AnalyticsError::IoError(e.into_error()))
    }
}

/// 所有非缺值都能解析為數字時視為數值欄位；全為缺值的欄位也視為數值。
/// `inf`、`NAN` 等非有限值視為缺值
fn infer_column(name: String, values: Vec<Option<String>>) -> Column {
    let parsed: Option<Vec<Option<f64>>> = values
        .iter()
        .map(|cell| match cell {
            None => Some(None),
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => Some(Some(value)),
                Ok(_) => Some(None),
                Err(_) => None,
            },
        })
        .collect();

    match parsed {
        Some(numbers) => Column::numeric(name, numbers),
        None => Column::categorical(name, values),
    }
}
