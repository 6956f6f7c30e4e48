use crate::core::stats;
use crate::domain::model::{ColumnData, Dataset};
use serde::{Serialize, Serializer};

pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// 保持欄位順序的 JSON 物件
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V>(pub Vec<(String, V)>);

impl<V> OrderedMap<V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescribeStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub p25: Option<f64>,
    #[serde(rename = "50%")]
    pub p50: Option<f64>,
    #[serde(rename = "75%")]
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

impl DescribeStats {
    pub fn from_values(values: &[f64]) -> Self {
        Self {
            count: values.len(),
            mean: stats::mean(values),
            std: stats::sample_std(values),
            min: stats::min(values),
            p25: stats::quantile(values, 0.25),
            p50: stats::quantile(values, 0.5),
            p75: stats::quantile(values, 0.75),
            max: stats::max(values),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalSummary {
    pub value_counts: OrderedMap<usize>,
    pub unique_values_count: usize,
}

/// 資料集的完整統計摘要，交給 Analyst 撰寫報告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetProfile {
    pub basic_statistics: OrderedMap<DescribeStats>,
    pub outliers_count: OrderedMap<usize>,
    pub categorical_analysis: OrderedMap<CategoricalSummary>,
}

impl DatasetProfile {
    pub fn to_json_pretty(&self) -> crate::utils::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn basic_statistics(dataset: &Dataset) -> OrderedMap<DescribeStats> {
    OrderedMap(
        dataset
            .columns()
            .iter()
            .filter(|c| matches!(c.data, ColumnData::Numeric(_)))
            .map(|c| (c.name.clone(), DescribeStats::from_values(&c.data.present_numbers())))
            .collect(),
    )
}

pub fn outliers_count(dataset: &Dataset, iqr_multiplier: f64) -> OrderedMap<usize> {
    OrderedMap(
        dataset
            .columns()
            .iter()
            .filter(|c| matches!(c.data, ColumnData::Numeric(_)))
            .map(|c| {
                let values = c.data.present_numbers();
                (c.name.clone(), stats::count_iqr_outliers(&values, iqr_multiplier))
            })
            .collect(),
    )
}

pub fn categorical_analysis(dataset: &Dataset) -> OrderedMap<CategoricalSummary> {
    OrderedMap(
        dataset
            .columns()
            .iter()
            .filter_map(|c| match &c.data {
                ColumnData::Categorical(values) => {
                    let counts = stats::value_counts(values.iter().flatten().map(String::as_str));
                    let unique_values_count = counts.len();
                    Some((
                        c.name.clone(),
                        CategoricalSummary {
                            value_counts: OrderedMap(counts),
                            unique_values_count,
                        },
                    ))
                }
                ColumnData::Numeric(_) => None,
            })
            .collect(),
    )
}

pub fn profile_dataset(dataset: &Dataset, iqr_multiplier: f64) -> DatasetProfile {
    let profile = DatasetProfile {
        basic_statistics: basic_statistics(dataset),
        outliers_count: outliers_count(dataset, iqr_multiplier),
        categorical_analysis: categorical_analysis(dataset),
    };
    tracing::info!(
        "✅ Dataset profiled: {} numerical, {} categorical columns",
        profile.basic_statistics.len(),
        profile.categorical_analysis.len()
    );
    profile
}
