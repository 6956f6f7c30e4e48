use crate::core::stats;
use crate::domain::model::{format_number, ColumnData, Dataset};
use crate::utils::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CORRELATION_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeType {
    #[serde(rename = "Percentage Increase")]
    PercentageIncrease,
    #[serde(rename = "Percentage Decrease")]
    PercentageDecrease,
    #[serde(rename = "Set to Value")]
    SetToValue,
}

impl ChangeType {
    pub fn is_percentage(&self) -> bool {
        matches!(self, ChangeType::PercentageIncrease | ChangeType::PercentageDecrease)
    }
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeType::PercentageIncrease => write!(f, "Percentage Increase"),
            ChangeType::PercentageDecrease => write!(f, "Percentage Decrease"),
            ChangeType::SetToValue => write!(f, "Set to Value"),
        }
    }
}

impl std::str::FromStr for ChangeType {
    type Err = AnalyticsError;

    /// 接受 "Percentage Increase"、"percentage-increase"、"increase" 等寫法
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "percentage increase" | "increase" => Ok(ChangeType::PercentageIncrease),
            "percentage decrease" | "decrease" => Ok(ChangeType::PercentageDecrease),
            "set to value" | "set" => Ok(ChangeType::SetToValue),
            _ => Err(AnalyticsError::ValidationError {
                message: format!("Unknown change type '{}'", s),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modification {
    pub column: String,
    pub change_type: ChangeType,
    pub value: f64,
}

impl Modification {
    pub fn new(column: impl Into<String>, change_type: ChangeType, value: f64) -> Self {
        Self {
            column: column.into(),
            change_type,
            value,
        }
    }

    pub fn description(&self) -> String {
        let value = format_number(self.value);
        match self.change_type {
            ChangeType::PercentageIncrease => {
                format!("increased all {} values by {}%", self.column, value)
            }
            ChangeType::PercentageDecrease => {
                format!("decreased all {} values by {}%", self.column, value)
            }
            ChangeType::SetToValue => format!("set all {} values to {}", self.column, value),
        }
    }

    fn apply(&self, value: f64) -> f64 {
        match self.change_type {
            ChangeType::PercentageIncrease => value * (1.0 + self.value / 100.0),
            ChangeType::PercentageDecrease => value * (1.0 - self.value / 100.0),
            ChangeType::SetToValue => self.value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnSummary {
    pub fn from_values(values: &[f64]) -> Self {
        Self {
            mean: stats::mean(values),
            median: stats::median(values),
            std: stats::sample_std(values),
            min: stats::min(values),
            max: stats::max(values),
        }
    }

    fn entries(&self) -> [(&'static str, Option<f64>); 5] {
        [
            ("Mean", self.mean),
            ("Median", self.median),
            ("Std Dev", self.std),
            ("Min", self.min),
            ("Max", self.max),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatChange {
    pub statistic: String,
    pub original: Option<f64>,
    pub new: Option<f64>,
    pub delta: Option<f64>,
    /// 原值為 0 時記為 0
    pub percent_change: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationStrength {
    Strong,
    Moderate,
    Weak,
}

impl CorrelationStrength {
    pub fn from_correlation(r: f64) -> Self {
        if r.abs() > 0.7 {
            CorrelationStrength::Strong
        } else if r.abs() > 0.3 {
            CorrelationStrength::Moderate
        } else {
            CorrelationStrength::Weak
        }
    }
}

impl std::fmt::Display for CorrelationStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorrelationStrength::Strong => write!(f, "Strong"),
            CorrelationStrength::Moderate => write!(f, "Moderate"),
            CorrelationStrength::Weak => write!(f, "Weak"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedImpact {
    pub column: String,
    pub correlation: f64,
    /// 以平均值為 0 的欄位設定固定值時無法估計
    pub estimated_impact: Option<f64>,
    pub strength: CorrelationStrength,
}

impl RelatedImpact {
    pub fn direction(&self) -> &'static str {
        if self.correlation > 0.0 {
            "positive"
        } else {
            "negative"
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioResult {
    pub modification: Modification,
    pub modified: Dataset,
    pub original_stats: ColumnSummary,
    pub new_stats: ColumnSummary,
    pub changes: Vec<StatChange>,
    pub impacts: Vec<RelatedImpact>,
}

/// 在資料副本上套用情境，計算目標欄位的統計變化與相關欄位的預估影響
pub fn run_scenario(
    dataset: &Dataset,
    modification: &Modification,
    correlation_threshold: f64,
) -> Result<ScenarioResult> {
    let column = modification.column.as_str();
    let original_values = dataset.require_numeric(column)?;

    if !modification.value.is_finite() {
        return Err(AnalyticsError::ValidationError {
            message: format!(
                "Scenario value must be a finite number, got {}",
                modification.value
            ),
        });
    }
    if modification.change_type.is_percentage() && modification.value < 0.0 {
        return Err(AnalyticsError::ValidationError {
            message: format!(
                "Percentage must be zero or positive, got {}; use the opposite change type instead",
                modification.value
            ),
        });
    }

    let original_present: Vec<f64> = original_values.iter().flatten().copied().collect();
    let original_stats = ColumnSummary::from_values(&original_present);

    let modified_values: Vec<Option<f64>> = original_values
        .iter()
        .map(|v| match modification.change_type {
            ChangeType::SetToValue => Some(modification.value),
            _ => v.map(|x| modification.apply(x)),
        })
        .collect();
    let modified_present: Vec<f64> = modified_values.iter().flatten().copied().collect();
    let new_stats = ColumnSummary::from_values(&modified_present);

    tracing::info!("✅ Applied modification: {}", modification.description());

    let changes = original_stats
        .entries()
        .iter()
        .zip(new_stats.entries().iter())
        .map(|((name, original), (_, new))| {
            let delta = match (original, new) {
                (Some(o), Some(n)) => Some(n - o),
                _ => None,
            };
            let percent_change = match (original, delta) {
                (Some(o), _) if *o == 0.0 => Some(0.0),
                (Some(o), Some(d)) => Some(d / o.abs() * 100.0),
                _ => None,
            };
            StatChange {
                statistic: name.to_string(),
                original: *original,
                new: *new,
                delta,
                percent_change,
            }
        })
        .collect();

    tracing::info!("🧮 Calculating impact on other variables");
    let mut impacts = Vec::new();
    for other in dataset.columns() {
        if other.name == column {
            continue;
        }
        let ColumnData::Numeric(other_values) = &other.data else {
            continue;
        };
        let Some(correlation) = stats::pearson(original_values, other_values) else {
            continue;
        };
        if correlation.abs() <= correlation_threshold {
            continue;
        }

        let estimated_impact = match modification.change_type {
            ChangeType::PercentageIncrease => Some(correlation * modification.value),
            ChangeType::PercentageDecrease => Some(-correlation * modification.value),
            ChangeType::SetToValue => original_stats
                .mean
                .filter(|mean| *mean != 0.0)
                .map(|mean| correlation * ((modification.value - mean) / mean * 100.0)),
        };

        impacts.push(RelatedImpact {
            column: other.name.clone(),
            correlation,
            estimated_impact,
            strength: CorrelationStrength::from_correlation(correlation),
        });
    }

    let mut modified = dataset.clone();
    modified.replace_column(column, ColumnData::Numeric(modified_values))?;

    Ok(ScenarioResult {
        modification: modification.clone(),
        modified,
        original_stats,
        new_stats,
        changes,
        impacts,
    })
}

fn fmt_fixed(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_else(|| "n/a".to_string())
}

/// 產生 Markdown 格式的情境報告
pub fn render_report(result: &ScenarioResult, ai_analysis: &str) -> String {
    let column = &result.modification.column;
    let mut report = String::new();

    report.push_str("## 🎯 What-If Scenario Analysis Results\n\n");
    report.push_str("### 📋 Scenario Details\n");
    report.push_str(&format!(
        "**Modification Applied:** {}\n\n",
        result.modification.description()
    ));

    report.push_str(&format!("### 📊 Direct Impact on {}\n\n", column));
    report.push_str("| Statistic | Original | New | Change | % Change |\n");
    report.push_str("|-----------|----------|-----|--------|----------|\n");
    for change in &result.changes {
        let percent = change
            .percent_change
            .map(|p| format!("{:.1}%", p))
            .unwrap_or_else(|| "n/a".to_string());
        report.push_str(&format!(
            "| **{}** | {} | {} | {} | {} |\n",
            change.statistic,
            fmt_fixed(change.original, 2),
            fmt_fixed(change.new, 2),
            fmt_fixed(change.delta, 2),
            percent
        ));
    }

    report.push_str("\n### 🔗 Estimated Impact on Related Variables\n");
    if result.impacts.is_empty() {
        report.push_str("\nNo significant correlations found with other numerical variables.\n");
    } else {
        for impact in &result.impacts {
            let estimate = impact
                .estimated_impact
                .map(|v| format!("{:.1}% change", v))
                .unwrap_or_else(|| "n/a".to_string());
            report.push_str(&format!(
                "\n**{}:**\n- Correlation with {}: {:.3} ({} {})\n- Estimated impact: {}\n",
                impact.column,
                column,
                impact.correlation,
                impact.strength,
                impact.direction(),
                estimate
            ));
        }
    }

    report.push_str("\n\n### 🧠 AI Analysis of Modified Dataset\n\n");
    report.push_str(ai_analysis.trim());
    report.push_str("\n\n---\n");
    report.push_str(
        "*💡 This analysis shows potential impacts based on statistical relationships in your data. \
Actual business results may vary based on external factors not captured in this dataset.*\n",
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        Dataset::from_csv_bytes(
            b"Price,Units,Noise,Region\n10,100,5,N\n20,80,1,S\n30,60,5,N\n40,40,1,S\n",
        )
        .unwrap()
    }

    #[test]
    fn test_change_type_parsing() {
        assert_eq!(
            "Percentage Increase".parse::<ChangeType>().unwrap(),
            ChangeType::PercentageIncrease
        );
        assert_eq!(
            "percentage-decrease".parse::<ChangeType>().unwrap(),
            ChangeType::PercentageDecrease
        );
        assert_eq!("set_to_value".parse::<ChangeType>().unwrap(), ChangeType::SetToValue);
        assert!("double".parse::<ChangeType>().is_err());
    }

    #[test]
    fn test_percentage_increase_scenario() {
        let modification = Modification::new("Price", ChangeType::PercentageIncrease, 10.0);
        let result =
            run_scenario(&dataset(), &modification, DEFAULT_CORRELATION_THRESHOLD).unwrap();

        assert!((result.new_stats.mean.unwrap() - 27.5).abs() < 1e-9);
        let mean_change = &result.changes[0];
        assert_eq!(mean_change.statistic, "Mean");
        assert!((mean_change.percent_change.unwrap() - 10.0).abs() < 1e-9);

        // Units 與 Price 完全負相關
        let units = result.impacts.iter().find(|i| i.column == "Units").unwrap();
        assert!((units.correlation + 1.0).abs() < 1e-9);
        assert!((units.estimated_impact.unwrap() + 10.0).abs() < 1e-9);
        assert_eq!(units.strength, CorrelationStrength::Strong);
        assert_eq!(units.direction(), "negative");
    }

    #[test]
    fn test_set_to_value_impact_uses_mean_shift() {
        let modification = Modification::new("Price", ChangeType::SetToValue, 50.0);
        let result =
            run_scenario(&dataset(), &modification, DEFAULT_CORRELATION_THRESHOLD).unwrap();

        assert_eq!(result.new_stats.std, Some(0.0));
        let units = result.impacts.iter().find(|i| i.column == "Units").unwrap();
        // (50 - 25) / 25 * 100 = 100%，乘上 r = -1
        assert!((units.estimated_impact.unwrap() + 100.0).abs() < 1e-9);
    }

    // Delta 平均值為 0，與 Other 的相關係數約 0.894
    fn zero_mean_dataset() -> Dataset {
        Dataset::from_csv_bytes(b"Delta,Other\n-1,1\n1,3\n-1,2\n1,4\n").unwrap()
    }

    #[test]
    fn test_percent_change_is_zero_when_original_is_zero() {
        let modification = Modification::new("Delta", ChangeType::SetToValue, 5.0);
        let result = run_scenario(&zero_mean_dataset(), &modification, 0.1).unwrap();

        let mean_change = &result.changes[0];
        assert_eq!(mean_change.original, Some(0.0));
        assert_eq!(mean_change.new, Some(5.0));
        assert_eq!(mean_change.percent_change, Some(0.0));
    }

    #[test]
    fn test_set_to_value_fills_missing_cells() {
        let data = Dataset::from_csv_bytes(b"A,B\n1,2\n,4\n3,5\n").unwrap();
        let modification = Modification::new("A", ChangeType::SetToValue, 7.0);
        let result = run_scenario(&data, &modification, 0.1).unwrap();

        let column = result.modified.column("A").unwrap();
        assert_eq!(column.data.missing_count(), 0);
        assert_eq!(column.data.present_numbers(), vec![7.0, 7.0, 7.0]);
    }

    #[test]
    fn test_set_to_value_impact_unknown_for_zero_mean() {
        let modification = Modification::new("Delta", ChangeType::SetToValue, 5.0);
        let result = run_scenario(&zero_mean_dataset(), &modification, 0.1).unwrap();

        let other = result.impacts.iter().find(|i| i.column == "Other").unwrap();
        assert!(other.estimated_impact.is_none());

        let report = render_report(&result, "n/a");
        assert!(report.contains("- Estimated impact: n/a"));
        assert!(report.contains("| **Mean** | 0.00 | 5.00 | 5.00 | 0.0% |"));
    }

    #[test]
    fn test_strength_thresholds() {
        assert_eq!(CorrelationStrength::from_correlation(0.71), CorrelationStrength::Strong);
        assert_eq!(CorrelationStrength::from_correlation(0.7), CorrelationStrength::Moderate);
        assert_eq!(CorrelationStrength::from_correlation(-0.5), CorrelationStrength::Moderate);
        assert_eq!(CorrelationStrength::from_correlation(0.31), CorrelationStrength::Moderate);
        assert_eq!(CorrelationStrength::from_correlation(0.3), CorrelationStrength::Weak);
        assert_eq!(CorrelationStrength::from_correlation(-0.05), CorrelationStrength::Weak);
    }

    #[test]
    fn test_correlation_threshold_filters_impacts() {
        let modification = Modification::new("Delta", ChangeType::PercentageIncrease, 10.0);

        let result = run_scenario(&zero_mean_dataset(), &modification, 0.85).unwrap();
        assert_eq!(result.impacts.len(), 1);
        assert_eq!(result.impacts[0].strength, CorrelationStrength::Strong);

        let result = run_scenario(&zero_mean_dataset(), &modification, 0.9).unwrap();
        assert!(result.impacts.is_empty());
        assert!(render_report(&result, "")
            .contains("No significant correlations found with other numerical variables."));
    }

    #[test]
    fn test_validation_errors() {
        let data = dataset();
        let missing = Modification::new("Cost", ChangeType::SetToValue, 1.0);
        assert!(matches!(
            run_scenario(&data, &missing, 0.1),
            Err(AnalyticsError::ColumnNotFound { .. })
        ));

        let categorical = Modification::new("Region", ChangeType::PercentageIncrease, 5.0);
        assert!(matches!(
            run_scenario(&data, &categorical, 0.1),
            Err(AnalyticsError::ColumnNotNumeric { .. })
        ));

        let negative = Modification::new("Price", ChangeType::PercentageDecrease, -5.0);
        assert!(run_scenario(&data, &negative, 0.1).is_err());
    }

    #[test]
    fn test_report_rendering() {
        let modification = Modification::new("Price", ChangeType::PercentageDecrease, 50.0);
        let result =
            run_scenario(&dataset(), &modification, DEFAULT_CORRELATION_THRESHOLD).unwrap();
        let report = render_report(&result, "Prices dropped.");

        assert!(report.contains("**Modification Applied:** decreased all Price values by 50%"));
        assert!(report.contains("| **Mean** | 25.00 | 12.50 | -12.50 | -50.0% |"));
        assert!(report.contains("**Units:**"));
        assert!(report.contains("Prices dropped."));
        assert!(!report.contains("No significant correlations"));
    }
}
