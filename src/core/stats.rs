// 欄位非缺值的描述統計：樣本標準差 (n − 1)，分位數以 (n − 1)·q 線性內插

use std::collections::HashMap;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(quantile_sorted(&sorted(values), q))
}

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let position = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Q1、Q3 與四分位距
pub fn quartiles(values: &[f64]) -> Option<(f64, f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted(values);
    let q1 = quantile_sorted(&sorted, 0.25);
    let q3 = quantile_sorted(&sorted, 0.75);
    Some((q1, q3, q3 - q1))
}

/// IQR 法計算離群值個數
pub fn count_iqr_outliers(values: &[f64], multiplier: f64) -> usize {
    let Some((q1, q3, iqr)) = quartiles(values) else {
        return 0;
    };
    let lower = q1 - multiplier * iqr;
    let upper = q3 + multiplier * iqr;
    values.iter().filter(|v| **v < lower || **v > upper).count()
}

/// 成對完整資料的皮爾森相關係數；任一邊變異數為零時無定義
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();

    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in &pairs {
        covariance += (a - mean_x) * (b - mean_y);
        var_x += (a - mean_x).powi(2);
        var_y += (b - mean_y).powi(2);
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(covariance / (var_x.sqrt() * var_y.sqrt()))
}

/// 次數統計：依次數遞減排序，同次數依首次出現順序
pub fn value_counts<'a, I>(values: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in values {
        let entry = counts.entry(value.to_string()).or_insert_with(|| {
            order.push(value.to_string());
            0
        });
        *entry += 1;
    }

    let mut result: Vec<(String, usize)> = order
        .into_iter()
        .map(|value| {
            let count = counts[&value];
            (value, count)
        })
        .collect();
    // sort_by 為穩定排序，保留首次出現順序
    result.sort_by(|a, b| b.1.cmp(&a.1));
    result
}

/// 眾數；同次數時取字典序最小者
pub fn mode<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let counts = value_counts(values);
    let top = counts.first()?.1;
    counts
        .into_iter()
        .filter(|(_, count)| *count == top)
        .map(|(value, _)| value)
        .min()
}

/// 數值眾數；同次數時取最小值
pub fn numeric_mode(values: &[f64]) -> Option<f64> {
    let sorted = sorted(values);
    let mut best: Option<(f64, usize)> = None;
    let mut index = 0;
    while index < sorted.len() {
        let value = sorted[index];
        let run = sorted[index..].iter().take_while(|v| **v == value).count();
        if best.map_or(true, |(_, count)| run > count) {
            best = Some((value, run));
        }
        index += run;
    }
    best.map(|(value, _)| value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_quantiles_interpolate_linearly() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!(approx(quantile(&values, 0.25).unwrap(), 1.75));
        assert!(approx(median(&values).unwrap(), 2.5));
        assert!(approx(quantile(&values, 0.75).unwrap(), 3.25));
    }

    #[test]
    fn test_sample_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(approx(sample_std(&values).unwrap(), 2.138089935299395));
        assert!(sample_std(&[1.0]).is_none());
    }

    #[test]
    fn test_iqr_outliers() {
        let values = [10.0, 12.0, 11.0, 13.0, 12.0, 100.0];
        assert_eq!(count_iqr_outliers(&values, 1.5), 1);
        assert_eq!(count_iqr_outliers(&[], 1.5), 0);
    }

    #[test]
    fn test_pearson() {
        let x = [Some(1.0), Some(2.0), Some(3.0), None];
        let y = [Some(2.0), Some(4.0), Some(6.0), Some(100.0)];
        assert!(approx(pearson(&x, &y).unwrap(), 1.0));

        let flat = [Some(5.0), Some(5.0), Some(5.0), Some(5.0)];
        assert!(pearson(&x, &flat).is_none());
    }

    #[test]
    fn test_value_counts_order_and_mode_ties() {
        let counts = value_counts(["b", "a", "a", "b", "c"]);
        assert_eq!(
            counts,
            vec![
                ("b".to_string(), 2),
                ("a".to_string(), 2),
                ("c".to_string(), 1)
            ]
        );
        assert_eq!(mode(["b", "a", "a", "b", "c"]), Some("a".to_string()));
        assert_eq!(numeric_mode(&[3.0, 1.0, 3.0, 1.0, 2.0]), Some(1.0));
    }
}
