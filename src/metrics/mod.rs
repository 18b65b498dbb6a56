use serde::Serialize;
use tracing::warn;

use crate::department::Department;

/// How a metric is written into a snapshot cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellFormat {
    /// `"66.67%"`
    Percent,
    /// `"4.12"`
    Number,
}

/// How per-department values fold into one cross-department figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Combine {
    /// Average of the department values.
    Mean,
    /// Sum numerators and denominators, then divide once.
    Pooled,
}

/// One computed figure, keyed by the snapshot column it belongs in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricValue {
    pub header: &'static str,
    pub summary_label: &'static str,
    pub numerator: f64,
    pub denominator: f64,
    pub scale: f64,
    pub decimals: u32,
    pub format: CellFormat,
    pub value: f64,
}

impl MetricValue {
    /// `count / total * 100`, rounded.
    pub fn percent(
        header: &'static str,
        summary_label: &'static str,
        count: usize,
        total: usize,
        decimals: u32,
    ) -> Self {
        Self::ratio(
            header,
            summary_label,
            count as f64,
            total as f64,
            100.0,
            decimals,
            CellFormat::Percent,
        )
    }

    pub fn ratio(
        header: &'static str,
        summary_label: &'static str,
        numerator: f64,
        denominator: f64,
        scale: f64,
        decimals: u32,
        format: CellFormat,
    ) -> Self {
        let value = if denominator > 0.0 {
            round_to(numerator / denominator * scale, decimals)
        } else {
            warn!("No valid rows for '{header}'; reporting 0.0");
            0.0
        };
        Self {
            header,
            summary_label,
            numerator,
            denominator,
            scale,
            decimals,
            format,
            value,
        }
    }

    /// Sum of two sub-metrics measured against the same total.
    pub fn compound(
        header: &'static str,
        summary_label: &'static str,
        a: &MetricValue,
        b: &MetricValue,
    ) -> Self {
        let decimals = a.decimals.max(b.decimals);
        Self {
            header,
            summary_label,
            numerator: a.numerator + b.numerator,
            denominator: a.denominator,
            scale: a.scale,
            decimals,
            format: a.format,
            value: round_to(a.value + b.value, decimals),
        }
    }

    /// Text written into the snapshot cell.
    pub fn cell_text(&self) -> String {
        match self.format {
            CellFormat::Percent => format!("{:.*}%", self.decimals as usize, self.value),
            CellFormat::Number => format!("{:.*}", self.decimals as usize, self.value),
        }
    }

    /// Column title used in local summary files.
    pub fn summary_column(&self) -> String {
        match self.format {
            CellFormat::Percent => format!("{} (%)", self.summary_label),
            CellFormat::Number => self.summary_label.to_string(),
        }
    }

    /// Fold the same metric from several departments. None when `values` is empty.
    pub fn combine(values: &[&MetricValue], how: Combine) -> Option<MetricValue> {
        let first = values.first()?;
        let numerator: f64 = values.iter().map(|m| m.numerator).sum();
        let denominator: f64 = values.iter().map(|m| m.denominator).sum();

        match how {
            Combine::Pooled => Some(Self::ratio(
                first.header,
                first.summary_label,
                numerator,
                denominator,
                first.scale,
                first.decimals,
                first.format,
            )),
            Combine::Mean => {
                let mean = values.iter().map(|m| m.value).sum::<f64>() / values.len() as f64;
                Some(MetricValue {
                    numerator,
                    denominator,
                    value: round_to(mean, first.decimals),
                    ..(*first).clone()
                })
            }
        }
    }
}

/// A department paired with the metrics computed for it in one run.
#[derive(Debug, Clone, Serialize)]
pub struct DepartmentMetrics {
    pub department: Department,
    pub valid_rows: usize,
    pub metrics: Vec<MetricValue>,
}

/// `count / total * 100` rounded to `decimals`; 0.0 (with a warning) when total is zero.
pub fn percentage(count: usize, total: usize, decimals: u32) -> f64 {
    if total == 0 {
        warn!("Percentage requested over zero rows; reporting 0.0");
        return 0.0;
    }
    round_to(count as f64 / total as f64 * 100.0, decimals)
}

/// Round half away from zero to `decimals` places.
pub fn round_to(x: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (x * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_percentage_rounding_per_precision() {
        assert_eq!(percentage(1, 3, 2), 33.33);
        assert_eq!(percentage(1, 3, 1), 33.3);
        assert_eq!(percentage(2, 3, 2), 66.67);
        assert_eq!(percentage(3, 3, 1), 100.0);
    }

    #[test]
    fn test_percentage_zero_total() {
        assert_eq!(percentage(0, 0, 2), 0.0);
        assert_eq!(percentage(5, 0, 1), 0.0);
    }

    #[test]
    fn test_ratio_zero_denominator_reports_zero() {
        let m = MetricValue::percent("Call Request", "Call Request Rate", 0, 0, 2);
        assert_eq!(m.value, 0.0);
        assert_eq!(m.cell_text(), "0.00%");
    }

    #[test]
    fn test_cell_text_formats() {
        let p = MetricValue::percent("Threatening Case Identifier", "Threatening", 1, 3, 1);
        assert_eq!(p.cell_text(), "33.3%");
        let n = MetricValue::ratio("Sentiment Analysis", "Weighted NPS", 9.0, 4.0, 1.0, 2, CellFormat::Number);
        assert_eq!(n.cell_text(), "2.25");
        assert_eq!(n.summary_column(), "Weighted NPS");
        assert_eq!(p.summary_column(), "Threatening (%)");
    }

    #[test]
    fn test_compound_is_exact_sum() {
        for total in 1..40usize {
            for a in 0..=total {
                for b in 0..=(total - a) {
                    let ma = MetricValue::percent("% Intervention", "Intervention", a, total, 2);
                    let mb = MetricValue::percent("% Transfer", "Transfer", b, total, 2);
                    let c = MetricValue::compound("% Not Handled", "Not Handled", &ma, &mb);
                    assert!(approx(c.value, ma.value + mb.value), "{a}+{b}/{total}");
                    assert_eq!(c.denominator, total as f64);
                }
            }
        }
    }

    #[test]
    fn test_combine_mean_and_pooled_differ() {
        let a = MetricValue::percent("X", "X", 1, 2, 1); // 50.0
        let b = MetricValue::percent("X", "X", 1, 8, 1); // 12.5
        let mean = MetricValue::combine(&[&a, &b], Combine::Mean).unwrap();
        let pooled = MetricValue::combine(&[&a, &b], Combine::Pooled).unwrap();
        assert_eq!(mean.value, 31.3);
        assert_eq!(pooled.value, 20.0);
        assert_eq!(pooled.numerator, 2.0);
        assert_eq!(pooled.denominator, 10.0);
    }

    #[test]
    fn test_combine_empty() {
        assert!(MetricValue::combine(&[], Combine::Mean).is_none());
    }
}
