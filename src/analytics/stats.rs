//! Shared numeric toolkit for the Analytics Engine: ranking, trend
//! fitting, correlation, and growth.

/// Direction of a fitted production trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Flat,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Flat => "flat",
        }
    }
}

/// Rank (name, volume) pairs: higher volume first, equal volumes broken
/// by name ascending, truncated to the top M.
pub fn rank_top(mut totals: Vec<(String, f64)>, top_m: usize) -> Vec<(String, f64)> {
    totals.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    totals.truncate(top_m);
    totals
}

/// Least-squares slope of `values` against their index.
pub fn linear_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let n_f = n as f64;
    let mean_x = (n_f - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n_f;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Trend direction from the fitted slope, with a relative deadband:
/// slopes smaller than `epsilon` times the mean magnitude count as flat.
pub fn trend_direction(values: &[f64], epsilon: f64) -> TrendDirection {
    if values.len() < 2 {
        return TrendDirection::Flat;
    }
    let slope = linear_slope(values);
    let mean_mag = values.iter().map(|v| v.abs()).sum::<f64>() / values.len() as f64;
    if mean_mag == 0.0 || (slope / mean_mag).abs() < epsilon {
        TrendDirection::Flat
    } else if slope > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    }
}

/// Pearson correlation coefficient; `None` when fewer than two points or
/// either series has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let n_f = n as f64;
    let mean_x = x[..n].iter().sum::<f64>() / n_f;
    let mean_y = y[..n].iter().sum::<f64>() / n_f;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for i in 0..n {
        let dx = x[i] - mean_x;
        let dy = y[i] - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x * var_y).sqrt())
}

/// Narrative reading of a correlation coefficient.
pub fn interpret_correlation(coefficient: Option<f64>) -> String {
    let Some(r) = coefficient else {
        return "insufficient data for correlation".to_string();
    };
    let level = match r.abs() {
        a if a >= 0.7 => "strong",
        a if a >= 0.4 => "moderate",
        _ => "weak",
    };
    let direction = if r > 0.0 { "positive" } else { "negative" };
    format!("{level} {direction} association")
}

/// Total first-to-last change in percent; 0 when undefined.
pub fn growth_pct(values: &[f64]) -> f64 {
    if values.len() < 2 || values[0] == 0.0 {
        return 0.0;
    }
    (values[values.len() - 1] - values[0]) / values[0] * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_top_ties_break_alphabetically() {
        let ranked = rank_top(
            vec![
                ("Wheat".to_string(), 100.0),
                ("Maize".to_string(), 100.0),
                ("Rice".to_string(), 250.0),
                ("Barley".to_string(), 10.0),
            ],
            3,
        );
        let names: Vec<_> = ranked.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["Rice", "Maize", "Wheat"]);
    }

    #[test]
    fn test_linear_slope() {
        assert!((linear_slope(&[1.0, 2.0, 3.0, 4.0]) - 1.0).abs() < 1e-9);
        assert!((linear_slope(&[4.0, 3.0, 2.0, 1.0]) + 1.0).abs() < 1e-9);
        assert_eq!(linear_slope(&[5.0]), 0.0);
    }

    #[test]
    fn test_trend_direction_deadband() {
        assert_eq!(
            trend_direction(&[100.0, 110.0, 120.0, 130.0], 0.01),
            TrendDirection::Increasing
        );
        assert_eq!(
            trend_direction(&[130.0, 120.0, 110.0, 100.0], 0.01),
            TrendDirection::Decreasing
        );
        // 0.5%/year drift sits inside the 1% deadband
        assert_eq!(
            trend_direction(&[1000.0, 1005.0, 1010.0], 0.01),
            TrendDirection::Flat
        );
        assert_eq!(trend_direction(&[0.0, 0.0, 0.0], 0.01), TrendDirection::Flat);
    }

    #[test]
    fn test_pearson() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-9);

        let y_inv = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&x, &y_inv).unwrap() + 1.0).abs() < 1e-9);

        assert_eq!(pearson(&x, &[5.0, 5.0, 5.0, 5.0]), None);
        assert_eq!(pearson(&[1.0], &[2.0]), None);
    }

    #[test]
    fn test_interpret_correlation() {
        assert_eq!(
            interpret_correlation(Some(0.85)),
            "strong positive association"
        );
        assert_eq!(
            interpret_correlation(Some(-0.5)),
            "moderate negative association"
        );
        assert_eq!(interpret_correlation(Some(0.1)), "weak positive association");
        assert_eq!(
            interpret_correlation(None),
            "insufficient data for correlation"
        );
    }

    #[test]
    fn test_growth_pct() {
        assert!((growth_pct(&[100.0, 150.0]) - 50.0).abs() < 1e-9);
        assert_eq!(growth_pct(&[0.0, 100.0]), 0.0);
        assert_eq!(growth_pct(&[42.0]), 0.0);
    }
}
