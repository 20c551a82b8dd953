// Lag expansion: exposes short-term history to a model that sees one row at a time.
use super::FeatureMatrix;

pub fn lag_column_name(base: &str, lag: usize) -> String {
    format!("{}_{}", base, lag)
}

/// Column layout of `expand_lags` for the given base columns.
pub fn lagged_columns(base: &[String], period: usize) -> Vec<String> {
    let mut columns = base.to_vec();
    for name in base {
        columns.extend((1..=period).map(|lag| lag_column_name(name, lag)));
    }
    columns
}

/// Builds one output row for base row `index`; the caller guarantees `index >= period`.
pub(crate) fn lagged_row(base_rows: &[Vec<f64>], index: usize, period: usize) -> Vec<f64> {
    let current = &base_rows[index];
    let mut row = Vec::with_capacity(current.len() * (period + 1));
    row.extend_from_slice(current);
    for col in 0..current.len() {
        row.extend((1..=period).map(|lag| base_rows[index - lag][col]));
    }
    row
}

/// Appends, for every base column and every lag in `1..=period`, that column's
/// value `lag` rows earlier. The first `period` rows lack full history and are
/// dropped, so the output has `len - period` rows (none if `len <= period`).
pub fn expand_lags(base: &FeatureMatrix, period: usize) -> FeatureMatrix {
    let columns = lagged_columns(&base.columns, period);
    let rows = (period..base.rows.len())
        .map(|i| lagged_row(&base.rows, i, period))
        .collect();
    FeatureMatrix { columns, rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(n: usize) -> FeatureMatrix {
        FeatureMatrix {
            columns: vec!["a".to_string(), "b".to_string()],
            rows: (0..n).map(|i| vec![i as f64, 100.0 + i as f64]).collect(),
        }
    }

    #[test]
    fn test_column_order_is_feature_major() {
        let out = expand_lags(&base(5), 2);
        assert_eq!(out.columns, vec!["a", "b", "a_1", "a_2", "b_1", "b_2"]);
    }

    #[test]
    fn test_values_are_shifted_rows() {
        let out = expand_lags(&base(5), 2);
        assert_eq!(out.len(), 3);
        // First surviving row is base row 2.
        assert_eq!(out.rows[0], vec![2.0, 102.0, 1.0, 0.0, 101.0, 100.0]);
        assert_eq!(out.rows[2], vec![4.0, 104.0, 3.0, 2.0, 103.0, 102.0]);
    }

    #[test]
    fn test_output_length_is_input_minus_period() {
        for n in 0..8 {
            for period in 0..6 {
                let out = expand_lags(&base(n), period);
                assert_eq!(out.len(), n.saturating_sub(period), "n={} period={}", n, period);
                assert_eq!(out.width(), 2 * (period + 1));
            }
        }
    }

    #[test]
    fn test_period_zero_is_identity() {
        let input = base(3);
        assert_eq!(expand_lags(&input, 0), input);
    }

    #[test]
    fn test_exactly_period_rows_is_empty() {
        let out = expand_lags(&base(4), 4);
        assert!(out.is_empty());
        assert_eq!(out.columns.len(), 10);
    }
}
