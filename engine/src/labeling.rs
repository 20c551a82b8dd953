// Swing point labelling for historical candles.
use shared::models::{Candle, Label};

/// Labels each candle as a swing high, swing low or neither.
///
/// Row `i` is inspected only when it has `strength` rows on both sides; the
/// first and last `strength` rows are always `Label::None`. A row whose high is
/// the maximum high of `[i - strength, i + strength]` is a swing high; failing
/// that, a row whose low is the minimum low of the window is a swing low. The
/// high check wins when both hold.
pub fn label_swings(candles: &[Candle], strength: usize) -> Vec<Label> {
    let mut labels = vec![Label::None; candles.len()];
    if candles.len() <= 2 * strength {
        return labels;
    }

    for i in strength..candles.len() - strength {
        let window = &candles[i - strength..=i + strength];
        let max_high = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
        let min_low = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);

        if candles[i].high == max_high {
            labels[i] = Label::SwingHigh;
        } else if candles[i].low == min_low {
            labels[i] = Label::SwingLow;
        }
    }
    labels
}

/// Drops the labels of rows that lag expansion removed, so label `k` lines up
/// with feature row `k`.
pub fn align_labels(labels: &[Label], lookback_period: usize) -> &[Label] {
    labels.get(lookback_period..).unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hl(high: f64, low: f64) -> Candle {
        Candle::new(0, (high + low) / 2.0, high, low, (high + low) / 2.0, 1.0)
    }

    #[test]
    fn test_single_peak_and_trough() {
        let candles = vec![hl(5.0, 4.0), hl(6.0, 5.0), hl(9.0, 7.0), hl(6.0, 5.0), hl(5.0, 2.0), hl(6.0, 4.0), hl(7.0, 5.0)];
        let labels = label_swings(&candles, 1);
        assert_eq!(
            labels,
            vec![
                Label::None,
                Label::None,
                Label::SwingHigh,
                Label::None,
                Label::SwingLow,
                Label::None,
                Label::None,
            ]
        );
    }

    #[test]
    fn test_edges_are_never_labelled() {
        // Global max at index 0 and global min at the last index.
        let candles = vec![hl(10.0, 9.0), hl(8.0, 7.0), hl(7.0, 6.0), hl(6.0, 5.0), hl(5.0, 1.0)];
        let labels = label_swings(&candles, 1);
        assert_eq!(labels[0], Label::None);
        assert_eq!(labels[4], Label::None);
    }

    #[test]
    fn test_flat_data_prefers_swing_high() {
        let candles = vec![hl(3.0, 1.0); 7];
        let labels = label_swings(&candles, 2);
        assert_eq!(&labels[2..5], &[Label::SwingHigh; 3]);
        assert_eq!(&labels[..2], &[Label::None; 2]);
        assert_eq!(&labels[5..], &[Label::None; 2]);
    }

    #[test]
    fn test_too_few_rows_for_strength() {
        let candles: Vec<Candle> = (0..60).map(|i| hl(10.0 + (i % 7) as f64, 5.0 - (i % 5) as f64)).collect();
        let labels = label_swings(&candles, 30);
        assert_eq!(labels.len(), 60);
        assert!(labels.iter().all(|l| *l == Label::None));
    }

    #[test]
    fn test_exactly_one_inspectable_row() {
        let candles = vec![hl(1.0, 0.5), hl(2.0, 0.5), hl(1.5, 0.7)];
        assert_eq!(label_swings(&candles, 1), vec![Label::None, Label::SwingHigh, Label::None]);
    }

    #[test]
    fn test_empty_input() {
        assert!(label_swings(&[], 3).is_empty());
    }

    #[test]
    fn test_align_labels() {
        let labels = vec![Label::None, Label::SwingHigh, Label::SwingLow, Label::None];
        assert_eq!(align_labels(&labels, 1), &[Label::SwingHigh, Label::SwingLow, Label::None]);
        assert_eq!(align_labels(&labels, 4), &[] as &[Label]);
        assert_eq!(align_labels(&labels, 9), &[] as &[Label]);
    }
}
