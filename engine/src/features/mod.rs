//! Feature engineering: candles -> ratio features -> lag-expanded matrix.
//!
//! Everything here is a pure function of its input candles. The same slice always
//! produces the same matrix, bit for bit.

pub mod lags;
pub mod ratios;

pub use lags::expand_lags;
pub use ratios::{derive_ratios, EPSILON, RATIO_FEATURES};

use shared::models::Candle;

/// Row-major feature table with named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn last_row(&self) -> Option<&[f64]> {
        self.rows.last().map(Vec::as_slice)
    }
}

/// Ratio derivation plus lag expansion with a fixed lookback.
#[derive(Debug, Clone)]
pub struct FeatureEngineer {
    lookback_period: usize,
    passthrough: Vec<String>,
}

impl FeatureEngineer {
    pub fn new(lookback_period: usize, passthrough: Vec<String>) -> Self {
        FeatureEngineer {
            lookback_period,
            passthrough,
        }
    }

    pub fn lookback_period(&self) -> usize {
        self.lookback_period
    }

    pub fn base_columns(&self) -> Vec<String> {
        RATIO_FEATURES
            .iter()
            .map(|name| name.to_string())
            .chain(self.passthrough.iter().cloned())
            .collect()
    }

    pub fn columns(&self) -> Vec<String> {
        lags::lagged_columns(&self.base_columns(), self.lookback_period)
    }

    /// Per-candle features, one row per candle.
    pub fn derive(&self, candles: &[Candle]) -> FeatureMatrix {
        FeatureMatrix {
            columns: self.base_columns(),
            rows: candles.iter().map(|c| derive_ratios(c, &self.passthrough)).collect(),
        }
    }

    /// Full lag-expanded matrix; `candles.len() - lookback_period` rows.
    pub fn transform(&self, candles: &[Candle]) -> FeatureMatrix {
        expand_lags(&self.derive(candles), self.lookback_period)
    }

    /// The final row of `transform(candles)`, computed from only the trailing
    /// `lookback_period + 1` candles. `None` when there are too few candles.
    pub fn latest_row(&self, candles: &[Candle]) -> Option<Vec<f64>> {
        let needed = self.lookback_period + 1;
        if candles.len() < needed {
            return None;
        }
        let tail: Vec<Vec<f64>> = candles[candles.len() - needed..]
            .iter()
            .map(|c| derive_ratios(c, &self.passthrough))
            .collect();
        Some(lags::lagged_row(&tail, self.lookback_period, self.lookback_period))
    }
}
