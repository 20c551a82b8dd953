// Candle shape features: wick sizes plus body, wicks and range relative to each other and to volume.
use shared::models::Candle;

/// Added to every denominator so flat or zero-volume candles stay finite.
pub const EPSILON: f64 = 1e-6;

/// Column names of the per-candle features, in the order `derive_ratios` emits them.
pub const RATIO_FEATURES: [&str; 12] = [
    "body_to_range",
    "upper_wick",
    "lower_wick",
    "body_to_wicks",
    "body_to_volume",
    "upper_to_lower_wick",
    "wicks_to_range",
    "upper_wick_to_range",
    "lower_wick_to_range",
    "wicks_to_volume",
    "upper_wick_to_volume",
    "lower_wick_to_volume",
];

/// Derives the per-candle features for one candle, followed by the requested
/// pass-through fields. Missing or non-numeric pass-through values are 0.0.
pub fn derive_ratios(candle: &Candle, passthrough: &[String]) -> Vec<f64> {
    let body_size = (candle.close - candle.open).abs();
    let range = candle.high - candle.low;
    let upper_wick = candle.high - candle.open.max(candle.close);
    let lower_wick = candle.open.min(candle.close) - candle.low;
    let wicks = upper_wick + lower_wick;
    let volume = candle.volume;

    let mut features = Vec::with_capacity(RATIO_FEATURES.len() + passthrough.len());
    features.extend_from_slice(&[
        body_size / (range + EPSILON),
        upper_wick,
        lower_wick,
        body_size / (wicks + EPSILON),
        body_size / (volume + EPSILON),
        upper_wick / (lower_wick + EPSILON),
        wicks / (range + EPSILON),
        upper_wick / (range + EPSILON),
        lower_wick / (range + EPSILON),
        wicks / (volume + EPSILON),
        upper_wick / (volume + EPSILON),
        lower_wick / (volume + EPSILON),
    ]);
    features.extend(passthrough.iter().map(|name| candle.extra_f64(name).unwrap_or(0.0)));
    features
}
