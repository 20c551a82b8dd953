// Per-session candle buffers.
use shared::models::Candle;
use std::collections::VecDeque;

/// Every historical candle received by a session, in arrival order.
#[derive(Debug, Default)]
pub struct TrainingBuffer {
    candles: Vec<Candle>,
}

impl TrainingBuffer {
    pub fn new() -> Self {
        TrainingBuffer { candles: Vec::new() }
    }

    pub fn push(&mut self, candle: Candle) {
        self.candles.push(candle);
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }
}

/// Sliding window over the most recent live candles.
///
/// Holds `lookback_period + 1` candles: after lag expansion drops the first
/// `lookback_period` rows, exactly one complete feature row remains.
#[derive(Debug)]
pub struct PredictionWindow {
    candles: VecDeque<Candle>,
    capacity: usize,
}

impl PredictionWindow {
    pub fn new(lookback_period: usize) -> Self {
        let capacity = lookback_period + 1;
        PredictionWindow {
            candles: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a candle, evicting the oldest ones while over capacity.
    pub fn push(&mut self, candle: Candle) {
        self.candles.push_back(candle);
        while self.candles.len() > self.capacity {
            self.candles.pop_front();
        }
    }

    pub fn is_full(&self) -> bool {
        self.candles.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The window as one slice, oldest first.
    pub fn make_contiguous(&mut self) -> &[Candle] {
        self.candles.make_contiguous()
    }
}
