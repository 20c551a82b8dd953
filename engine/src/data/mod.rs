// Candle storage owned by a single session.
pub mod buffers;

pub use buffers::{PredictionWindow, TrainingBuffer};
