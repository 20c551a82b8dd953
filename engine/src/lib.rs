// Engine library root
// Streams OHLCV candles in over length-prefixed TCP frames, trains swing-point
// classifiers on historical rows and answers live rows with predictions.

pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod labeling;
pub mod ml;
pub mod net;
pub mod services;

pub use error::{EngineError, Result};
