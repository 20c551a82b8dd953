pub mod models;
pub mod utils;

// Wire-level types used by both the engine and its clients.
pub use models::{Candle, ClientMessage, Label, ServerMessage};
