use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::utils::datetime_from_millis;

/// One OHLCV observation as received from the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Unix epoch milliseconds. Older clients send this as `time`.
    #[serde(alias = "time")]
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Any other fields the client attached (indicator values etc.), kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Candle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Candle {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            extra: Map::new(),
        }
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        datetime_from_millis(self.timestamp)
    }

    /// Numeric value of a pass-through field, if present and numeric.
    pub fn extra_f64(&self, name: &str) -> Option<f64> {
        self.extra.get(name).and_then(Value::as_f64)
    }
}

/// Swing classification of a single candle. Travels on the wire as its class index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Label {
    #[default]
    None = 0,
    SwingHigh = 1,
    SwingLow = 2,
}

impl Label {
    pub const ALL: [Label; 3] = [Label::None, Label::SwingHigh, Label::SwingLow];

    pub fn as_class(self) -> u8 {
        self as u8
    }

    pub fn from_class(class: u8) -> Option<Label> {
        match class {
            0 => Some(Label::None),
            1 => Some(Label::SwingHigh),
            2 => Some(Label::SwingLow),
            _ => None,
        }
    }
}

impl From<Label> for u8 {
    fn from(label: Label) -> Self {
        label.as_class()
    }
}

impl TryFrom<u8> for Label {
    type Error = String;

    fn try_from(class: u8) -> Result<Self, Self::Error> {
        Label::from_class(class).ok_or_else(|| format!("invalid label class: {}", class))
    }
}

/// Messages a client sends to the engine, discriminated by the `type` field.
///
/// A `type` that is not one of the known names, including one that is not a
/// string at all, decodes as `Unknown`. A body without `type` is an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Historical candle for the training buffer.
    TrainRow(Candle),
    /// Fit a model on everything buffered so far.
    TrainStart { save: bool },
    /// Live candle to predict on.
    Row(Candle),
    /// Any `type` this engine does not know about.
    Unknown,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum NamedClientMessage {
    TrainRow(Candle),
    TrainStart {
        #[serde(default)]
        save: bool,
    },
    Row(Candle),
    #[serde(other)]
    Unknown,
}

impl From<NamedClientMessage> for ClientMessage {
    fn from(message: NamedClientMessage) -> Self {
        match message {
            NamedClientMessage::TrainRow(candle) => ClientMessage::TrainRow(candle),
            NamedClientMessage::TrainStart { save } => ClientMessage::TrainStart { save },
            NamedClientMessage::Row(candle) => ClientMessage::Row(candle),
            NamedClientMessage::Unknown => ClientMessage::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for ClientMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match value.get("type") {
            None => Err(de::Error::missing_field("type")),
            Some(Value::String(_)) => NamedClientMessage::deserialize(value)
                .map(ClientMessage::from)
                .map_err(de::Error::custom),
            Some(_) => Ok(ClientMessage::Unknown),
        }
    }
}

/// Messages the engine sends back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    TrainFinish,
    Prediction { prediction: Label },
}
