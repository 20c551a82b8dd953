use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("JSON error: {source}")]
    JsonError {
        #[from]
        source: serde_json::Error,
    },

    // Peer closed the connection between frames; the normal end of a session.
    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Connection lost mid-frame: {0}")]
    ConnectionLost(String),

    #[error("Frame of {len} bytes exceeds limit of {max} bytes")]
    FrameTooLarge { len: usize, max: usize },

    #[error("Invalid header format '{0}'")]
    InvalidHeaderFormat(String),

    #[error("Message decode error: {0}")]
    DecodeError(String),

    #[error("No stored model found for key '{0}'")]
    ModelNotFound(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Prediction error: {0}")]
    PredictionError(String),

    #[error("Model store error: {0}")]
    StoreError(String),

    // The blocking task running a session handler panicked or was cancelled.
    #[error("Session task failed: {0}")]
    TaskError(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
