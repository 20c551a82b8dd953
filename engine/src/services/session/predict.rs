// Handler for the prediction path: row.
use shared::models::{Candle, Label, ServerMessage};

use super::{ModelState, Session};
use crate::error::{EngineError, Result};
use crate::ml::{Model, ModelStore, Trainer};

/// Slides the candle into the prediction window and classifies the newest row.
///
/// Until the window is full the reply is `Label::None`. The first full window
/// of an untrained session loads the stored model; if there is none the
/// session is over.
pub fn handle_row<T, S>(session: &mut Session<T, S>, candle: Candle) -> Result<ServerMessage>
where
    T: Trainer,
    S: ModelStore<T::Model>,
{
    session.window.push(candle);
    if !session.window.is_full() {
        tracing::debug!(
            buffered = session.window.len(),
            needed = session.window.capacity(),
            "Prediction window still filling"
        );
        return Ok(ServerMessage::Prediction { prediction: Label::None });
    }

    if let ModelState::Untrained = session.state {
        tracing::info!(key = %session.model_key, "No model in session, loading from store");
        let model = session.store.load(&session.model_key)?;
        session.state = ModelState::Ready(model);
    }

    let ModelState::Ready(model) = &session.state else {
        return Err(EngineError::ModelNotFound(session.model_key.clone()));
    };

    let row = session
        .features
        .latest_row(session.window.make_contiguous())
        .ok_or_else(|| EngineError::PredictionError("full window produced no feature row".to_string()))?;
    let prediction = model.predict(&row)?;
    tracing::debug!(prediction = prediction.as_class(), "Predicted");
    Ok(ServerMessage::Prediction { prediction })
}
