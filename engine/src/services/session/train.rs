// Handlers for the training path: train_row and train_start.
use shared::models::{Candle, ServerMessage};

use super::{ModelState, Session};
use crate::error::Result;
use crate::labeling::{align_labels, label_swings};
use crate::ml::{ModelStore, Trainer};

pub fn handle_train_row<T, S>(session: &mut Session<T, S>, candle: Candle)
where
    T: Trainer,
    S: ModelStore<T::Model>,
{
    let at = candle.datetime();
    session.training.push(candle);
    tracing::trace!(rows = session.training.len(), ?at, "Buffered training row");
}

/// Fits a model on the whole training buffer and installs it.
///
/// Returns `None` (no reply) if fitting or saving fails; the previous model
/// state is left untouched in that case.
pub fn handle_train_start<T, S>(session: &mut Session<T, S>, save: bool) -> Option<ServerMessage>
where
    T: Trainer,
    S: ModelStore<T::Model>,
{
    tracing::info!(rows = session.training.len(), save, "Training started");

    match fit_and_save(session, save) {
        Ok(model) => {
            session.state = ModelState::Ready(model);
            tracing::info!(rows = session.training.len(), "Training finished, model ready");
            Some(ServerMessage::TrainFinish)
        }
        Err(e) => {
            tracing::error!(
                rows = session.training.len(),
                error_detail = %e,
                "Training failed; keeping previous model state"
            );
            None
        }
    }
}

fn fit_and_save<T, S>(session: &Session<T, S>, save: bool) -> Result<T::Model>
where
    T: Trainer,
    S: ModelStore<T::Model>,
{
    let candles = session.training.as_slice();
    let features = session.features.transform(candles);
    let labels = label_swings(candles, session.swing_strength);
    let labels = align_labels(&labels, session.features.lookback_period());

    let model = session.trainer.fit(&features, labels)?;
    if save {
        session.store.save(&model, &session.model_key)?;
    }
    Ok(model)
}
