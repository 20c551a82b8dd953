// services/session/mod.rs
// Per-connection state machine. A Session owns its buffers and (at most) one
// model; handlers for each message kind live in sibling modules.

use std::sync::Arc;

use shared::models::{ClientMessage, ServerMessage};

use crate::config::EngineSettings;
use crate::data::{PredictionWindow, TrainingBuffer};
use crate::error::Result;
use crate::features::FeatureEngineer;
use crate::ml::{ModelStore, Trainer};

pub mod predict;
pub mod train;

/// Pipeline parameters every session is created with.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub lookback_period: usize,
    pub swing_strength: usize,
    pub passthrough_features: Vec<String>,
    pub model_key: String,
}

impl SessionConfig {
    pub fn from_settings(settings: &EngineSettings) -> Self {
        SessionConfig {
            lookback_period: settings.pipeline.lookback_period,
            swing_strength: settings.pipeline.swing_strength,
            passthrough_features: settings.pipeline.passthrough_features.clone(),
            model_key: settings.model.key.clone(),
        }
    }
}

/// Whether the session has a model to predict with.
#[derive(Debug)]
pub enum ModelState<M> {
    Untrained,
    Ready(M),
}

impl<M> ModelState<M> {
    pub fn is_ready(&self) -> bool {
        matches!(self, ModelState::Ready(_))
    }
}

pub struct Session<T: Trainer, S> {
    trainer: Arc<T>,
    store: Arc<S>,
    model_key: String,
    features: FeatureEngineer,
    swing_strength: usize,
    training: TrainingBuffer,
    window: PredictionWindow,
    state: ModelState<T::Model>,
}

impl<T, S> Session<T, S>
where
    T: Trainer,
    S: ModelStore<T::Model>,
{
    pub fn new(config: &SessionConfig, trainer: Arc<T>, store: Arc<S>) -> Self {
        Session {
            trainer,
            store,
            model_key: config.model_key.clone(),
            features: FeatureEngineer::new(config.lookback_period, config.passthrough_features.clone()),
            swing_strength: config.swing_strength,
            training: TrainingBuffer::new(),
            window: PredictionWindow::new(config.lookback_period),
            state: ModelState::Untrained,
        }
    }

    /// Processes one message to completion and returns the reply, if any.
    ///
    /// An `Err` means the session cannot continue and the connection should be
    /// closed. Failed training is not an error here: it is logged, no reply is
    /// produced and the session keeps whatever model it had.
    pub fn handle(&mut self, message: ClientMessage) -> Result<Option<ServerMessage>> {
        match message {
            ClientMessage::TrainRow(candle) => {
                train::handle_train_row(self, candle);
                Ok(None)
            }
            ClientMessage::TrainStart { save } => Ok(train::handle_train_start(self, save)),
            ClientMessage::Row(candle) => predict::handle_row(self, candle).map(Some),
            ClientMessage::Unknown => {
                tracing::debug!("Ignoring message with unrecognised type");
                Ok(None)
            }
        }
    }

    pub fn state(&self) -> &ModelState<T::Model> {
        &self.state
    }

    pub fn training_len(&self) -> usize {
        self.training.len()
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::error::EngineError;
    use crate::features::RATIO_FEATURES;
    use shared::models::Label;

    fn session(
        cfg: &SessionConfig,
        trainer: RecordingTrainer,
        store: MemoryStore,
    ) -> Session<RecordingTrainer, MemoryStore> {
        Session::new(cfg, Arc::new(trainer), Arc::new(store))
    }

    #[test]
    fn test_train_rows_accumulate_without_reply() {
        let mut s = session(&config(5, 25), RecordingTrainer::default(), MemoryStore::default());
        for i in 0..10 {
            assert_eq!(s.handle(ClientMessage::TrainRow(rising_candle(i))).unwrap(), None);
        }
        assert_eq!(s.training_len(), 10);
        assert!(!s.state().is_ready());
    }

    #[test]
    fn test_sixty_rows_strength_25_trains_on_all_none_labels() {
        let mut s = session(&config(5, 25), RecordingTrainer::default(), MemoryStore::default());
        for i in 0..60 {
            s.handle(ClientMessage::TrainRow(rising_candle(i))).unwrap();
        }
        let reply = s.handle(ClientMessage::TrainStart { save: false }).unwrap();
        assert_eq!(reply, Some(ServerMessage::TrainFinish));
        assert!(s.state().is_ready());

        let calls = s.trainer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (rows, labels) = &calls[0];
        assert_eq!(*rows, 55);
        assert_eq!(labels.len(), 55);
        assert!(labels.iter().all(|l| *l == Label::None));
    }

    #[test]
    fn test_train_start_on_empty_buffer_fails_quietly() {
        let trainer = RecordingTrainer { fail: true, ..Default::default() };
        let mut s = session(&config(5, 25), trainer, MemoryStore::default());
        assert_eq!(s.handle(ClientMessage::TrainStart { save: false }).unwrap(), None);
        assert!(!s.state().is_ready());
    }

    #[test]
    fn test_train_start_with_save_persists_model() {
        let mut s = session(&config(2, 1), RecordingTrainer::default(), MemoryStore::default());
        for i in 0..10 {
            s.handle(ClientMessage::TrainRow(rising_candle(i))).unwrap();
        }
        assert_eq!(s.handle(ClientMessage::TrainStart { save: true }).unwrap(), Some(ServerMessage::TrainFinish));
        assert!(s.store.models.lock().unwrap().contains_key("test_model"));
    }

    #[test]
    fn test_failed_save_leaves_state_unchanged() {
        let store = MemoryStore { fail_save: true, ..Default::default() };
        let mut s = session(&config(2, 1), RecordingTrainer::default(), store);
        for i in 0..10 {
            s.handle(ClientMessage::TrainRow(rising_candle(i))).unwrap();
        }
        assert_eq!(s.handle(ClientMessage::TrainStart { save: true }).unwrap(), None);
        assert!(!s.state().is_ready());
    }

    #[test]
    fn test_failed_retrain_keeps_previous_model() {
        let mut s = session(&config(2, 1), RecordingTrainer::default(), MemoryStore::default());
        for i in 0..10 {
            s.handle(ClientMessage::TrainRow(rising_candle(i))).unwrap();
        }
        s.handle(ClientMessage::TrainStart { save: false }).unwrap();
        assert!(s.state().is_ready());

        // Swap in a failing trainer; the installed model must survive.
        s.trainer = Arc::new(RecordingTrainer { fail: true, ..Default::default() });
        assert_eq!(s.handle(ClientMessage::TrainStart { save: false }).unwrap(), None);
        assert!(matches!(s.state(), ModelState::Ready(m) if m.class == Label::SwingHigh));
    }

    #[test]
    fn test_ramp_up_then_missing_model_is_fatal() {
        let mut s = session(&config(50, 25), RecordingTrainer::default(), MemoryStore::default());
        for i in 0..50 {
            let reply = s.handle(ClientMessage::Row(rising_candle(i))).unwrap();
            assert_eq!(reply, Some(ServerMessage::Prediction { prediction: Label::None }));
        }
        let result = s.handle(ClientMessage::Row(rising_candle(50)));
        assert!(matches!(result, Err(EngineError::ModelNotFound(ref k)) if k == "test_model"));
        assert!(!s.state().is_ready());
    }

    #[test]
    fn test_lazy_load_then_predict() {
        let width = RATIO_FEATURES.len() * 4;
        let store = MemoryStore::default();
        store
            .models
            .lock()
            .unwrap()
            .insert("test_model".to_string(), FixedModel { class: Label::SwingLow, width });
        let mut s = session(&config(3, 25), RecordingTrainer::default(), store);

        for i in 0..3 {
            assert_eq!(
                s.handle(ClientMessage::Row(rising_candle(i))).unwrap(),
                Some(ServerMessage::Prediction { prediction: Label::None })
            );
        }
        assert!(!s.state().is_ready());
        for i in 3..10 {
            assert_eq!(
                s.handle(ClientMessage::Row(rising_candle(i))).unwrap(),
                Some(ServerMessage::Prediction { prediction: Label::SwingLow })
            );
            assert_eq!(s.window_len(), 4);
        }
        assert!(s.state().is_ready());
    }

    #[test]
    fn test_trained_model_is_used_without_loading() {
        let trainer = RecordingTrainer { class: Some(Label::SwingLow), ..Default::default() };
        let mut s = session(&config(2, 1), trainer, MemoryStore::default());
        for i in 0..10 {
            s.handle(ClientMessage::TrainRow(rising_candle(i))).unwrap();
        }
        s.handle(ClientMessage::TrainStart { save: false }).unwrap();

        let mut last = None;
        for i in 10..13 {
            last = s.handle(ClientMessage::Row(rising_candle(i))).unwrap();
        }
        assert_eq!(last, Some(ServerMessage::Prediction { prediction: Label::SwingLow }));
        // Live rows never reach the training buffer.
        assert_eq!(s.training_len(), 10);
    }

    #[test]
    fn test_prediction_failure_is_fatal() {
        let store = MemoryStore::default();
        store
            .models
            .lock()
            .unwrap()
            .insert("test_model".to_string(), FixedModel { class: Label::None, width: 1 });
        let mut s = session(&config(1, 1), RecordingTrainer::default(), store);
        s.handle(ClientMessage::Row(rising_candle(0))).unwrap();
        assert!(matches!(
            s.handle(ClientMessage::Row(rising_candle(1))),
            Err(EngineError::PredictionError(_))
        ));
    }

    #[test]
    fn test_unknown_message_is_ignored() {
        let mut s = session(&config(5, 25), RecordingTrainer::default(), MemoryStore::default());
        assert_eq!(s.handle(ClientMessage::Unknown).unwrap(), None);
        assert_eq!(s.training_len(), 0);
        assert_eq!(s.window_len(), 0);
    }
}
