//! Model collaborators.
//!
//! The session only sees these traits: something that fits a model to labelled
//! features, the fitted model itself, and somewhere to persist models between
//! sessions. `CentroidTrainer` and `JsonFileModelStore` are the implementations
//! the server binary wires in.

pub mod centroid;
pub mod store;

pub use centroid::{CentroidModel, CentroidTrainer};
pub use store::JsonFileModelStore;

use crate::error::Result;
use crate::features::FeatureMatrix;
use shared::models::Label;

/// A fitted classifier.
pub trait Model: Send + 'static {
    /// Classifies one lag-expanded feature row.
    fn predict(&self, features: &[f64]) -> Result<Label>;
}

/// Fits models. May take arbitrarily long; callers run it off the async runtime.
pub trait Trainer: Send + Sync + 'static {
    type Model: Model;

    /// `labels[k]` is the label of `features.rows[k]`.
    fn fit(&self, features: &FeatureMatrix, labels: &[Label]) -> Result<Self::Model>;
}

/// Durable model storage keyed by name.
pub trait ModelStore<M>: Send + Sync + 'static {
    fn save(&self, model: &M, key: &str) -> Result<()>;

    /// Fails with `EngineError::ModelNotFound` when nothing is stored under `key`.
    fn load(&self, key: &str) -> Result<M>;
}
