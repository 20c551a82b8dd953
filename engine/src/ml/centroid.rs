//! Nearest-centroid classifier over standardised features.
//!
//! Stands in for a heavier learner behind the `Trainer` seam: it is deterministic,
//! needs no tuning and serialises to a few kilobytes of JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::Label;
use tracing::info;

use super::{Model, Trainer};
use crate::error::{EngineError, Result};
use crate::features::FeatureMatrix;

/// Columns with a standard deviation below this are left unscaled.
const MIN_SCALE: f64 = 1e-12;

/// Share of rows (oldest first) used for fitting when measuring hold-out accuracy.
const TRAIN_SPLIT: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentroidModel {
    pub columns: Vec<String>,
    means: Vec<f64>,
    scales: Vec<f64>,
    centroids: Vec<(Label, Vec<f64>)>,
    pub training_rows: usize,
    pub trained_at: DateTime<Utc>,
}

impl CentroidModel {
    pub fn classes(&self) -> Vec<Label> {
        self.centroids.iter().map(|(label, _)| *label).collect()
    }

    fn standardise(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect()
    }
}

impl Model for CentroidModel {
    fn predict(&self, features: &[f64]) -> Result<Label> {
        if features.len() != self.means.len() {
            return Err(EngineError::PredictionError(format!(
                "expected {} features, got {}",
                self.means.len(),
                features.len()
            )));
        }
        if let Some(pos) = features.iter().position(|v| !v.is_finite()) {
            return Err(EngineError::PredictionError(format!("non-finite feature at column {}", pos)));
        }

        let z = self.standardise(features);
        let mut best: Option<(Label, f64)> = None;
        for (label, centroid) in &self.centroids {
            let dist: f64 = z.iter().zip(centroid).map(|(a, b)| (a - b) * (a - b)).sum();
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((*label, dist));
            }
        }
        best.map(|(label, _)| label)
            .ok_or_else(|| EngineError::PredictionError("model has no classes".to_string()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct CentroidTrainer;

impl CentroidTrainer {
    pub fn new() -> Self {
        CentroidTrainer
    }

    fn fit_rows(columns: &[String], rows: &[Vec<f64>], labels: &[Label]) -> CentroidModel {
        let width = columns.len();
        let n = rows.len() as f64;

        let mut means = vec![0.0; width];
        for row in rows {
            for (m, x) in means.iter_mut().zip(row) {
                *m += x / n;
            }
        }
        let mut scales = vec![0.0; width];
        for row in rows {
            for ((s, x), m) in scales.iter_mut().zip(row).zip(&means) {
                *s += (x - m) * (x - m) / n;
            }
        }
        for s in scales.iter_mut() {
            *s = if s.sqrt() > MIN_SCALE { s.sqrt() } else { 1.0 };
        }

        let mut centroids = Vec::new();
        for class in Label::ALL {
            let members: Vec<&Vec<f64>> = rows.iter().zip(labels).filter(|(_, l)| **l == class).map(|(r, _)| r).collect();
            if members.is_empty() {
                continue;
            }
            let count = members.len() as f64;
            let mut centroid = vec![0.0; width];
            for row in members {
                for (c, ((x, m), s)) in centroid.iter_mut().zip(row.iter().zip(&means).zip(&scales)) {
                    *c += (x - m) / s / count;
                }
            }
            centroids.push((class, centroid));
        }

        CentroidModel {
            columns: columns.to_vec(),
            means,
            scales,
            centroids,
            training_rows: rows.len(),
            trained_at: Utc::now(),
        }
    }

    // Fits on the oldest rows and scores the newest ones, without shuffling.
    fn holdout_accuracy(columns: &[String], rows: &[Vec<f64>], labels: &[Label]) -> Option<(usize, f64)> {
        let split = (rows.len() as f64 * TRAIN_SPLIT) as usize;
        if split == 0 || split >= rows.len() {
            return None;
        }
        let model = Self::fit_rows(columns, &rows[..split], &labels[..split]);
        let held_out = &rows[split..];
        let correct = held_out
            .iter()
            .zip(&labels[split..])
            .filter(|(row, label)| model.predict(row).map_or(false, |p| p == **label))
            .count();
        Some((held_out.len(), correct as f64 / held_out.len() as f64))
    }
}

impl Trainer for CentroidTrainer {
    type Model = CentroidModel;

    fn fit(&self, features: &FeatureMatrix, labels: &[Label]) -> Result<CentroidModel> {
        if features.is_empty() {
            return Err(EngineError::TrainingError("no feature rows to train on".to_string()));
        }
        if features.len() != labels.len() {
            return Err(EngineError::TrainingError(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }
        if let Some(bad) = features.rows.iter().position(|r| r.len() != features.width()) {
            return Err(EngineError::TrainingError(format!("feature row {} has the wrong width", bad)));
        }

        let count = |class: Label| labels.iter().filter(|l| **l == class).count();
        info!(
            rows = features.len(),
            columns = features.width(),
            none = count(Label::None),
            swing_high = count(Label::SwingHigh),
            swing_low = count(Label::SwingLow),
            "Fitting centroid model"
        );

        if let Some((holdout_rows, accuracy)) = Self::holdout_accuracy(&features.columns, &features.rows, labels) {
            info!(holdout_rows, accuracy, "Hold-out accuracy");
        }

        Ok(Self::fit_rows(&features.columns, &features.rows, labels))
    }
}
