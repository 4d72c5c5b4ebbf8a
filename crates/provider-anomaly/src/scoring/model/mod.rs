//! Inference seam between the pipeline and the trained outlier model.

mod artifact;
mod isolation_forest;

pub use artifact::{ModelArtifact, ModelLoadError, ARTIFACT_FORMAT_VERSION};
pub use isolation_forest::{ForestNode, IsolationForestModel, IsolationTree};

use super::error::ScoringError;
use super::features::FeatureVector;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Raw inference primitives a trained outlier model must expose. Models are
/// read-only once loaded and may be shared across threads without locking.
pub trait OutlierModel: Send + Sync {
    /// Number of features the model was fitted on.
    fn input_arity(&self) -> usize;

    /// `+1` for inliers and `-1` for outliers.
    fn predict(&self, features: &[f64]) -> i8;

    /// Lower is more anomalous; negative values sit past the decision boundary.
    fn decision_function(&self, features: &[f64]) -> f64;

    /// Fingerprint of the category registry the model was trained against.
    fn registry_fingerprint(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Normal,
    Anomalous,
}

impl Classification {
    fn from_raw_prediction(raw: i8) -> Self {
        if raw < 0 {
            Classification::Anomalous
        } else {
            Classification::Normal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Classification::Normal => "NORMAL",
            Classification::Anomalous => "ANOMALOUS",
        }
    }
}

/// Presents any [`OutlierModel`] through `classify` and `score`.
pub struct AnomalyModelAdapter {
    model: Arc<dyn OutlierModel>,
}

impl AnomalyModelAdapter {
    pub fn new(model: Arc<dyn OutlierModel>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &dyn OutlierModel {
        self.model.as_ref()
    }

    pub fn classify(&self, vector: &FeatureVector) -> Result<Classification, ScoringError> {
        let features = self.checked_input(vector)?;
        Ok(Classification::from_raw_prediction(
            self.model.predict(features),
        ))
    }

    /// Raw decision score, passed through without rescaling.
    pub fn score(&self, vector: &FeatureVector) -> Result<f64, ScoringError> {
        let features = self.checked_input(vector)?;
        Ok(self.model.decision_function(features))
    }

    /// The only arity comparison in the crate. Pipelines call it once at
    /// construction, and every `classify`/`score` call runs it again.
    pub fn ensure_arity(&self, actual: usize) -> Result<(), ScoringError> {
        let expected = self.model.input_arity();
        if actual != expected {
            return Err(ScoringError::ModelInputMismatch { expected, actual });
        }
        Ok(())
    }

    fn checked_input<'a>(&self, vector: &'a FeatureVector) -> Result<&'a [f64], ScoringError> {
        let features = vector.as_slice();
        self.ensure_arity(features.len())?;
        Ok(features)
    }
}

impl std::fmt::Debug for AnomalyModelAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnomalyModelAdapter")
            .field("input_arity", &self.model.input_arity())
            .finish()
    }
}
