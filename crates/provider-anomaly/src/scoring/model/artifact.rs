use super::isolation_forest::{IsolationForestModel, IsolationTree};
use crate::scoring::features::{FEATURE_COUNT, FEATURE_NAMES};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::info;

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

const ISOLATION_FOREST: &str = "isolation_forest";

#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid model artifact JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported model artifact format version {0}")]
    UnsupportedFormat(u32),
    #[error("unsupported model algorithm '{0}'")]
    UnsupportedAlgorithm(String),
    #[error("model was trained on features {actual:?}, expected {expected:?}")]
    FeatureOrder {
        expected: Vec<String>,
        actual: Vec<String>,
    },
    #[error("model artifact is invalid: {0}")]
    Invalid(String),
}

/// Serialized form of a trained forest as exported by the training job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub algorithm: String,
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub trained_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub registry_fingerprint: Option<String>,
    pub max_samples: u64,
    pub offset: f64,
    pub trees: Vec<IsolationTree>,
}

impl ModelArtifact {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ModelLoadError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ModelLoadError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Checks the artifact against the feature contract and builds the
    /// in-memory model.
    pub fn into_model(self) -> Result<IsolationForestModel, ModelLoadError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ModelLoadError::UnsupportedFormat(self.format_version));
        }
        if self.algorithm != ISOLATION_FOREST {
            return Err(ModelLoadError::UnsupportedAlgorithm(self.algorithm));
        }
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            return Err(ModelLoadError::FeatureOrder {
                expected: FEATURE_NAMES.iter().map(|name| name.to_string()).collect(),
                actual: self.feature_names,
            });
        }
        if self.trees.is_empty() {
            return Err(ModelLoadError::Invalid("forest has no trees".to_string()));
        }
        if self.max_samples < 2 {
            return Err(ModelLoadError::Invalid(format!(
                "max_samples must be at least 2 (got {})",
                self.max_samples
            )));
        }
        if !self.offset.is_finite() {
            return Err(ModelLoadError::Invalid("offset must be finite".to_string()));
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate(FEATURE_COUNT)
                .map_err(|reason| ModelLoadError::Invalid(format!("tree {index}: {reason}")))?;
        }

        info!(
            trees = self.trees.len(),
            max_samples = self.max_samples,
            trained_at = ?self.trained_at,
            pinned_registry = self.registry_fingerprint.is_some(),
            "loaded isolation forest artifact"
        );

        Ok(IsolationForestModel {
            trees: self.trees,
            max_samples: self.max_samples,
            offset: self.offset,
            arity: FEATURE_COUNT,
            registry_fingerprint: self.registry_fingerprint,
        })
    }
}

impl IsolationForestModel {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ModelLoadError> {
        ModelArtifact::from_path(path)?.into_model()
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ModelLoadError> {
        ModelArtifact::from_reader(reader)?.into_model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn artifact_json() -> serde_json::Value {
        json!({
            "format_version": 1,
            "algorithm": "isolation_forest",
            "feature_names": FEATURE_NAMES,
            "trained_at": "2025-02-11T09:30:00Z",
            "max_samples": 4,
            "offset": -0.5,
            "trees": [
                { "nodes": [
                    { "kind": "split", "feature": 4, "threshold": 100000.0, "left": 1, "right": 2 },
                    { "kind": "leaf", "samples": 3 },
                    { "kind": "leaf", "samples": 1 }
                ] }
            ]
        })
    }

    fn load(value: serde_json::Value) -> Result<IsolationForestModel, ModelLoadError> {
        IsolationForestModel::from_reader(value.to_string().as_bytes())
    }

    #[test]
    fn loads_valid_artifact() {
        let model = load(artifact_json()).expect("artifact loads");
        assert_eq!(model.tree_count(), 1);
        assert_eq!(model.arity, FEATURE_COUNT);
        assert!(model.registry_fingerprint.is_none());
    }

    #[test]
    fn rejects_reordered_features() {
        let mut value = artifact_json();
        value["feature_names"] = json!([
            "provider_code",
            "procedure_code",
            "total_discharge",
            "avg_covered_charges",
            "avg_total_payments"
        ]);
        match load(value) {
            Err(ModelLoadError::FeatureOrder { actual, .. }) => {
                assert_eq!(actual[0], "provider_code")
            }
            other => panic!("expected feature order error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_versions_and_algorithms() {
        let mut value = artifact_json();
        value["format_version"] = json!(2);
        assert!(matches!(load(value), Err(ModelLoadError::UnsupportedFormat(2))));

        let mut value = artifact_json();
        value["algorithm"] = json!("one_class_svm");
        assert!(matches!(
            load(value),
            Err(ModelLoadError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn rejects_structurally_invalid_forests() {
        let mut value = artifact_json();
        value["trees"] = json!([]);
        assert!(matches!(load(value), Err(ModelLoadError::Invalid(_))));

        let mut value = artifact_json();
        value["trees"][0]["nodes"][0]["feature"] = json!(9);
        assert!(matches!(load(value), Err(ModelLoadError::Invalid(_))));

        let mut value = artifact_json();
        value["max_samples"] = json!(1);
        assert!(matches!(load(value), Err(ModelLoadError::Invalid(_))));
    }

    #[test]
    fn malformed_json_is_reported() {
        let error = IsolationForestModel::from_reader("{ not json".as_bytes())
            .expect_err("expected json error");
        assert!(matches!(error, ModelLoadError::Json(_)));
    }
}
