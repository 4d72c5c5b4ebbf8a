use super::error::ScoringError;
use super::registry::{CategoryDimension, CategoryRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

pub const FEATURE_COUNT: usize = 5;

/// Column order the scoring model was trained on. Reordering does not fail
/// loudly; it silently corrupts every prediction.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "procedure_code",
    "provider_code",
    "total_discharge",
    "avg_covered_charges",
    "avg_total_payments",
];

/// Raw claim profile as collected from a form or API caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderClaimInput {
    pub provider: String,
    pub procedure: String,
    pub avg_covered_charges: f64,
    pub avg_total_payments: f64,
    pub total_discharge: i64,
}

/// Model input in training column order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        self.0
    }

    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

/// Resolves labels against a shared registry snapshot and lays features out
/// in training order.
#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    registry: Arc<CategoryRegistry>,
}

impl FeatureAssembler {
    pub fn new(registry: Arc<CategoryRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn assemble(&self, input: &ProviderClaimInput) -> Result<FeatureVector, ScoringError> {
        let avg_covered_charges =
            non_negative("avg_covered_charges", input.avg_covered_charges)?;
        let avg_total_payments = non_negative("avg_total_payments", input.avg_total_payments)?;
        if input.total_discharge < 0 {
            return Err(ScoringError::InvalidNumericInput {
                field: "total_discharge",
                value: input.total_discharge.to_string(),
            });
        }

        let procedure_code = self
            .registry
            .encode(CategoryDimension::Procedure, &input.procedure)?;
        let provider_code = self
            .registry
            .encode(CategoryDimension::Provider, &input.provider)?;

        debug!(
            procedure_code = procedure_code.0,
            provider_code = provider_code.0,
            "assembled feature vector"
        );

        Ok(FeatureVector([
            procedure_code.as_feature(),
            provider_code.as_feature(),
            input.total_discharge as f64,
            avg_covered_charges,
            avg_total_payments,
        ]))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, ScoringError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ScoringError::InvalidNumericInput {
            field,
            value: value.to_string(),
        })
    }
}
