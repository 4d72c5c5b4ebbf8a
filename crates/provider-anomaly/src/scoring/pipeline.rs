use super::error::ScoringError;
use super::features::{FeatureAssembler, FeatureVector, ProviderClaimInput, FEATURE_COUNT};
use super::model::{AnomalyModelAdapter, OutlierModel};
use super::registry::CategoryRegistry;
use super::verdict::{Verdict, VerdictInterpreter};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of scoring one claim profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringOutcome {
    pub features: FeatureVector,
    pub verdict: Verdict,
}

/// Registry → assembler → model → interpreter, assembled once at startup and
/// shared read-only between requests.
#[derive(Debug)]
pub struct AnomalyPipeline {
    assembler: FeatureAssembler,
    adapter: AnomalyModelAdapter,
}

impl AnomalyPipeline {
    /// Fails when the model's input arity does not match the feature
    /// contract, or when the model pins a registry fingerprint that differs
    /// from `registry` and `enforce_fingerprint` is set.
    pub fn new(
        registry: Arc<CategoryRegistry>,
        model: Arc<dyn OutlierModel>,
        enforce_fingerprint: bool,
    ) -> Result<Self, ScoringError> {
        let adapter = AnomalyModelAdapter::new(model);
        adapter.ensure_arity(FEATURE_COUNT)?;

        if let Some(expected) = adapter.model().registry_fingerprint() {
            let actual = registry.fingerprint();
            if expected != actual {
                if enforce_fingerprint {
                    return Err(ScoringError::RegistryDrift {
                        expected: expected.to_string(),
                        actual,
                    });
                }
                warn!(%expected, %actual, "category registry differs from the model's training registry");
            }
        }

        Ok(Self {
            assembler: FeatureAssembler::new(registry),
            adapter,
        })
    }

    pub fn registry(&self) -> &CategoryRegistry {
        self.assembler.registry()
    }

    pub fn evaluate(&self, input: &ProviderClaimInput) -> Result<ScoringOutcome, ScoringError> {
        let features = self.assembler.assemble(input).map_err(|error| {
            warn!(provider = %input.provider, procedure = %input.procedure, %error, "rejected scoring request");
            error
        })?;

        let classification = self.adapter.classify(&features)?;
        let score = self.adapter.score(&features)?;
        let verdict = VerdictInterpreter::interpret(classification, score);

        info!(
            provider = %input.provider,
            procedure = %input.procedure,
            is_anomalous = verdict.is_anomalous,
            raw_decision_score = verdict.raw_decision_score,
            "scored provider profile"
        );

        Ok(ScoringOutcome { features, verdict })
    }
}
