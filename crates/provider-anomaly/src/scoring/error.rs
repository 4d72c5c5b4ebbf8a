use super::registry::{CategoryCode, CategoryDimension};

/// Typed failures raised while turning a claim profile into a verdict.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("{dimension} '{label}' is not present in the category registry")]
    UnknownCategory {
        dimension: CategoryDimension,
        label: String,
        known_labels: Vec<String>,
    },
    #[error("{dimension} code {code} is not assigned in the category registry")]
    UnknownCode {
        dimension: CategoryDimension,
        code: CategoryCode,
    },
    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidNumericInput { field: &'static str, value: String },
    #[error("model expects {expected} features but received {actual}")]
    ModelInputMismatch { expected: usize, actual: usize },
    /// Raised while assembling a pipeline, never per request.
    #[error("category registry fingerprint {actual} does not match the model's training registry {expected}")]
    RegistryDrift { expected: String, actual: String },
}
