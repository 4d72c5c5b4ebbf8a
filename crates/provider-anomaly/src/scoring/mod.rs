//! Provider billing anomaly scoring.
//!
//! Requests flow strictly from the category registry through the feature
//! assembler and model adapter to the verdict interpreter. The registry and
//! the loaded model are built once at startup and never mutated.

pub mod error;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod reference;
pub mod registry;
pub mod router;
pub mod verdict;

pub use error::ScoringError;
pub use features::{
    FeatureAssembler, FeatureVector, ProviderClaimInput, FEATURE_COUNT, FEATURE_NAMES,
};
pub use model::{
    AnomalyModelAdapter, Classification, IsolationForestModel, ModelArtifact, ModelLoadError,
    OutlierModel,
};
pub use pipeline::{AnomalyPipeline, ScoringOutcome};
pub use reference::{ReferenceDataset, ReferenceDatasetError};
pub use registry::{
    CategoryCode, CategoryDimension, CategoryEncoding, CategoryLabel, CategoryRegistry,
};
pub use router::scoring_router;
pub use verdict::{Verdict, VerdictInterpreter};
