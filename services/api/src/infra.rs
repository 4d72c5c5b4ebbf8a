use metrics_exporter_prometheus::PrometheusHandle;
use provider_anomaly::config::ArtifactConfig;
use provider_anomaly::error::AppError;
use provider_anomaly::scoring::{
    AnomalyPipeline, CategoryDimension, IsolationForestModel, ReferenceDataset,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Reads the reference export and model artifact once and assembles the
/// shared pipeline.
pub(crate) fn load_pipeline(artifacts: &ArtifactConfig) -> Result<AnomalyPipeline, AppError> {
    let dataset = ReferenceDataset::from_path(&artifacts.reference_csv)?;
    let registry = dataset.registry();
    info!(
        path = %artifacts.reference_csv.display(),
        rows = dataset.len(),
        providers = registry.labels(CategoryDimension::Provider).len(),
        procedures = registry.labels(CategoryDimension::Procedure).len(),
        fingerprint = %registry.fingerprint(),
        "built category registry"
    );

    let model = IsolationForestModel::from_path(&artifacts.model_path)?;
    info!(
        path = %artifacts.model_path.display(),
        trees = model.tree_count(),
        "loaded scoring model"
    );

    let pipeline = AnomalyPipeline::new(
        Arc::new(registry),
        Arc::new(model),
        artifacts.enforce_registry_fingerprint,
    )?;
    Ok(pipeline)
}

pub(crate) fn artifact_overrides(
    mut artifacts: ArtifactConfig,
    reference_csv: Option<std::path::PathBuf>,
    model: Option<std::path::PathBuf>,
) -> ArtifactConfig {
    if let Some(path) = reference_csv {
        artifacts.reference_csv = path;
    }
    if let Some(path) = model {
        artifacts.model_path = path;
    }
    artifacts
}
