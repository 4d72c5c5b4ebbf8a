use crate::infra::{artifact_overrides, load_pipeline};
use clap::Args;
use provider_anomaly::config::AppConfig;
use provider_anomaly::error::AppError;
use provider_anomaly::scoring::{
    AnomalyPipeline, CategoryDimension, ProviderClaimInput, ScoringError, ScoringOutcome,
};
use provider_anomaly::telemetry;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Provider name exactly as it appears in the reference dataset
    #[arg(long)]
    pub(crate) provider: String,
    /// Procedure name exactly as it appears in the reference dataset
    #[arg(long)]
    pub(crate) procedure: String,
    /// Average covered charges in dollars
    #[arg(long, default_value_t = 50000.0, allow_negative_numbers = true)]
    pub(crate) avg_covered_charges: f64,
    /// Average total payments in dollars
    #[arg(long, default_value_t = 20000.0, allow_negative_numbers = true)]
    pub(crate) avg_total_payments: f64,
    /// Total discharges
    #[arg(long, default_value_t = 100, allow_negative_numbers = true)]
    pub(crate) total_discharge: i64,
    /// Override the reference dataset CSV (defaults to APP_REFERENCE_CSV)
    #[arg(long)]
    pub(crate) reference_csv: Option<PathBuf>,
    /// Override the model artifact (defaults to APP_MODEL_PATH)
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct CategoriesArgs {
    /// Dimension to list: provider or procedure
    #[arg(long, value_parser = parse_dimension)]
    pub(crate) dimension: CategoryDimension,
    /// Override the reference dataset CSV (defaults to APP_REFERENCE_CSV)
    #[arg(long)]
    pub(crate) reference_csv: Option<PathBuf>,
    /// Override the model artifact (defaults to APP_MODEL_PATH)
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
}

fn parse_dimension(raw: &str) -> Result<CategoryDimension, String> {
    raw.parse::<CategoryDimension>().map_err(|err| err.to_string())
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        provider,
        procedure,
        avg_covered_charges,
        avg_total_payments,
        total_discharge,
        reference_csv,
        model,
    } = args;

    let pipeline = cli_pipeline(reference_csv, model)?;
    let input = ProviderClaimInput {
        provider,
        procedure,
        avg_covered_charges,
        avg_total_payments,
        total_discharge,
    };

    match pipeline.evaluate(&input) {
        Ok(outcome) => {
            render_outcome(&input, &outcome);
            Ok(())
        }
        Err(error) => {
            render_rejection(&error);
            Err(error.into())
        }
    }
}

pub(crate) fn run_categories(args: CategoriesArgs) -> Result<(), AppError> {
    let CategoriesArgs {
        dimension,
        reference_csv,
        model,
    } = args;

    let pipeline = cli_pipeline(reference_csv, model)?;
    let labels = pipeline.registry().labels(dimension);

    println!("Known {} labels ({})", dimension, labels.len());
    for (code, label) in labels.iter().enumerate() {
        println!("- {code:>4} | {label}");
    }

    Ok(())
}

fn cli_pipeline(
    reference_csv: Option<PathBuf>,
    model: Option<PathBuf>,
) -> Result<AnomalyPipeline, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let artifacts = artifact_overrides(config.artifacts, reference_csv, model);
    load_pipeline(&artifacts)
}

fn render_outcome(input: &ProviderClaimInput, outcome: &ScoringOutcome) {
    let verdict = &outcome.verdict;

    println!("Provider anomaly check");
    println!("Provider: {}", input.provider.trim());
    println!("Procedure: {}", input.procedure.trim());

    if verdict.is_anomalous {
        println!("\nAlert: this provider is flagged as ANOMALOUS.");
    } else {
        println!("\nThis provider appears NORMAL.");
    }
    println!("Decision score: {}", verdict.display_score());
    println!("Reason: {}", verdict.reason);

    println!("\nFeature vector");
    for (name, value) in outcome.features.named() {
        println!("- {name}: {value}");
    }
}

fn render_rejection(error: &ScoringError) {
    match error {
        ScoringError::UnknownCategory {
            dimension,
            label,
            known_labels,
        } => {
            println!("Selected {dimension} '{label}' not found in the reference dataset.");
            println!("Available {dimension} labels:");
            for known in known_labels {
                println!("- {known}");
            }
        }
        other => println!("Request rejected: {other}"),
    }
}
