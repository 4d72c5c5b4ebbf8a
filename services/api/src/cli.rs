use crate::commands::{run_categories, run_score, CategoriesArgs, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use provider_anomaly::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Provider Anomaly Scoring",
    about = "Flag providers whose billing profile is anomalous against a trained population model",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a single provider billing profile from the command line
    Score(ScoreArgs),
    /// List the provider or procedure labels known to the registry
    Categories(CategoriesArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Categories(args) => run_categories(args),
    }
}
