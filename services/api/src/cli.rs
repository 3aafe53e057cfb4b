use crate::commands::{run_catalog, run_history, run_score, CatalogCommand, HistoryArgs, ScoreArgs};
use crate::demo::{run_demo, DemoArgs};
use crate::server;
use assessment_engine::error::AppError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Assessment Engine",
    about = "Score synthetic data governance questionnaires: quality, risk, compliance and use-case suitability",
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
    /// Score a JSON answer file against a questionnaire
    Score(ScoreArgs),
    /// Inspect the built-in questionnaires
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
    /// Manage saved assessments in the configured store
    History(HistoryArgs),
    /// Walk through a scripted quality assessment end to end
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Register an additional questionnaire definition (JSON) alongside the built-ins
    #[arg(long)]
    pub(crate) questionnaire: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Catalog { command } => run_catalog(command),
        Command::History(args) => run_history(args),
        Command::Demo(args) => run_demo(args),
    }
}
