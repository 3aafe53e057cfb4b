use crate::infra::{load_answers, load_questionnaire};
use assessment_engine::assessment::persistence::write_history_csv;
use assessment_engine::assessment::{
    AssessmentId, AssessmentReport, Catalog, FileStore, PersistenceManager, PersistenceSettings,
    Questionnaire, ToolId,
};
use assessment_engine::config::AppConfig;
use assessment_engine::error::AppError;
use clap::{ArgGroup, Args, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["tool", "questionnaire"])))]
pub(crate) struct ScoreArgs {
    /// Built-in tool id (compliance-checklist, quality-metrics, risk-evaluation, use-case-assessment)
    #[arg(long)]
    pub(crate) tool: Option<String>,
    /// Questionnaire definition in JSON
    #[arg(long)]
    pub(crate) questionnaire: Option<PathBuf>,
    /// Answers as a JSON object keyed by question id
    #[arg(long)]
    pub(crate) answers: PathBuf,
    /// Emit the full report as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum CatalogCommand {
    /// List the built-in questionnaires
    List,
    /// Print a questionnaire definition as JSON
    Show {
        /// Tool id to show
        tool: String,
    },
}

#[derive(Args, Debug)]
pub(crate) struct HistoryArgs {
    /// Tool whose history to manage
    #[arg(long, default_value = assessment_engine::assessment::QUALITY_METRICS)]
    pub(crate) tool: String,
    #[command(subcommand)]
    pub(crate) command: HistoryCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum HistoryCommand {
    /// List saved assessments, newest first
    List,
    /// Print one saved assessment as JSON
    Show { id: String },
    /// Delete one saved assessment
    Delete { id: String },
    /// Delete every saved assessment for the tool
    Clear,
    /// Export the history as CSV
    Export {
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        tool,
        questionnaire,
        answers,
        json,
    } = args;

    let questionnaire = match (tool, questionnaire) {
        (_, Some(path)) => Arc::new(load_questionnaire(&path)?),
        (Some(tool), None) => builtin(&ToolId::from(tool))?,
        (None, None) => {
            return Err(AppError::Input(
                "either --tool or --questionnaire is required".to_string(),
            ))
        }
    };

    let answers = questionnaire.normalize_answers(load_answers(&answers)?)?;
    let report = questionnaire.evaluate(&answers);

    if json {
        print_json(&report)?;
    } else {
        render_report(
            &questionnaire,
            &report,
            questionnaire.progress_percent(&answers),
        );
    }
    Ok(())
}

pub(crate) fn run_catalog(command: CatalogCommand) -> Result<(), AppError> {
    let catalog = Catalog::standard()?;
    match command {
        CatalogCommand::List => {
            for questionnaire in catalog.tools() {
                println!(
                    "{} - {} ({} sections, {} required questions)",
                    questionnaire.tool(),
                    questionnaire.title(),
                    questionnaire.section_count(),
                    questionnaire.required_total()
                );
            }
            Ok(())
        }
        CatalogCommand::Show { tool } => {
            let tool = ToolId::from(tool);
            let questionnaire = catalog
                .get(&tool)
                .ok_or_else(|| AppError::UnknownTool(tool.clone()))?;
            print_json(questionnaire.definition())
        }
    }
}

pub(crate) fn run_history(args: HistoryArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let tool = ToolId::from(args.tool);
    builtin(&tool)?;

    let store = Arc::new(FileStore::new(&config.persistence.store_dir));
    let manager = PersistenceManager::new(
        store,
        tool.clone(),
        PersistenceSettings::from(&config.persistence),
    );

    match args.command {
        HistoryCommand::List => {
            let history = manager.history();
            if history.is_empty() {
                println!("No saved assessments for {tool}");
            }
            for record in history {
                let overall = &record.results.overall;
                println!(
                    "{}  {}  {}  score {} ({})  {}% complete",
                    record.id,
                    record.created_at.format("%Y-%m-%d %H:%M"),
                    record.title,
                    overall.score,
                    overall.level().unwrap_or("unclassified"),
                    record.progress_percent
                );
            }
        }
        HistoryCommand::Show { id } => {
            let id = AssessmentId::from(id);
            let record = manager
                .get(&id)
                .ok_or_else(|| AppError::NotFound(format!("saved assessment '{id}'")))?;
            print_json(&record)?;
        }
        HistoryCommand::Delete { id } => {
            let id = AssessmentId::from(id);
            if !manager.delete(&id)? {
                return Err(AppError::NotFound(format!("saved assessment '{id}'")));
            }
            println!("Deleted {id}");
        }
        HistoryCommand::Clear => {
            let cleared = manager.clear()?;
            println!("Cleared {cleared} saved assessments for {tool}");
        }
        HistoryCommand::Export { output } => {
            let history = manager.history();
            match output {
                Some(path) => {
                    let file = File::create(&path)?;
                    write_history_csv(&history, BufWriter::new(file))?;
                    println!("Exported {} rows to {}", history.len(), path.display());
                }
                None => {
                    write_history_csv(&history, io::stdout().lock())?;
                }
            }
        }
    }
    Ok(())
}

fn builtin(tool: &ToolId) -> Result<Arc<Questionnaire>, AppError> {
    let catalog = Catalog::standard()?;
    catalog
        .get(tool)
        .cloned()
        .ok_or_else(|| AppError::UnknownTool(tool.clone()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::Input(format!("failed to render json ({err})")))?;
    println!("{rendered}");
    Ok(())
}

pub(crate) fn render_report(questionnaire: &Questionnaire, report: &AssessmentReport, progress: u8) {
    let overall = &report.scores.overall;
    println!("{} ({}% complete)", questionnaire.title(), progress);
    match &overall.classification {
        Some(band) => println!(
            "Overall: {} - {} ({:?})\n  {}",
            overall.score, band.label, overall.basis, band.description
        ),
        None => println!("Overall: no assessed items yet"),
    }

    println!("Dimensions:");
    for dimension in &report.scores.dimensions {
        if dimension.assessed {
            println!(
                "  - {}: {} ({}/{} items)",
                dimension.label, dimension.score, dimension.answered_count, dimension.total_metrics
            );
        } else {
            println!("  - {}: not assessed", dimension.label);
        }
    }

    if report.recommendations.is_empty() {
        return;
    }
    println!("Recommendations:");
    for item in &report.recommendations {
        println!("  [{:?}] {}: {}", item.priority, item.category, item.action);
        println!("      {}", item.justification);
    }
}
