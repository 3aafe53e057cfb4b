use crate::commands::render_report;
use assessment_engine::assessment::{
    AnswerValue, AssessmentTool, Catalog, MemoryStore, PersistenceSettings, QuestionId,
    SaveStatus, ToolId, QUALITY_METRICS,
};
use assessment_engine::error::AppError;
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use std::io;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Stop after the results instead of exercising history save and reload.
    #[arg(long)]
    pub(crate) skip_history: bool,
    /// Print the history CSV export at the end of the demo.
    #[arg(long)]
    pub(crate) export_csv: bool,
}

const SCRIPT: [(&str, &str); 18] = [
    ("mean_preservation", "excellent"),
    ("variance_preservation", "good"),
    ("distribution_shape", "good"),
    ("outlier_preservation", "acceptable"),
    ("range_preservation", "excellent"),
    ("correlation_accuracy", "good"),
    ("covariance_matrix", "acceptable"),
    ("conditional_distributions", "not-assessed"),
    ("interactions", "good"),
    ("analysis_accuracy", "good"),
    ("model_performance", "acceptable"),
    ("feature_importance", "good"),
    ("membership_inference", "good"),
    ("record_similarity", "acceptable"),
    ("attribute_inference", "poor"),
    ("overall_fidelity", "good"),
    ("overall_utility", "good"),
    ("overall_privacy", "acceptable"),
];

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        skip_history,
        export_csv,
    } = args;

    let catalog = Catalog::standard()?;
    let tool_id = ToolId::from(QUALITY_METRICS);
    let questionnaire = Arc::clone(
        catalog
            .get(&tool_id)
            .ok_or_else(|| AppError::UnknownTool(tool_id.clone()))?,
    );
    let store = Arc::new(MemoryStore::new());
    let mut tool = AssessmentTool::new(
        Arc::clone(&questionnaire),
        store,
        PersistenceSettings::default(),
    );
    let mut clock = Utc::now();

    println!("Assessment engine demo: {}", questionnaire.title());
    if let Err(err) = tool.advance() {
        println!("- Advancing an empty form is rejected: {err}");
    }

    for (question, value) in SCRIPT {
        clock += Duration::milliseconds(350);
        tool.answer(&QuestionId::from(question), AnswerValue::choice(value), clock)?;
        while tool.session().can_advance() {
            let state = tool.advance()?;
            println!(
                "- Section complete, moved to {:?} ({}% answered)",
                state,
                tool.session().progress_percent()
            );
        }
    }
    tool.answer(
        &QuestionId::from("quality_issues"),
        AnswerValue::text("Rare categories are under-represented in the synthetic output"),
        clock,
    )?;

    clock += Duration::seconds(2);
    report_save(tool.tick(clock), clock);

    let report = tool.compute()?.clone();
    println!();
    render_report(&questionnaire, &report, tool.session().progress_percent());

    if skip_history {
        return Ok(());
    }

    println!("\nHistory");
    let receipt = tool.save_to_history(clock, Some("Demo baseline"))?;
    println!("- Saved {}", receipt.id);

    tool.restart();
    println!(
        "- Restarted: {} answers live, draft present: {}",
        tool.session().answers().len(),
        tool.persistence().load_draft().is_some()
    );

    match tool.load_from_history(&receipt.id, clock + Duration::seconds(5)) {
        Some(loaded) => println!(
            "- Reloaded {} ({} answers), stored results reproduced: {}",
            loaded.record.title,
            loaded.record.answers.len(),
            loaded.snapshot_matches
        ),
        None => println!("- Saved assessment could not be read back"),
    }

    if export_csv {
        println!();
        tool.export_history_csv(io::stdout().lock())?;
    }
    Ok(())
}

fn report_save(status: Option<&SaveStatus>, now: DateTime<Utc>) {
    match status {
        Some(SaveStatus::Saved { at }) => {
            println!("- Draft autosaved at {}", at.format("%H:%M:%S%.3f"))
        }
        Some(SaveStatus::Failed { reason }) => println!("- Autosave failed: {reason}"),
        None => println!(
            "- No autosave due at {}",
            now.format("%H:%M:%S%.3f")
        ),
    }
}
