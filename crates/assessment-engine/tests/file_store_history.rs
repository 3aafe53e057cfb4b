use std::fs;
use std::sync::Arc;

use assessment_engine::assessment::{
    AnswerValue, AssessmentTool, Catalog, FileStore, PersistenceManager, PersistenceSettings,
    QuestionId, ToolId, QUALITY_METRICS,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 3, 14, 30, 0)
        .single()
        .expect("valid start time")
}

fn quality_tool(store: Arc<FileStore>) -> AssessmentTool<FileStore> {
    let catalog = Catalog::standard().expect("catalog loads");
    let questionnaire = Arc::clone(
        catalog
            .get(&ToolId::from(QUALITY_METRICS))
            .expect("quality metrics registered"),
    );
    AssessmentTool::new(questionnaire, store, PersistenceSettings::default())
}

#[test]
fn history_survives_a_new_process() {
    let dir = TempDir::new().expect("tempdir");
    let now = start();

    let saved = {
        let mut tool = quality_tool(Arc::new(FileStore::new(dir.path())));
        tool.answer(
            &QuestionId::from("mean_preservation"),
            AnswerValue::choice("excellent"),
            now,
        )
        .expect("answer accepted");
        tool.answer(
            &QuestionId::from("privacy_level"),
            AnswerValue::choice("good"),
            now,
        )
        .expect_err("unknown question rejected");
        tool.tick(now + Duration::seconds(2));
        tool.save_to_history(now + Duration::seconds(3), Some("baseline"))
            .expect("saved to disk")
    };

    let mut tool = quality_tool(Arc::new(FileStore::new(dir.path())));
    let draft = tool.resume().expect("draft on disk");
    assert_eq!(draft.answers.len(), 1);

    let history = tool.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, saved.id);
    assert_eq!(history[0].title, "baseline");

    let loaded = tool
        .load_from_history(&saved.id, now + Duration::minutes(1))
        .expect("entry readable");
    assert!(loaded.snapshot_matches);
    assert!(loaded.report.is_none(), "partial answers cannot be computed");
}

#[test]
fn damaged_files_are_skipped_not_fatal() {
    let dir = TempDir::new().expect("tempdir");
    let store = Arc::new(FileStore::new(dir.path()));
    let now = start();

    let mut tool = quality_tool(Arc::clone(&store));
    tool.answer(
        &QuestionId::from("variance_preservation"),
        AnswerValue::choice("good"),
        now,
    )
    .expect("answer accepted");
    let first = tool.save_to_history(now, None).expect("saved");
    tool.restart();
    tool.answer(
        &QuestionId::from("variance_preservation"),
        AnswerValue::choice("poor"),
        now + Duration::seconds(10),
    )
    .expect("answer accepted");
    let second = tool
        .save_to_history(now + Duration::seconds(10), None)
        .expect("saved");

    let damaged = dir
        .path()
        .join(format!("{QUALITY_METRICS}.history.{}.json", first.id));
    assert!(damaged.exists());
    fs::write(&damaged, "{\"id\": truncated").expect("overwrite entry");

    let manager = PersistenceManager::new(
        Arc::clone(&store),
        ToolId::from(QUALITY_METRICS),
        PersistenceSettings::default(),
    );
    let history = manager.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, second.id);
    assert!(manager.get(&first.id).is_none());

    assert!(manager.delete(&first.id).expect("delete damaged entry"));
    assert!(!damaged.exists());
}
