use std::sync::Arc;

use chrono::Duration;

use super::common::*;
use crate::assessment::model::{AnswerSet, AnswerValue, AssessmentId, ToolId};
use crate::assessment::persistence::{
    write_history_csv, DraftState, KeyValueStore, MemoryStore, PersistedAssessment,
    PersistenceError, PersistenceManager, PersistenceSettings,
};

fn manager(store: Arc<MemoryStore>) -> PersistenceManager<MemoryStore> {
    PersistenceManager::new(store, ToolId::from("toy"), PersistenceSettings::default())
}

fn record(offset_ms: i64) -> PersistedAssessment {
    let questionnaire = toy(Vec::new());
    let answers = AnswerSet::new().with("a", AnswerValue::choice("good"));
    let created_at = at(offset_ms);
    PersistedAssessment {
        id: AssessmentId::generate(questionnaire.tool(), created_at),
        tool: questionnaire.tool().clone(),
        title: format!("run {offset_ms}"),
        created_at,
        results: questionnaire.score(&answers),
        answers,
        progress_percent: questionnaire.progress_percent(&AnswerSet::new()),
    }
}

#[test]
fn generated_ids_carry_tool_and_millis() {
    let id = AssessmentId::generate(&ToolId::from("quality-metrics"), at(0));
    assert_eq!(id.as_str(), "quality-metrics-1760000000000");
}

#[test]
fn twenty_first_insert_evicts_the_oldest() {
    let store = Arc::new(MemoryStore::new());
    let manager = manager(Arc::clone(&store));

    for index in 0..20 {
        let receipt = manager.save(&record(index * 1_000)).expect("save succeeds");
        assert!(receipt.evicted.is_empty());
    }
    let oldest = record(0).id;

    let receipt = manager.save(&record(20_000)).expect("save succeeds");
    assert_eq!(receipt.evicted, vec![oldest.clone()]);
    assert!(!receipt.replaced);

    let history = manager.history();
    assert_eq!(history.len(), 20);
    assert_eq!(history[0].id, record(20_000).id);
    assert_eq!(history[19].id, record(1_000).id);
    assert!(history.iter().all(|entry| entry.id != oldest));
    assert!(manager.get(&oldest).is_none());
    assert!(!store
        .keys()
        .contains(&format!("toy.history.{oldest}")));
}

#[test]
fn resaving_an_id_replaces_in_place() {
    let store = Arc::new(MemoryStore::new());
    let manager = manager(store);
    let first = record(0);
    manager.save(&first).expect("save");
    manager.save(&record(5_000)).expect("save");

    let mut updated = first.clone();
    updated.title = "renamed".to_string();
    let receipt = manager.save(&updated).expect("resave");

    assert!(receipt.replaced);
    let history = manager.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].id, first.id, "position is preserved");
    assert_eq!(history[1].title, "renamed");
}

#[test]
fn corrupt_entries_are_skipped() {
    let store = Arc::new(MemoryStore::new());
    let manager = manager(Arc::clone(&store));
    manager.save(&record(0)).expect("save");
    manager.save(&record(1_000)).expect("save");

    let damaged = record(0).id;
    store
        .set(&format!("toy.history.{damaged}"), b"{not json")
        .expect("raw write");

    let ids: Vec<String> = store
        .get("toy.history")
        .expect("read")
        .map(|raw| serde_json::from_slice(&raw).expect("index is json"))
        .unwrap_or_default();
    let mut with_ghost = ids.clone();
    with_ghost.push("toy-ghost".to_string());
    store
        .set("toy.history", &serde_json::to_vec(&with_ghost).expect("encode"))
        .expect("raw write");

    let history = manager.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, record(1_000).id);
    assert!(manager.get(&damaged).is_none());
}

#[test]
fn corrupt_index_reads_as_empty_history() {
    let store = Arc::new(MemoryStore::new());
    let manager = manager(Arc::clone(&store));
    store.set("toy.history", b"[[[").expect("raw write");

    assert!(manager.history().is_empty());
    manager.save(&record(0)).expect("save recovers the index");
    assert_eq!(manager.history().len(), 1);
}

#[test]
fn index_read_failure_aborts_writes_without_losing_history() {
    let store = Arc::new(FlakyStore::default());
    let manager = PersistenceManager::new(
        Arc::clone(&store),
        ToolId::from("toy"),
        PersistenceSettings::default(),
    );
    for index in 0..5 {
        manager.save(&record(index * 1_000)).expect("save");
    }

    store.fail_next_read("toy.history");
    let err = manager.save(&record(5_000)).expect_err("index unreadable");
    assert!(matches!(err, PersistenceError::Store(_)));
    assert_eq!(manager.history().len(), 5);
    assert!(manager.get(&record(5_000).id).is_none(), "nothing written");

    store.fail_next_read("toy.history");
    assert!(manager.delete(&record(0).id).is_err());
    store.fail_next_read("toy.history");
    assert!(manager.clear().is_err());
    assert_eq!(manager.history().len(), 5);

    manager.save(&record(5_000)).expect("store recovered");
    assert_eq!(manager.history().len(), 6);
}

#[test]
fn next_id_steps_past_taken_milliseconds() {
    let store = Arc::new(MemoryStore::new());
    let manager = manager(Arc::clone(&store));
    manager.save(&record(0)).expect("save");
    store
        .set(&format!("toy.history.{}", record(1).id), b"orphan")
        .expect("raw write");

    let id = manager.next_id(at(0)).expect("free id");
    assert_eq!(id, record(2).id);
    assert_eq!(manager.next_id(at(10)).expect("free id"), record(10).id);
}

#[test]
fn unreadable_ids_do_not_hold_slots_under_the_cap() {
    let store = Arc::new(MemoryStore::new());
    let manager = PersistenceManager::new(
        Arc::clone(&store),
        ToolId::from("toy"),
        PersistenceSettings {
            history_cap: 3,
            ..PersistenceSettings::default()
        },
    );
    for index in 0..3 {
        manager.save(&record(index * 1_000)).expect("save");
    }
    store
        .delete(&format!("toy.history.{}", record(0).id))
        .expect("raw delete");
    store
        .set(&format!("toy.history.{}", record(1_000).id), b"{broken")
        .expect("raw write");

    let receipt = manager.save(&record(3_000)).expect("save");
    assert!(receipt.evicted.is_empty());
    let ids: Vec<_> = manager.history().into_iter().map(|entry| entry.id).collect();
    assert_eq!(ids, vec![record(3_000).id, record(2_000).id]);

    manager.save(&record(4_000)).expect("save");
    let receipt = manager.save(&record(5_000)).expect("save");
    assert_eq!(receipt.evicted, vec![record(2_000).id]);
    assert_eq!(manager.history().len(), 3);
}

#[test]
fn delete_and_clear_remove_entries_but_not_the_draft() {
    let store = Arc::new(MemoryStore::new());
    let manager = manager(Arc::clone(&store));
    manager.save(&record(0)).expect("save");
    manager.save(&record(1_000)).expect("save");
    manager.save(&record(2_000)).expect("save");
    manager
        .write_draft(&DraftState {
            answers: AnswerSet::new().with("a", AnswerValue::choice("poor")),
            last_saved_at: at(3_000),
            progress_percent: 25,
        })
        .expect("draft");

    assert!(manager.delete(&record(1_000).id).expect("delete"));
    assert!(!manager.delete(&record(1_000).id).expect("second delete"));
    assert_eq!(manager.history().len(), 2);

    assert_eq!(manager.clear().expect("clear"), 2);
    assert!(manager.history().is_empty());
    assert_eq!(store.keys(), vec!["toy.draft".to_string()]);
    assert!(manager.load_draft().is_some());
}

#[test]
fn burst_of_mutations_produces_one_trailing_draft_write() {
    let store = Arc::new(MemoryStore::new());
    let mut manager = manager(Arc::clone(&store));
    let answers = AnswerSet::new().with("a", AnswerValue::choice("good"));

    for offset in [0, 300, 600, 900] {
        manager.schedule_autosave(at(offset));
    }
    assert!(manager.autosave_pending());
    assert_eq!(manager.autosave_deadline(), Some(at(900) + Duration::milliseconds(1_500)));

    assert!(manager
        .flush_autosave(at(2_000), &answers, 25)
        .expect("flush")
        .is_none());

    let draft = manager
        .flush_autosave(at(2_400), &answers, 25)
        .expect("flush")
        .expect("draft written");
    assert!(draft.last_saved_at > at(900));
    assert_eq!(manager.load_draft(), Some(draft));

    assert!(manager
        .flush_autosave(at(9_000), &answers, 25)
        .expect("flush")
        .is_none());
}

#[test]
fn history_exports_as_csv() {
    let store = Arc::new(MemoryStore::new());
    let manager = manager(store);
    manager.save(&record(0)).expect("save");

    let mut buffer = Vec::new();
    write_history_csv(&manager.history(), &mut buffer).expect("csv written");
    let csv = String::from_utf8(buffer).expect("utf8");
    let mut lines = csv.lines();

    assert_eq!(
        lines.next(),
        Some("id,title,created_at,progress_percent,overall_score,level,core,extra")
    );
    let row = lines.next().expect("one row");
    assert!(row.starts_with("toy-1760000000000,run 0,"));
    assert!(row.ends_with(",80,High,80,"));
    assert!(lines.next().is_none());
}
