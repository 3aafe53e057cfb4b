use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::assessment::catalog::{quality_metrics, risk_evaluation};
use crate::assessment::model::{
    AnswerOption, AnswerSet, AnswerValue, QuestionDefinition, QuestionKind, SectionDefinition,
};
use crate::assessment::persistence::{KeyValueStore, MemoryStore, StoreError};
use crate::assessment::questionnaire::{Questionnaire, QuestionnaireDefinition};
use crate::assessment::recommendations::RecommendationRule;
use crate::assessment::scoring::{
    Band, BandTable, BlendRatio, DimensionDefinition, MetricDefinition, Polarity, ScoreTable,
    ScoringConfig,
};

pub(super) fn at(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_760_000_000_000 + millis)
        .single()
        .expect("valid timestamp")
}

pub(super) fn rated(id: &str) -> QuestionDefinition {
    QuestionDefinition::new(id, QuestionKind::SingleChoice, id).with_options(vec![
        AnswerOption::new("excellent", "Excellent"),
        AnswerOption::new("good", "Good"),
        AnswerOption::new("acceptable", "Acceptable"),
        AnswerOption::new("poor", "Poor"),
        AnswerOption::unassessed("not-assessed", "Not assessed"),
    ])
}

pub(super) fn dimension(id: &str, weight: f64, metrics: &[&str]) -> DimensionDefinition {
    DimensionDefinition {
        id: id.into(),
        label: id.to_string(),
        weight,
        metrics: metrics
            .iter()
            .map(|metric| MetricDefinition::new(metric, ScoreTable::FourTier))
            .collect(),
    }
}

pub(super) fn three_bands() -> BandTable {
    BandTable::new(
        Polarity::HigherIsBetter,
        vec![
            Band::new(0, "Low", "Needs work"),
            Band::new(50, "Mid", "Adequate"),
            Band::new(80, "High", "Strong"),
        ],
    )
}

/// Two sections: `basics` (a, b, c) and `wrap-up` (d plus optional notes).
pub(super) fn toy_definition(rules: Vec<RecommendationRule>) -> QuestionnaireDefinition {
    QuestionnaireDefinition {
        tool: "toy".into(),
        title: "Toy".to_string(),
        sections: vec![
            SectionDefinition::new("basics", "Basics", vec![rated("a"), rated("b"), rated("c")]),
            SectionDefinition::new(
                "wrap-up",
                "Wrap up",
                vec![
                    rated("d"),
                    QuestionDefinition::new("notes", QuestionKind::FreeText, "Notes").optional(),
                ],
            ),
        ],
        scoring: ScoringConfig {
            dimensions: vec![
                dimension("core", 1.0, &["a", "b", "c"]),
                dimension("extra", 1.0, &["d"]),
            ],
            direct_ratings: Vec::new(),
            blend: BlendRatio::default(),
            bands: three_bands(),
        },
        rules,
        results_gate: None,
    }
}

pub(super) fn toy(rules: Vec<RecommendationRule>) -> Arc<Questionnaire> {
    Arc::new(Questionnaire::new(toy_definition(rules)).expect("toy questionnaire is valid"))
}

pub(super) fn quality() -> Arc<Questionnaire> {
    Arc::new(Questionnaire::new(quality_metrics()).expect("quality metrics is valid"))
}

pub(super) fn risk() -> Arc<Questionnaire> {
    Arc::new(Questionnaire::new(risk_evaluation()).expect("risk evaluation is valid"))
}

/// Every question in the quality-metrics tool rated `tier`.
pub(super) fn quality_answers(tier: &str) -> AnswerSet {
    let questionnaire = quality();
    questionnaire
        .sections()
        .iter()
        .flat_map(|section| section.questions.iter())
        .filter(|question| question.kind == QuestionKind::SingleChoice)
        .map(|question| (question.id.clone(), AnswerValue::choice(tier)))
        .collect()
}

pub(super) fn low_risk_answers() -> AnswerSet {
    AnswerSet::new()
        .with("sensitive_data", AnswerValue::choices(["demographic"]))
        .with("dataset_size", AnswerValue::choice("very-large"))
        .with("population_rarity", AnswerValue::choice("common"))
        .with("synthetic_method", AnswerValue::choice("statistical"))
        .with(
            "privacy_mechanisms",
            AnswerValue::choices(["differential-privacy", "k-anonymity", "noise-addition"]),
        )
        .with("access_control", AnswerValue::choice("internal-only"))
        .with(
            "security_measures",
            AnswerValue::choices([
                "encryption",
                "audit-logging",
                "multi-factor",
                "network-isolation",
                "intrusion-detection",
                "data-loss-prevention",
            ]),
        )
        .with("attacker_capability", AnswerValue::choice("casual"))
        .with("linkage_risk", AnswerValue::choice("low"))
        .with("membership_risk", AnswerValue::choice("low"))
        .with("attribute_risk", AnswerValue::choice("low"))
        .with("inversion_risk", AnswerValue::choice("low"))
        .with("privacy_impact", AnswerValue::choice("low"))
        .with("discrimination_impact", AnswerValue::choice("low"))
        .with("social_impact", AnswerValue::choice("low"))
}

pub(super) fn high_risk_answers() -> AnswerSet {
    AnswerSet::new()
        .with(
            "sensitive_data",
            AnswerValue::choices(["health", "genetic", "biometric", "criminal", "minors"]),
        )
        .with("dataset_size", AnswerValue::choice("very-small"))
        .with("population_rarity", AnswerValue::choice("extremely-rare"))
        .with("synthetic_method", AnswerValue::choice("deep-learning"))
        .with("privacy_mechanisms", AnswerValue::choices(["none"]))
        .with("access_control", AnswerValue::choice("public"))
        .with("attacker_capability", AnswerValue::choice("state"))
        .with("linkage_risk", AnswerValue::choice("very-high"))
        .with("membership_risk", AnswerValue::choice("very-high"))
        .with("attribute_risk", AnswerValue::choice("very-high"))
        .with("inversion_risk", AnswerValue::choice("very-high"))
        .with("privacy_impact", AnswerValue::choice("severe"))
        .with("discrimination_impact", AnswerValue::choice("severe"))
        .with("social_impact", AnswerValue::choice("severe"))
}

/// Memory store that counts writes.
#[derive(Default)]
pub(super) struct CountingStore {
    inner: MemoryStore,
    writes: AtomicUsize,
}

impl CountingStore {
    pub(super) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub(super) fn raw(&self) -> &MemoryStore {
        &self.inner
    }
}

impl KeyValueStore for CountingStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key)
    }
}

/// Store whose every operation fails, like a disabled or full browser store.
pub(super) struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Err(StoreError::Unavailable("storage disabled".to_string()))
    }

    fn set(&self, key: &str, _value: &[u8]) -> Result<(), StoreError> {
        Err(StoreError::QuotaExceeded {
            key: key.to_string(),
        })
    }

    fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("storage disabled".to_string()))
    }
}

/// Memory store that fails the next read of one chosen key.
#[derive(Default)]
pub(super) struct FlakyStore {
    inner: MemoryStore,
    fail_next_get: Mutex<Option<String>>,
}

impl FlakyStore {
    pub(super) fn fail_next_read(&self, key: &str) {
        if let Ok(mut slot) = self.fail_next_get.lock() {
            *slot = Some(key.to_string());
        }
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut slot = self.fail_next_get.lock().expect("flaky store lock");
        if slot.as_deref() == Some(key) {
            *slot = None;
            return Err(StoreError::Unavailable(format!("transient read failure on {key}")));
        }
        drop(slot);
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key)
    }
}
