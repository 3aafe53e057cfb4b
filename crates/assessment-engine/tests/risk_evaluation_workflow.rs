use std::sync::Arc;

use assessment_engine::assessment::catalog::risk_evaluation;
use assessment_engine::assessment::{
    AnswerSet, AnswerValue, AssessmentSession, Catalog, NavigationError, NavigationState,
    Polarity, Priority, Questionnaire, ScoreBasis, ToolId, RISK_EVALUATION,
};

fn moderate_answers() -> AnswerSet {
    AnswerSet::new()
        .with("sensitive_data", AnswerValue::choices(["health", "location"]))
        .with("dataset_size", AnswerValue::choice("medium"))
        .with("population_rarity", AnswerValue::choice("somewhat-rare"))
        .with("synthetic_method", AnswerValue::choice("machine-learning"))
        .with("privacy_mechanisms", AnswerValue::choices(["k-anonymity"]))
        .with("access_control", AnswerValue::choice("approved"))
        .with(
            "security_measures",
            AnswerValue::choices(["encryption", "audit-logging"]),
        )
        .with("attacker_capability", AnswerValue::choice("skilled"))
        .with("linkage_risk", AnswerValue::choice("medium"))
        .with("membership_risk", AnswerValue::choice("medium"))
        .with("attribute_risk", AnswerValue::choice("low"))
        .with("inversion_risk", AnswerValue::choice("low"))
        .with("privacy_impact", AnswerValue::choice("medium"))
        .with("discrimination_impact", AnswerValue::choice("low"))
        .with("social_impact", AnswerValue::choice("low"))
}

#[test]
fn moderate_risk_profile_is_classified_medium() {
    let catalog = Catalog::standard().expect("catalog loads");
    let questionnaire = catalog
        .get(&ToolId::from(RISK_EVALUATION))
        .expect("risk evaluation registered");

    let report = questionnaire.evaluate(&moderate_answers());
    let overall = &report.scores.overall;

    assert_eq!(overall.polarity, Polarity::HigherIsWorse);
    assert_eq!(overall.basis, ScoreBasis::Itemized);
    // exposure 28, safeguards 51, attack 24, harm 20
    assert_eq!(overall.score, 31);
    assert_eq!(overall.level(), Some("Medium"));

    let rules: Vec<&str> = report
        .recommendations
        .iter()
        .map(|item| item.rule.as_str())
        .collect();
    assert_eq!(
        rules,
        vec![
            "layered-mechanisms",
            "infrastructure-security",
            "risk-review-cadence"
        ]
    );
    assert_eq!(report.recommendations[0].priority, Priority::High);
}

#[test]
fn risk_results_need_every_required_answer() {
    let questionnaire = Arc::new(Questionnaire::new(risk_evaluation()).expect("valid"));
    let mut session = AssessmentSession::new(Arc::clone(&questionnaire));

    let mut answers = moderate_answers();
    answers.remove(&"sensitive_data".into());
    session.replace_answers(answers);
    assert_eq!(session.state(), NavigationState::Section { index: 0 });

    session
        .set_answer(&"sensitive_data".into(), AnswerValue::choices(["health"]))
        .expect("accepted");
    while session.advance().is_ok() {}
    assert!(session.can_compute());

    session
        .set_answer(&"sensitive_data".into(), AnswerValue::choices(Vec::<&str>::new()))
        .expect("empty selection clears");
    assert_eq!(
        session.compute().expect_err("gate is 100%"),
        NavigationError::BelowResultsGate {
            progress: 93,
            gate: 100
        }
    );
}
