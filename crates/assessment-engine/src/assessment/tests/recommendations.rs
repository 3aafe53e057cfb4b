use super::common::*;
use crate::assessment::model::{AnswerSet, AnswerValue};
use crate::assessment::questionnaire::{Questionnaire, QuestionnaireError};
use crate::assessment::recommendations::{Condition, Priority, RecommendationRule};

fn rule(id: &str, priority: Priority, category: &str, action: &str, when: Condition) -> RecommendationRule {
    RecommendationRule::new(id, priority, category, action, "because", when)
}

fn rule_ids(questionnaire: &Questionnaire, answers: &AnswerSet) -> Vec<String> {
    questionnaire
        .evaluate(answers)
        .recommendations
        .into_iter()
        .map(|item| item.rule)
        .collect()
}

#[test]
fn output_is_ordered_by_priority_and_stable_within_priority() {
    let questionnaire = toy(vec![
        rule("info", Priority::Info, "Notes", "Keep going", Condition::Always),
        rule("medium-1", Priority::Medium, "Core", "Tune a", Condition::Always),
        rule("critical", Priority::Critical, "Core", "Stop", Condition::Always),
        rule("medium-2", Priority::Medium, "Core", "Tune b", Condition::Always),
        rule("low", Priority::Low, "Notes", "Review", Condition::Always),
        rule("high", Priority::High, "Extra", "Fix d", Condition::Always),
    ]);

    assert_eq!(
        rule_ids(&questionnaire, &AnswerSet::new()),
        vec!["critical", "high", "medium-1", "medium-2", "low", "info"]
    );
}

#[test]
fn exact_duplicates_are_suppressed_but_near_duplicates_kept() {
    let questionnaire = toy(vec![
        rule("first", Priority::High, "Core", "Tune generator", Condition::Always),
        rule("second", Priority::Medium, "Core", "Tune generator", Condition::Always),
        rule("third", Priority::Medium, "Core", "Tune generator.", Condition::Always),
    ]);

    assert_eq!(
        rule_ids(&questionnaire, &AnswerSet::new()),
        vec!["first", "third"]
    );
}

#[test]
fn rules_on_unassessed_dimensions_do_not_fire() {
    let questionnaire = toy(vec![
        rule("core-low", Priority::High, "Core", "Raise core", Condition::dimension_below("core", 70)),
        rule(
            "core-not-low",
            Priority::Low,
            "Core",
            "Keep core",
            Condition::Not {
                condition: Box::new(Condition::dimension_below("core", 70)),
            },
        ),
        rule(
            "extra-low",
            Priority::High,
            "Extra",
            "Raise extra",
            Condition::dimension_below("extra", 70),
        ),
    ]);
    let answers = AnswerSet::new().with("d", AnswerValue::choice("poor"));

    assert_eq!(rule_ids(&questionnaire, &answers), vec!["extra-low"]);
}

#[test]
fn missing_precondition_propagates_through_combinators() {
    let unassessed_core = Condition::dimension_below("core", 70);
    let questionnaire = toy(vec![
        rule(
            "all",
            Priority::High,
            "A",
            "all",
            Condition::All {
                conditions: vec![Condition::Always, unassessed_core.clone()],
            },
        ),
        rule(
            "any-true",
            Priority::High,
            "B",
            "any",
            Condition::Any {
                conditions: vec![unassessed_core.clone(), Condition::Always],
            },
        ),
        rule(
            "any-missing",
            Priority::High,
            "C",
            "any missing",
            Condition::Any {
                conditions: vec![
                    unassessed_core,
                    Condition::Not {
                        condition: Box::new(Condition::Always),
                    },
                ],
            },
        ),
        rule(
            "unanswered",
            Priority::Low,
            "D",
            "answer notes",
            Condition::Unanswered {
                question: "notes".into(),
            },
        ),
    ]);

    assert_eq!(
        rule_ids(&questionnaire, &AnswerSet::new()),
        vec!["any-true", "unanswered"]
    );
}

#[test]
fn answer_rules_require_the_answer_to_exist() {
    let questionnaire = toy(vec![
        rule(
            "a-poor",
            Priority::Medium,
            "Core",
            "Revisit a",
            Condition::answer_equals("a", "poor"),
        ),
        rule(
            "any-poor",
            Priority::Medium,
            "Core",
            "Revisit metrics",
            Condition::any_answer_equals(&["a", "b", "c"], "poor"),
        ),
        rule(
            "notes",
            Priority::High,
            "Notes",
            "Follow up notes",
            Condition::text_provided("notes"),
        ),
    ]);

    assert!(rule_ids(&questionnaire, &AnswerSet::new()).is_empty());

    let answers = AnswerSet::new()
        .with("b", AnswerValue::choice("poor"))
        .with("notes", AnswerValue::text("  drift in tails  "));
    assert_eq!(rule_ids(&questionnaire, &answers), vec!["notes", "any-poor"]);
}

#[test]
fn quality_poor_assessment_surfaces_critical_items_first() {
    let questionnaire = quality();
    let answers = quality_answers("poor").with("quality_issues", AnswerValue::text("Tails collapsed"));

    let report = questionnaire.evaluate(&answers);
    let priorities: Vec<Priority> = report.recommendations.iter().map(|item| item.priority).collect();
    let mut sorted = priorities.clone();
    sorted.sort();
    assert_eq!(priorities, sorted);

    let rules: Vec<&str> = report
        .recommendations
        .iter()
        .map(|item| item.rule.as_str())
        .collect();
    assert_eq!(
        rules,
        vec![
            "privacy-below-target",
            "generation-review",
            "fidelity-below-target",
            "utility-below-target",
            "targeted-improvements",
            "reported-issues",
            "core-statistics-poor",
            "quality-monitoring",
            "weak-dimensions",
            "poor-metrics",
        ]
    );
}

#[test]
fn quality_excellent_assessment_reports_strengths() {
    let questionnaire = quality();
    let report = questionnaire.evaluate(&quality_answers("excellent"));

    let rules: Vec<&str> = report
        .recommendations
        .iter()
        .map(|item| item.rule.as_str())
        .collect();
    assert_eq!(
        rules,
        vec![
            "quality-monitoring",
            "fidelity-strength",
            "utility-strength",
            "privacy-strength",
            "excellent-metrics",
        ]
    );
}

#[test]
fn excellent_metrics_count_needs_more_than_three() {
    let questionnaire = quality();
    let three = quality_answers("good")
        .with("mean_preservation", AnswerValue::choice("excellent"))
        .with("variance_preservation", AnswerValue::choice("excellent"))
        .with("range_preservation", AnswerValue::choice("excellent"));
    let fired = |answers: &AnswerSet| {
        questionnaire
            .evaluate(answers)
            .recommendations
            .iter()
            .any(|item| item.rule == "excellent-metrics")
    };
    assert!(!fired(&three));

    let four = three.with("interactions", AnswerValue::choice("excellent"));
    assert!(fired(&four));
    assert!(!fired(&AnswerSet::new()), "no answers, no finding");
}

#[test]
fn risk_rules_follow_safeguard_answers() {
    let questionnaire = risk();

    let high = questionnaire.evaluate(&high_risk_answers());
    let rules: Vec<&str> = high
        .recommendations
        .iter()
        .map(|item| item.rule.as_str())
        .collect();
    assert_eq!(
        rules,
        vec![
            "project-viability",
            "formal-guarantees",
            "layered-mechanisms",
            "harm-review",
            "controlled-access",
            "infrastructure-security",
            "risk-review-cadence",
        ]
    );

    let low = questionnaire.evaluate(&low_risk_answers());
    let rules: Vec<&str> = low
        .recommendations
        .iter()
        .map(|item| item.rule.as_str())
        .collect();
    assert_eq!(rules, vec!["risk-review-cadence"]);
}

#[test]
fn rules_referencing_unknown_ids_are_rejected() {
    let unknown_dimension = toy_definition(vec![rule(
        "ghost",
        Priority::Low,
        "Ghost",
        "Haunt",
        Condition::dimension_below("ghost", 50),
    )]);
    assert!(matches!(
        Questionnaire::new(unknown_dimension),
        Err(QuestionnaireError::UnknownRuleDimension { .. })
    ));

    let unknown_level = toy_definition(vec![rule(
        "level",
        Priority::Low,
        "Level",
        "Check",
        Condition::level_in(&["Legendary"]),
    )]);
    assert!(matches!(
        Questionnaire::new(unknown_level),
        Err(QuestionnaireError::UnknownRuleLevel { .. })
    ));

    let duplicate = toy_definition(vec![
        rule("same", Priority::Low, "A", "a", Condition::Always),
        rule("same", Priority::Low, "B", "b", Condition::Always),
    ]);
    assert!(matches!(
        Questionnaire::new(duplicate),
        Err(QuestionnaireError::DuplicateRule(_))
    ));
}
