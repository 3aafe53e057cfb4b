use super::COMPLIANCE_CHECKLIST;
use crate::assessment::model::{AnswerOption, QuestionDefinition, QuestionKind, SectionDefinition};
use crate::assessment::questionnaire::QuestionnaireDefinition;
use crate::assessment::recommendations::{Condition, Priority, RecommendationRule};
use crate::assessment::scoring::{
    Band, BandTable, BlendRatio, Contribution, DimensionDefinition, MetricDefinition, Polarity,
    ScoreTable, ScoringConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Mandatory,
    Conditional,
    Recommended,
}

struct Requirement {
    id: &'static str,
    tier: Tier,
    prompt: &'static str,
}

const fn requirement(id: &'static str, tier: Tier, prompt: &'static str) -> Requirement {
    Requirement { id, tier, prompt }
}

/// Requirements grouped by governance step.
const STEPS: [(&str, &str, &[Requirement]); 6] = [
    (
        "use-case",
        "Step 1: Use Case Assessment",
        &[
            requirement("uc_purpose_documented", Tier::Mandatory, "Purpose and intended uses of the synthetic data are documented"),
            requirement("uc_suitability_assessed", Tier::Mandatory, "Suitability of synthetic data for the use case has been assessed"),
            requirement("uc_stakeholders_consulted", Tier::Recommended, "Data custodians and affected stakeholders have been consulted"),
        ],
    ),
    (
        "source-data",
        "Step 2: Assess Source Data",
        &[
            requirement("sd_authority_confirmed", Tier::Mandatory, "Legal authority to use the source data has been confirmed"),
            requirement("sd_sensitivity_classified", Tier::Mandatory, "Sensitivity of the source data has been classified"),
            requirement("sd_consent_reviewed", Tier::Conditional, "Consent terms have been reviewed where data was collected under consent"),
        ],
    ),
    (
        "generation",
        "Step 3: Generate Synthetic Data",
        &[
            requirement("gen_method_documented", Tier::Mandatory, "Generation method and parameters are documented"),
            requirement("gen_privacy_mechanism", Tier::Conditional, "Formal privacy mechanisms are applied where the release is external"),
            requirement("gen_quality_evaluated", Tier::Recommended, "Synthetic data quality has been evaluated against the source"),
        ],
    ),
    (
        "risk-assessment",
        "Step 4: Assess Re-identification Risks",
        &[
            requirement("risk_assessment_completed", Tier::Mandatory, "A re-identification risk assessment has been completed"),
            requirement("risk_expert_review", Tier::Conditional, "An independent expert has reviewed high-risk releases"),
            requirement("risk_attack_testing", Tier::Recommended, "Simulated attacks have been run against the synthetic data"),
        ],
    ),
    (
        "residual-risk",
        "Step 5: Manage Residual Risks",
        &[
            requirement("residual_controls_applied", Tier::Mandatory, "Controls for residual risks are in place"),
            requirement("residual_sharing_agreement", Tier::Conditional, "Sharing agreements are signed where data leaves the organisation"),
            requirement("residual_monitoring_plan", Tier::Recommended, "A plan exists to monitor for emerging risks"),
        ],
    ),
    (
        "governance",
        "Cross-cutting Governance",
        &[
            requirement("gov_accountability_assigned", Tier::Mandatory, "Accountability for the synthetic data asset is assigned"),
            requirement("gov_records_kept", Tier::Recommended, "Decisions and assessments are recorded for audit"),
            requirement("gov_training_completed", Tier::Recommended, "Staff handling the data have completed privacy training"),
        ],
    ),
];

fn requirement_question(requirement: &Requirement) -> QuestionDefinition {
    let mut options = vec![
        AnswerOption::new("complete", "Complete"),
        AnswerOption::new("pending", "Not yet complete"),
    ];
    if requirement.tier != Tier::Mandatory {
        options.push(AnswerOption::unassessed("not-applicable", "Not applicable"));
    }
    QuestionDefinition::new(requirement.id, QuestionKind::SingleChoice, requirement.prompt)
        .with_options(options)
}

fn completion_table() -> ScoreTable {
    ScoreTable::categorical([
        ("complete", Contribution::Points(100)),
        ("pending", Contribution::Points(0)),
    ])
}

/// Each tier scores its completion percentage; the overall score weights
/// tiers by their requirement counts so it tracks total completion.
fn tier_dimension(tier: Tier, id: &str, label: &str) -> DimensionDefinition {
    let metrics: Vec<MetricDefinition> = STEPS
        .iter()
        .flat_map(|(_, _, requirements)| requirements.iter())
        .filter(|requirement| requirement.tier == tier)
        .map(|requirement| MetricDefinition::new(requirement.id, completion_table()))
        .collect();
    DimensionDefinition {
        id: id.into(),
        label: label.to_string(),
        weight: metrics.len() as f64,
        metrics,
    }
}

/// Framework compliance checklist: completion of mandatory, conditional and
/// recommended requirements across the governance steps.
pub fn compliance_checklist() -> QuestionnaireDefinition {
    let sections = STEPS
        .iter()
        .map(|(id, title, requirements)| {
            SectionDefinition::new(id, title, requirements.iter().map(requirement_question).collect())
        })
        .collect();

    let scoring = ScoringConfig {
        dimensions: vec![
            tier_dimension(Tier::Mandatory, "mandatory", "Mandatory Requirements"),
            tier_dimension(Tier::Conditional, "conditional", "Conditional Requirements"),
            tier_dimension(Tier::Recommended, "recommended", "Recommended Requirements"),
        ],
        direct_ratings: Vec::new(),
        blend: BlendRatio::default(),
        bands: BandTable::new(
            Polarity::HigherIsBetter,
            vec![
                Band::new(0, "Not Started", "No applicable requirement has been completed"),
                Band::new(1, "In Progress", "Some requirements remain outstanding"),
                Band::new(100, "Complete", "Every applicable requirement is complete"),
            ],
        ),
    };

    let rules = vec![
        RecommendationRule::new(
            "mandatory-outstanding",
            Priority::High,
            "Mandatory Requirements",
            "Complete the remaining mandatory requirements before implementation",
            "Implementation cannot proceed until every mandatory requirement is met",
            Condition::dimension_below("mandatory", 100),
        ),
        RecommendationRule::new(
            "prepare-implementation",
            Priority::High,
            "Implementation",
            "Prepare for implementation",
            "A strong compliance foundation is in place",
            Condition::OverallAtLeast { threshold: 80 },
        ),
        RecommendationRule::new(
            "conditional-review",
            Priority::Medium,
            "Conditional Requirements",
            "Review the outstanding conditional requirements for applicability",
            "Conditional requirements apply only to some use cases; mark those that do not apply",
            Condition::dimension_below("conditional", 100),
        ),
        RecommendationRule::new(
            "near-completion",
            Priority::Medium,
            "Near Completion",
            "Focus on completing the remaining requirements for full compliance",
            "Strong progress has been made",
            Condition::All {
                conditions: vec![
                    Condition::OverallAtLeast { threshold: 75 },
                    Condition::OverallBelow { threshold: 100 },
                ],
            },
        ),
        RecommendationRule::new(
            "compliance-reviews",
            Priority::Medium,
            "Governance",
            "Schedule regular compliance reviews",
            "Ongoing monitoring keeps the checklist current as projects change",
            Condition::Always,
        ),
        RecommendationRule::new(
            "recommended-outstanding",
            Priority::Low,
            "Recommended Requirements",
            "Consider implementing the remaining recommended requirements",
            "Recommended practices strengthen compliance beyond the minimum",
            Condition::dimension_below("recommended", 100),
        ),
        RecommendationRule::new(
            "implementation-ready",
            Priority::Info,
            "Implementation Ready",
            "Proceed with synthetic data implementation",
            "All applicable requirements are complete",
            Condition::level_in(&["Complete"]),
        ),
    ];

    QuestionnaireDefinition {
        tool: COMPLIANCE_CHECKLIST.into(),
        title: "Synthetic Data Compliance Checklist".to_string(),
        sections,
        scoring,
        rules,
        results_gate: Some(100),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::model::{AnswerSet, AnswerValue};
    use crate::assessment::questionnaire::Questionnaire;

    fn checklist() -> Questionnaire {
        Questionnaire::new(compliance_checklist()).expect("checklist is valid")
    }

    fn all_marked(value: &str) -> AnswerSet {
        STEPS
            .iter()
            .flat_map(|(_, _, requirements)| requirements.iter())
            .map(|requirement| (requirement.id.into(), AnswerValue::choice(value)))
            .collect()
    }

    #[test]
    fn tiers_weight_by_requirement_count() {
        let definition = compliance_checklist();
        let weights: Vec<f64> = definition
            .scoring
            .dimensions
            .iter()
            .map(|dimension| dimension.weight)
            .collect();
        assert_eq!(weights, vec![7.0, 4.0, 6.0]);
        assert_eq!(definition.sections.len(), 6);
    }

    #[test]
    fn mandatory_requirements_cannot_be_waived() {
        let checklist = checklist();
        let err = checklist
            .normalize_answer(&"uc_purpose_documented".into(), AnswerValue::choice("not-applicable"))
            .expect_err("mandatory items have no waiver");
        assert!(err.to_string().contains("not-applicable"));
        assert!(checklist
            .normalize_answer(&"sd_consent_reviewed".into(), AnswerValue::choice("not-applicable"))
            .is_ok());
    }

    #[test]
    fn untouched_checklist_is_not_started() {
        let report = checklist().evaluate(&all_marked("pending"));
        assert_eq!(report.scores.overall.score, 0);
        assert_eq!(report.scores.overall.level(), Some("Not Started"));

        let rules: Vec<&str> = report.recommendations.iter().map(|item| item.rule.as_str()).collect();
        assert_eq!(
            rules,
            vec![
                "mandatory-outstanding",
                "conditional-review",
                "compliance-reviews",
                "recommended-outstanding",
            ]
        );
    }

    #[test]
    fn finished_checklist_is_ready() {
        let answers = all_marked("complete")
            .with("risk_expert_review", AnswerValue::choice("not-applicable"));
        let checklist = checklist();
        let answers = checklist.normalize_answers(answers).expect("valid answers");
        let report = checklist.evaluate(&answers);

        assert_eq!(report.scores.overall.score, 100);
        assert_eq!(report.scores.overall.level(), Some("Complete"));
        let conditional = &report.scores.dimensions[1];
        assert_eq!((conditional.answered_count, conditional.total_metrics), (3, 4));

        let rules: Vec<&str> = report.recommendations.iter().map(|item| item.rule.as_str()).collect();
        assert_eq!(
            rules,
            vec!["prepare-implementation", "compliance-reviews", "implementation-ready"]
        );
    }
}
