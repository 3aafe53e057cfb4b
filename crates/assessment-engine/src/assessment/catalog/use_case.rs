use super::{choice_question, multi_question, USE_CASE_ASSESSMENT};
use crate::assessment::model::SectionDefinition;
use crate::assessment::questionnaire::QuestionnaireDefinition;
use crate::assessment::recommendations::{Condition, Priority, RecommendationRule};
use crate::assessment::scoring::{
    Band, BandTable, BlendRatio, Contribution, DimensionDefinition, MetricDefinition, Polarity,
    ScoreTable, ScoringConfig,
};

/// Points per option. Adjustment-style questions are expressed around the
/// neutral 70 so every metric is a standalone 0-100 reading.
fn points(entries: &[(&'static str, u8)]) -> ScoreTable {
    ScoreTable::categorical(
        entries
            .iter()
            .map(|(option, points)| (*option, Contribution::Points(*points))),
    )
}

fn dimension(id: &str, label: &str, weight: f64, metrics: Vec<MetricDefinition>) -> DimensionDefinition {
    DimensionDefinition {
        id: id.into(),
        label: label.to_string(),
        weight,
        metrics,
    }
}

fn factor_rule(id: &str, dimension: &str, category: &str, action: &str, justification: &str) -> RecommendationRule {
    RecommendationRule::new(
        id,
        Priority::Medium,
        category,
        action,
        justification,
        Condition::dimension_below(dimension, 70),
    )
}

/// Suitability of synthetic data for a proposed use case: higher is better.
pub fn use_case_assessment() -> QuestionnaireDefinition {
    let purpose = SectionDefinition::new(
        "purpose",
        "Purpose and Context",
        vec![
            choice_question(
                "primary_purpose",
                "What is the primary purpose of the synthetic data?",
                &[
                    ("research", "Research"),
                    ("ml_training", "Machine learning training"),
                    ("analytics", "Analytics and reporting"),
                    ("data_sharing", "Data sharing"),
                    ("testing", "Software testing"),
                ],
            ),
            choice_question(
                "organisation_type",
                "What type of organisation is running the project?",
                &[
                    ("research", "Research institution"),
                    ("healthcare", "Healthcare provider"),
                    ("government", "Government agency"),
                    ("industry", "Industry"),
                    ("ngo", "Non-government organisation"),
                ],
            ),
            choice_question(
                "sharing_scope",
                "How widely will the synthetic data be shared?",
                &[
                    ("internal", "Internal only"),
                    ("partners", "Trusted partners"),
                    ("research_community", "Research community"),
                    ("public", "Public release"),
                ],
            ),
        ],
    );

    let data = SectionDefinition::new(
        "data",
        "Data Characteristics",
        vec![
            choice_question(
                "dataset_size",
                "How large is the source dataset?",
                &[
                    ("small", "Small"),
                    ("medium", "Medium"),
                    ("large", "Large"),
                    ("very_large", "Very large"),
                ],
            ),
            multi_question(
                "data_types",
                "Which data types does the source contain?",
                &[
                    ("clinical", "Clinical records"),
                    ("laboratory", "Laboratory results"),
                    ("pharmaceutical", "Pharmaceutical"),
                    ("claims", "Claims and billing"),
                    ("genomics", "Genomics"),
                    ("imaging", "Medical imaging"),
                    ("survey", "Survey responses"),
                    ("wearable", "Wearable device data"),
                ],
            )
            .optional(),
            choice_question(
                "data_sensitivity",
                "How sensitive is the source data?",
                &[
                    ("low", "Low"),
                    ("medium", "Medium"),
                    ("high", "High"),
                    ("very_high", "Very high"),
                ],
            ),
        ],
    );

    let technical = SectionDefinition::new(
        "technical",
        "Technical Requirements",
        vec![
            choice_question(
                "statistical_fidelity",
                "What statistical fidelity does the use case need?",
                &[
                    ("basic", "Basic patterns"),
                    ("moderate", "Moderate"),
                    ("high", "High"),
                    ("exact", "Near exact"),
                ],
            ),
            choice_question(
                "technical_expertise",
                "What synthetic data expertise does the team have?",
                &[
                    ("none", "None"),
                    ("basic", "Basic"),
                    ("advanced", "Advanced"),
                    ("expert", "Expert"),
                ],
            ),
            choice_question(
                "computational_resources",
                "What computational resources are available?",
                &[
                    ("limited", "Limited"),
                    ("moderate", "Moderate"),
                    ("high", "High"),
                ],
            ),
        ],
    );

    let risk = SectionDefinition::new(
        "risk",
        "Risk and Compliance",
        vec![
            choice_question(
                "reidentification_risk",
                "What re-identification risk can the project tolerate?",
                &[
                    ("zero", "Zero"),
                    ("very_low", "Very low"),
                    ("low", "Low"),
                    ("moderate", "Moderate"),
                ],
            ),
            choice_question(
                "ethics_approval",
                "What is the ethics approval status?",
                &[
                    ("yes", "Approved"),
                    ("planned", "Planned"),
                    ("not_required", "Not required"),
                    ("unsure", "Unsure"),
                ],
            ),
            multi_question(
                "privacy_regulations",
                "Which privacy regulations apply?",
                &[
                    ("privacy_act", "Privacy Act"),
                    ("health_records", "Health records legislation"),
                    ("gdpr", "GDPR"),
                    ("hipaa", "HIPAA"),
                    ("unsure", "Unsure"),
                ],
            )
            .optional(),
        ],
    );

    let resources = SectionDefinition::new(
        "resources",
        "Resources and Timeline",
        vec![
            choice_question(
                "project_timeline",
                "How soon is the synthetic data needed?",
                &[
                    ("immediate", "Immediately"),
                    ("short", "Within three months"),
                    ("medium", "Within six months"),
                    ("long", "Longer than six months"),
                ],
            ),
            choice_question(
                "budget",
                "What budget is available?",
                &[
                    ("none", "None"),
                    ("low", "Low"),
                    ("medium", "Medium"),
                    ("high", "High"),
                ],
            ),
            choice_question(
                "ongoing_support",
                "How much ongoing support will the data need?",
                &[
                    ("not_needed", "Not needed"),
                    ("periodic", "Periodic"),
                    ("regular", "Regular"),
                    ("continuous", "Continuous"),
                ],
            ),
        ],
    );

    let scoring = ScoringConfig {
        dimensions: vec![
            dimension(
                "purpose_alignment",
                "Purpose Alignment",
                0.25,
                vec![
                    MetricDefinition::new(
                        "primary_purpose",
                        points(&[
                            ("research", 95),
                            ("ml_training", 90),
                            ("analytics", 85),
                            ("data_sharing", 80),
                            ("testing", 75),
                        ]),
                    ),
                    MetricDefinition::new(
                        "organisation_type",
                        points(&[
                            ("research", 80),
                            ("healthcare", 75),
                            ("government", 70),
                            ("industry", 65),
                            ("ngo", 70),
                        ]),
                    ),
                    MetricDefinition::new(
                        "sharing_scope",
                        points(&[
                            ("internal", 80),
                            ("partners", 75),
                            ("research_community", 70),
                            ("public", 60),
                        ]),
                    ),
                ],
            ),
            dimension(
                "data_characteristics",
                "Data Characteristics",
                0.20,
                vec![
                    MetricDefinition::new(
                        "dataset_size",
                        points(&[("small", 40), ("medium", 70), ("large", 90), ("very_large", 95)]),
                    ),
                    MetricDefinition::new(
                        "data_types",
                        ScoreTable::tally(
                            70,
                            [
                                ("genomics", -10),
                                ("imaging", -10),
                                ("clinical", 5),
                                ("laboratory", 5),
                                ("pharmaceutical", 5),
                                ("claims", 5),
                                ("survey", 10),
                                ("wearable", 10),
                            ],
                        ),
                    ),
                    MetricDefinition::new(
                        "data_sensitivity",
                        points(&[("low", 85), ("medium", 75), ("high", 65), ("very_high", 55)]),
                    ),
                ],
            ),
            dimension(
                "technical_feasibility",
                "Technical Feasibility",
                0.20,
                vec![
                    MetricDefinition::new(
                        "statistical_fidelity",
                        points(&[("basic", 90), ("moderate", 80), ("high", 60), ("exact", 40)]),
                    ),
                    MetricDefinition::new(
                        "technical_expertise",
                        points(&[("none", 30), ("basic", 60), ("advanced", 85), ("expert", 95)]),
                    ),
                    MetricDefinition::new(
                        "computational_resources",
                        points(&[("limited", 55), ("moderate", 70), ("high", 85)]),
                    ),
                ],
            ),
            dimension(
                "risk_compliance",
                "Risk and Compliance",
                0.20,
                vec![
                    MetricDefinition::new(
                        "reidentification_risk",
                        points(&[("zero", 40), ("very_low", 60), ("low", 80), ("moderate", 90)]),
                    ),
                    MetricDefinition::new(
                        "ethics_approval",
                        points(&[("yes", 95), ("planned", 85), ("not_required", 80), ("unsure", 50)]),
                    ),
                    MetricDefinition::new(
                        "privacy_regulations",
                        ScoreTable::tally(70, [("unsure", -20)]),
                    ),
                ],
            ),
            dimension(
                "resource_availability",
                "Resource Availability",
                0.15,
                vec![
                    MetricDefinition::new(
                        "project_timeline",
                        points(&[("immediate", 40), ("short", 60), ("medium", 85), ("long", 95)]),
                    ),
                    MetricDefinition::new(
                        "budget",
                        points(&[("none", 50), ("low", 70), ("medium", 90), ("high", 95)]),
                    ),
                    MetricDefinition::new(
                        "ongoing_support",
                        points(&[
                            ("not_needed", 80),
                            ("periodic", 75),
                            ("regular", 65),
                            ("continuous", 55),
                        ]),
                    ),
                ],
            ),
        ],
        direct_ratings: Vec::new(),
        blend: BlendRatio::default(),
        bands: BandTable::new(
            Polarity::HigherIsBetter,
            vec![
                Band::new(0, "Not Recommended", "Synthetic data is unlikely to meet this use case"),
                Band::new(40, "Limited Suitability", "Fundamental limitations need addressing first"),
                Band::new(55, "Moderately Suitable", "Workable with careful attention to limitations"),
                Band::new(70, "Suitable", "Synthetic data fits this use case with some considerations"),
                Band::new(85, "Highly Suitable", "Synthetic data is a strong fit for this use case"),
            ],
        ),
    };

    let rules = vec![
        RecommendationRule::new(
            "consider-alternatives",
            Priority::High,
            "Suitability",
            "Consider alternative approaches or address fundamental limitations first",
            "Synthetic data may not be the best solution for this use case",
            Condition::level_in(&["Not Recommended", "Limited Suitability"]),
        ),
        RecommendationRule::new(
            "proceed-with-caution",
            Priority::Medium,
            "Suitability",
            "Proceed with caution and plan additional safeguards",
            "Synthetic data may be suitable but its limitations need careful handling",
            Condition::level_in(&["Moderately Suitable"]),
        ),
        RecommendationRule::new(
            "suitable-with-considerations",
            Priority::Low,
            "Suitability",
            "Address the specific considerations to optimise implementation",
            "Synthetic data is suitable for this use case",
            Condition::level_in(&["Suitable"]),
        ),
        RecommendationRule::new(
            "proceed-with-implementation",
            Priority::Info,
            "Suitability",
            "Proceed with implementation through the governance framework",
            "Synthetic data is highly suitable for this use case",
            Condition::level_in(&["Highly Suitable"]),
        ),
        factor_rule(
            "purpose-alignment",
            "purpose_alignment",
            "Purpose Alignment",
            "Confirm synthetic data meets the analytical needs for the intended sharing scope",
            "The stated purpose or sharing scope fits synthetic data less well",
        ),
        factor_rule(
            "data-characteristics",
            "data_characteristics",
            "Data Characteristics",
            "Consider preprocessing, larger samples, or specialised generation techniques",
            "The source data presents challenges for synthetic generation",
        ),
        factor_rule(
            "technical-feasibility",
            "technical_feasibility",
            "Technical Feasibility",
            "Build technical capabilities or partner with experienced organisations",
            "Fidelity needs exceed current expertise or computing capacity",
        ),
        factor_rule(
            "risk-compliance",
            "risk_compliance",
            "Risk and Compliance",
            "Resolve regulatory and ethical requirements before proceeding",
            "Approvals or applicable regulations are not yet settled",
        ),
        factor_rule(
            "resource-availability",
            "resource_availability",
            "Resource Availability",
            "Secure adequate timeline and budget or plan a phased implementation",
            "Quality synthetic data generation needs time and funding",
        ),
        RecommendationRule::new(
            "pilot-testing",
            Priority::Low,
            "Next Steps",
            "Pilot with a small subset of the dataset",
            "A pilot surfaces data and method issues cheaply",
            Condition::Always,
        ),
        RecommendationRule::new(
            "begin-framework",
            Priority::Info,
            "Next Steps",
            "Begin the governance framework with the detailed compliance checklist",
            "The use case is suitable enough to move into formal governance",
            Condition::OverallAtLeast { threshold: 70 },
        ),
    ];

    QuestionnaireDefinition {
        tool: USE_CASE_ASSESSMENT.into(),
        title: "Synthetic Data Use Case Assessment".to_string(),
        sections: vec![purpose, data, technical, risk, resources],
        scoring,
        rules,
        results_gate: None,
    }
}
