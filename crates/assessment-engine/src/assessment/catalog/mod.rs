mod compliance;
mod use_case;

pub use compliance::compliance_checklist;
pub use use_case::use_case_assessment;

use std::collections::BTreeMap;
use std::sync::Arc;

use super::model::{AnswerOption, QuestionDefinition, QuestionKind, SectionDefinition, ToolId};
use super::questionnaire::{Questionnaire, QuestionnaireDefinition, QuestionnaireError};
use super::recommendations::{Condition, Priority, RecommendationRule};
use super::scoring::{
    Band, BandTable, BlendRatio, Contribution, DimensionDefinition, DirectRating,
    MetricDefinition, Polarity, ScoreTable, ScoringConfig,
};

pub const QUALITY_METRICS: &str = "quality-metrics";
pub const RISK_EVALUATION: &str = "risk-evaluation";
pub const COMPLIANCE_CHECKLIST: &str = "compliance-checklist";
pub const USE_CASE_ASSESSMENT: &str = "use-case-assessment";

/// Validated questionnaires keyed by tool id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tools: BTreeMap<ToolId, Arc<Questionnaire>>,
}

impl Catalog {
    /// The built-in tools. Fails only if a shipped definition is inconsistent.
    pub fn standard() -> Result<Self, QuestionnaireError> {
        let mut catalog = Self::default();
        for definition in [
            quality_metrics(),
            risk_evaluation(),
            compliance_checklist(),
            use_case_assessment(),
        ] {
            catalog.insert(Questionnaire::new(definition)?);
        }
        Ok(catalog)
    }

    /// Add or replace a tool.
    pub fn insert(&mut self, questionnaire: Questionnaire) -> Option<Arc<Questionnaire>> {
        self.tools
            .insert(questionnaire.tool().clone(), Arc::new(questionnaire))
    }

    pub fn get(&self, tool: &ToolId) -> Option<&Arc<Questionnaire>> {
        self.tools.get(tool)
    }

    pub fn tools(&self) -> impl Iterator<Item = &Arc<Questionnaire>> {
        self.tools.values()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn four_tier_question(id: &str, prompt: &str, sentinels: &[(&str, &str)]) -> QuestionDefinition {
    let mut options = vec![
        AnswerOption::new("excellent", "Excellent"),
        AnswerOption::new("good", "Good"),
        AnswerOption::new("acceptable", "Acceptable"),
        AnswerOption::new("poor", "Poor"),
    ];
    options.extend(
        sentinels
            .iter()
            .map(|(value, label)| AnswerOption::unassessed(*value, *label)),
    );
    QuestionDefinition::new(id, QuestionKind::SingleChoice, prompt).with_options(options)
}

fn choice_question(id: &str, prompt: &str, options: &[(&str, &str)]) -> QuestionDefinition {
    QuestionDefinition::new(id, QuestionKind::SingleChoice, prompt).with_options(
        options
            .iter()
            .map(|(value, label)| AnswerOption::new(*value, *label))
            .collect(),
    )
}

fn multi_question(id: &str, prompt: &str, options: &[(&str, &str)]) -> QuestionDefinition {
    QuestionDefinition::new(id, QuestionKind::MultiChoice, prompt).with_options(
        options
            .iter()
            .map(|(value, label)| AnswerOption::new(*value, *label))
            .collect(),
    )
}

fn four_tier_metrics(ids: &[&str]) -> Vec<MetricDefinition> {
    ids.iter()
        .map(|id| MetricDefinition::new(id, ScoreTable::FourTier))
        .collect()
}

const NOT_ASSESSED: (&str, &str) = ("not-assessed", "Not assessed");
const NOT_APPLICABLE: (&str, &str) = ("not-applicable", "Not applicable");
const NOT_IMPLEMENTED: (&str, &str) = ("not-implemented", "Not implemented");

const FIDELITY_METRICS: [&str; 9] = [
    "mean_preservation",
    "variance_preservation",
    "distribution_shape",
    "outlier_preservation",
    "range_preservation",
    "correlation_accuracy",
    "covariance_matrix",
    "conditional_distributions",
    "interactions",
];

const UTILITY_METRICS: [&str; 6] = [
    "analysis_accuracy",
    "model_performance",
    "feature_importance",
    "clinical_patterns",
    "epidemiological_measures",
    "temporal_patterns",
];

const PRIVACY_METRICS: [&str; 6] = [
    "membership_inference",
    "record_similarity",
    "attribute_inference",
    "sensitive_correlations",
    "differential_privacy",
    "privacy_budget",
];

fn all_quality_metrics() -> Vec<&'static str> {
    FIDELITY_METRICS
        .iter()
        .chain(&UTILITY_METRICS)
        .chain(&PRIVACY_METRICS)
        .copied()
        .collect()
}

/// Synthetic data quality: higher scores are better.
pub fn quality_metrics() -> QuestionnaireDefinition {
    let fidelity = SectionDefinition::new(
        "statistical-fidelity",
        "Statistical Fidelity",
        vec![
            four_tier_question("mean_preservation", "How well are variable means preserved?", &[NOT_ASSESSED]),
            four_tier_question("variance_preservation", "How well are variances preserved?", &[NOT_ASSESSED]),
            four_tier_question("distribution_shape", "How closely do marginal distributions match?", &[NOT_ASSESSED]),
            four_tier_question("outlier_preservation", "Are outliers represented realistically?", &[NOT_ASSESSED]),
            four_tier_question("range_preservation", "Are value ranges preserved?", &[NOT_ASSESSED]),
            four_tier_question("correlation_accuracy", "How accurate are pairwise correlations?", &[NOT_ASSESSED]),
            four_tier_question("covariance_matrix", "How close is the covariance structure?", &[NOT_ASSESSED]),
            four_tier_question("conditional_distributions", "Are conditional distributions preserved?", &[NOT_ASSESSED]),
            four_tier_question("interactions", "Are multi-variable interactions preserved?", &[NOT_ASSESSED]),
        ],
    );

    let utility = SectionDefinition::new(
        "utility-preservation",
        "Utility Preservation",
        vec![
            four_tier_question("analysis_accuracy", "Do planned analyses reproduce source results?", &[NOT_ASSESSED, NOT_APPLICABLE]),
            four_tier_question("model_performance", "How do models trained on synthetic data perform?", &[NOT_ASSESSED, NOT_APPLICABLE]),
            four_tier_question("feature_importance", "Is feature importance ranking preserved?", &[NOT_ASSESSED, NOT_APPLICABLE]),
            four_tier_question("clinical_patterns", "Are clinically meaningful patterns preserved?", &[NOT_ASSESSED, NOT_APPLICABLE]).optional(),
            four_tier_question("epidemiological_measures", "Are epidemiological measures reproduced?", &[NOT_ASSESSED, NOT_APPLICABLE]).optional(),
            four_tier_question("temporal_patterns", "Are temporal patterns preserved?", &[NOT_ASSESSED, NOT_APPLICABLE]).optional(),
        ],
    );

    let privacy_sentinels = [NOT_ASSESSED, NOT_APPLICABLE, NOT_IMPLEMENTED];
    let privacy = SectionDefinition::new(
        "privacy-protection",
        "Privacy Protection",
        vec![
            four_tier_question("membership_inference", "Resistance to membership inference attacks?", &privacy_sentinels),
            four_tier_question("record_similarity", "Distance between synthetic and real records?", &privacy_sentinels),
            four_tier_question("attribute_inference", "Resistance to attribute inference attacks?", &privacy_sentinels),
            four_tier_question("sensitive_correlations", "Are sensitive correlations protected?", &privacy_sentinels).optional(),
            four_tier_question("differential_privacy", "Strength of differential privacy guarantees?", &privacy_sentinels).optional(),
            four_tier_question("privacy_budget", "Is the privacy budget managed appropriately?", &privacy_sentinels).optional(),
        ],
    );

    let overall = SectionDefinition::new(
        "overall-evaluation",
        "Overall Evaluation",
        vec![
            four_tier_question("overall_fidelity", "Overall rating of statistical fidelity", &[]),
            four_tier_question("overall_utility", "Overall rating of utility", &[]),
            four_tier_question("overall_privacy", "Overall rating of privacy protection", &[]),
            QuestionDefinition::new(
                "quality_issues",
                QuestionKind::FreeText,
                "Describe any specific quality issues observed",
            )
            .optional(),
        ],
    );

    let scoring = ScoringConfig {
        dimensions: vec![
            DimensionDefinition {
                id: "statistical_fidelity".into(),
                label: "Statistical Fidelity".to_string(),
                weight: 0.35,
                metrics: four_tier_metrics(&FIDELITY_METRICS),
            },
            DimensionDefinition {
                id: "utility_preservation".into(),
                label: "Utility Preservation".to_string(),
                weight: 0.40,
                metrics: four_tier_metrics(&UTILITY_METRICS),
            },
            DimensionDefinition {
                id: "privacy_protection".into(),
                label: "Privacy Protection".to_string(),
                weight: 0.25,
                metrics: four_tier_metrics(&PRIVACY_METRICS),
            },
        ],
        direct_ratings: ["overall_fidelity", "overall_utility", "overall_privacy"]
            .into_iter()
            .map(|question| DirectRating {
                question: question.into(),
                table: ScoreTable::FourTier,
            })
            .collect(),
        blend: BlendRatio::default(),
        bands: BandTable::new(
            Polarity::HigherIsBetter,
            vec![
                Band::new(0, "Poor", "Quality issues require significant attention"),
                Band::new(60, "Acceptable", "Adequate quality but benefits from enhancement"),
                Band::new(75, "Good", "High quality synthetic data with minor areas for improvement"),
                Band::new(90, "Excellent", "Outstanding synthetic data quality across all dimensions"),
            ],
        ),
    };

    let rules = vec![
        RecommendationRule::new(
            "fidelity-below-target",
            Priority::High,
            "Statistical Fidelity",
            "Review and tune synthetic data generation parameters",
            "Statistical properties are not well preserved; focus on distribution matching and correlation preservation",
            Condition::dimension_below("statistical_fidelity", 70),
        ),
        RecommendationRule::new(
            "utility-below-target",
            Priority::High,
            "Utility Preservation",
            "Optimize generation method for specific use case requirements",
            "Synthetic data utility is limited for intended analyses; consider task-specific generation or post-processing",
            Condition::dimension_below("utility_preservation", 70),
        ),
        RecommendationRule::new(
            "privacy-below-target",
            Priority::Critical,
            "Privacy Protection",
            "Implement stronger privacy guarantees",
            "Privacy protection measures are inadequate; consider differential privacy or enhanced protection mechanisms",
            Condition::dimension_below("privacy_protection", 70),
        ),
        RecommendationRule::new(
            "core-statistics-poor",
            Priority::Medium,
            "Statistical Accuracy",
            "Implement targeted improvements for failing metrics",
            "Core statistical properties (means, variances, distribution shape, correlations) are poorly preserved",
            Condition::any_answer_equals(
                &[
                    "mean_preservation",
                    "variance_preservation",
                    "distribution_shape",
                    "correlation_accuracy",
                ],
                "poor",
            ),
        ),
        RecommendationRule::new(
            "generation-review",
            Priority::Critical,
            "Generation Approach",
            "Comprehensive review of synthetic data generation approach",
            "Fundamental changes are needed to the generation method or its parameters",
            Condition::level_in(&["Poor"]),
        ),
        RecommendationRule::new(
            "targeted-improvements",
            Priority::High,
            "Quality Improvement",
            "Implement targeted quality improvements",
            "Focus on the specific metrics showing poor performance",
            Condition::level_in(&["Acceptable", "Poor"]),
        ),
        RecommendationRule::new(
            "reported-issues",
            Priority::High,
            "Reported Issues",
            "Address identified quality issues",
            "The assessor recorded specific quality issues that need follow-up",
            Condition::text_provided("quality_issues"),
        ),
        RecommendationRule::new(
            "quality-monitoring",
            Priority::Medium,
            "Monitoring",
            "Establish quality monitoring process",
            "Regular assessment of quality metrics throughout the project lifecycle",
            Condition::Always,
        ),
        RecommendationRule::new(
            "fidelity-strength",
            Priority::Info,
            "Strength",
            "Maintain current fidelity practices",
            "Synthetic data closely matches source data properties",
            Condition::dimension_at_least("statistical_fidelity", 80),
        ),
        RecommendationRule::new(
            "utility-strength",
            Priority::Info,
            "Strength",
            "Maintain current utility practices",
            "Synthetic data strongly supports intended analyses",
            Condition::dimension_at_least("utility_preservation", 80),
        ),
        RecommendationRule::new(
            "privacy-strength",
            Priority::Info,
            "Strength",
            "Maintain current privacy safeguards",
            "Good safeguards against re-identification attacks",
            Condition::dimension_at_least("privacy_protection", 80),
        ),
        RecommendationRule::new(
            "weak-dimensions",
            Priority::Low,
            "Weakness",
            "Prioritise dimensions scoring below 60",
            "At least one quality dimension falls short of an acceptable level",
            Condition::Any {
                conditions: vec![
                    Condition::dimension_below("statistical_fidelity", 60),
                    Condition::dimension_below("utility_preservation", 60),
                    Condition::dimension_below("privacy_protection", 60),
                ],
            },
        ),
        RecommendationRule::new(
            "poor-metrics",
            Priority::Low,
            "Weakness",
            "Investigate every metric rated poor",
            "Individual metrics rated poor point to specific generation weaknesses",
            Condition::any_answer_equals(&all_quality_metrics(), "poor"),
        ),
        RecommendationRule::new(
            "excellent-metrics",
            Priority::Info,
            "Strength",
            "Document the settings behind excellent metrics",
            "More than three metrics are rated excellent",
            Condition::answer_count_at_least(&all_quality_metrics(), "excellent", 4),
        ),
    ];

    QuestionnaireDefinition {
        tool: QUALITY_METRICS.into(),
        title: "Synthetic Data Quality Metrics".to_string(),
        sections: vec![fidelity, utility, privacy, overall],
        scoring,
        rules,
        results_gate: Some(70),
    }
}

const ATTACK_LIKELIHOOD: [(&str, &str); 4] = [
    ("low", "Low"),
    ("medium", "Medium"),
    ("high", "High"),
    ("very-high", "Very high"),
];

const IMPACT_SEVERITY: [(&str, &str); 4] = [
    ("low", "Low"),
    ("medium", "Medium"),
    ("high", "High"),
    ("severe", "Severe"),
];

fn attack_table() -> ScoreTable {
    ScoreTable::categorical([
        ("low", Contribution::Points(10)),
        ("medium", Contribution::Points(30)),
        ("high", Contribution::Points(60)),
        ("very-high", Contribution::Points(100)),
    ])
}

fn impact_table() -> ScoreTable {
    ScoreTable::categorical([
        ("low", Contribution::Points(10)),
        ("medium", Contribution::Points(40)),
        ("high", Contribution::Points(70)),
        ("severe", Contribution::Points(100)),
    ])
}

/// Re-identification risk: higher scores are worse.
pub fn risk_evaluation() -> QuestionnaireDefinition {
    let data_profile = SectionDefinition::new(
        "data-profile",
        "Data Profile",
        vec![
            multi_question(
                "sensitive_data",
                "Which sensitive data categories does the source contain?",
                &[
                    ("health", "Health or clinical"),
                    ("genetic", "Genetic"),
                    ("financial", "Financial"),
                    ("location", "Precise location"),
                    ("demographic", "Detailed demographics"),
                    ("biometric", "Biometric"),
                    ("criminal", "Criminal justice"),
                    ("minors", "Data about minors"),
                ],
            ),
            choice_question(
                "dataset_size",
                "How many records does the source dataset hold?",
                &[
                    ("very-small", "Under 1,000"),
                    ("small", "1,000 to 10,000"),
                    ("medium", "10,000 to 100,000"),
                    ("large", "100,000 to 1 million"),
                    ("very-large", "Over 1 million"),
                ],
            ),
            choice_question(
                "population_rarity",
                "How rare is the represented population?",
                &[
                    ("common", "Common"),
                    ("somewhat-rare", "Somewhat rare"),
                    ("rare", "Rare"),
                    ("very-rare", "Very rare"),
                    ("extremely-rare", "Extremely rare"),
                ],
            ),
        ],
    );

    let safeguards = SectionDefinition::new(
        "safeguards",
        "Safeguards",
        vec![
            choice_question(
                "synthetic_method",
                "Which generation method is used?",
                &[
                    ("statistical", "Statistical model"),
                    ("machine-learning", "Machine learning"),
                    ("deep-learning", "Deep generative model"),
                    ("rule-based", "Rule based"),
                    ("hybrid", "Hybrid"),
                ],
            ),
            multi_question(
                "privacy_mechanisms",
                "Which privacy mechanisms are applied?",
                &[
                    ("differential-privacy", "Differential privacy"),
                    ("k-anonymity", "k-anonymity"),
                    ("noise-addition", "Noise addition"),
                    ("none", "None"),
                ],
            ),
            choice_question(
                "access_control",
                "Who can access the synthetic data?",
                &[
                    ("public", "Public release"),
                    ("registered", "Registered users"),
                    ("approved", "Approved researchers"),
                    ("secure-environment", "Secure environment only"),
                    ("internal-only", "Internal only"),
                ],
            ),
            multi_question(
                "security_measures",
                "Which infrastructure security measures are in place?",
                &[
                    ("encryption", "Encryption at rest and in transit"),
                    ("audit-logging", "Audit logging"),
                    ("multi-factor", "Multi-factor authentication"),
                    ("network-isolation", "Network isolation"),
                    ("intrusion-detection", "Intrusion detection"),
                    ("data-loss-prevention", "Data loss prevention"),
                ],
            )
            .optional(),
        ],
    );

    let threats = SectionDefinition::new(
        "threats",
        "Threat Scenarios",
        vec![
            choice_question(
                "attacker_capability",
                "What attacker capability is plausible?",
                &[
                    ("casual", "Casual"),
                    ("skilled", "Skilled individual"),
                    ("organized", "Organized group"),
                    ("state", "State level"),
                ],
            ),
            choice_question("linkage_risk", "Likelihood of linkage attacks", &ATTACK_LIKELIHOOD),
            choice_question("membership_risk", "Likelihood of membership inference", &ATTACK_LIKELIHOOD),
            choice_question("attribute_risk", "Likelihood of attribute inference", &ATTACK_LIKELIHOOD),
            choice_question("inversion_risk", "Likelihood of model inversion", &ATTACK_LIKELIHOOD),
        ],
    );

    let impact = SectionDefinition::new(
        "impact",
        "Impact",
        vec![
            choice_question("privacy_impact", "Impact of a privacy breach on individuals", &IMPACT_SEVERITY),
            choice_question("discrimination_impact", "Potential for discrimination", &IMPACT_SEVERITY),
            choice_question("social_impact", "Broader social impact", &IMPACT_SEVERITY),
        ],
    );

    let scoring = ScoringConfig {
        dimensions: vec![
            DimensionDefinition {
                id: "data_exposure".into(),
                label: "Data Exposure".to_string(),
                weight: 0.25,
                metrics: vec![
                    MetricDefinition::new(
                        "sensitive_data",
                        ScoreTable::tally(
                            0,
                            [
                                ("health", 15),
                                ("genetic", 20),
                                ("financial", 10),
                                ("location", 15),
                                ("demographic", 10),
                                ("biometric", 20),
                                ("criminal", 20),
                                ("minors", 20),
                            ],
                        ),
                    ),
                    MetricDefinition::new(
                        "dataset_size",
                        ScoreTable::categorical([
                            ("very-small", Contribution::Points(75)),
                            ("small", Contribution::Points(50)),
                            ("medium", Contribution::Points(25)),
                            ("large", Contribution::Points(10)),
                            ("very-large", Contribution::Points(5)),
                        ]),
                    ),
                    MetricDefinition::new(
                        "population_rarity",
                        ScoreTable::categorical([
                            ("common", Contribution::Points(10)),
                            ("somewhat-rare", Contribution::Points(30)),
                            ("rare", Contribution::Points(60)),
                            ("very-rare", Contribution::Points(80)),
                            ("extremely-rare", Contribution::Points(100)),
                        ]),
                    ),
                ],
            },
            DimensionDefinition {
                id: "safeguard_gaps".into(),
                label: "Safeguard Gaps".to_string(),
                weight: 0.25,
                metrics: vec![
                    MetricDefinition::new(
                        "privacy_mechanisms",
                        ScoreTable::tally(
                            60,
                            [
                                ("differential-privacy", -30),
                                ("k-anonymity", -16),
                                ("noise-addition", -20),
                                ("none", 40),
                            ],
                        ),
                    ),
                    MetricDefinition::new(
                        "access_control",
                        ScoreTable::categorical([
                            ("public", Contribution::Points(100)),
                            ("registered", Contribution::Points(75)),
                            ("approved", Contribution::Points(50)),
                            ("secure-environment", Contribution::Points(25)),
                            ("internal-only", Contribution::Points(10)),
                        ]),
                    ),
                    MetricDefinition::new(
                        "security_measures",
                        ScoreTable::tally(
                            90,
                            [
                                ("encryption", -15),
                                ("audit-logging", -15),
                                ("multi-factor", -15),
                                ("network-isolation", -15),
                                ("intrusion-detection", -15),
                                ("data-loss-prevention", -15),
                            ],
                        ),
                    ),
                ],
            },
            DimensionDefinition {
                id: "attack_surface".into(),
                label: "Attack Surface".to_string(),
                weight: 0.30,
                metrics: vec![
                    MetricDefinition::new(
                        "attacker_capability",
                        ScoreTable::categorical([
                            ("casual", Contribution::Points(10)),
                            ("skilled", Contribution::Points(40)),
                            ("organized", Contribution::Points(70)),
                            ("state", Contribution::Points(100)),
                        ]),
                    ),
                    MetricDefinition::new("linkage_risk", attack_table()),
                    MetricDefinition::new("membership_risk", attack_table()),
                    MetricDefinition::new("attribute_risk", attack_table()),
                    MetricDefinition::new("inversion_risk", attack_table()),
                ],
            },
            DimensionDefinition {
                id: "harm_potential".into(),
                label: "Harm Potential".to_string(),
                weight: 0.20,
                metrics: vec![
                    MetricDefinition::new("privacy_impact", impact_table()),
                    MetricDefinition::new("discrimination_impact", impact_table()),
                    MetricDefinition::new("social_impact", impact_table()),
                ],
            },
        ],
        direct_ratings: Vec::new(),
        blend: BlendRatio::default(),
        bands: BandTable::new(
            Polarity::HigherIsWorse,
            vec![
                Band::new(0, "Low", "Acceptable risk level with standard safeguards"),
                Band::new(25, "Medium", "Moderate risk requiring additional controls"),
                Band::new(50, "High", "Significant risk requiring comprehensive mitigation"),
                Band::new(75, "Critical", "Unacceptable risk; the project may not be suitable"),
            ],
        ),
    };

    let rules = vec![
        RecommendationRule::new(
            "project-viability",
            Priority::Critical,
            "Project Viability",
            "Consider alternative approaches to synthetic data generation",
            "Critical risk level suggests synthetic data may not be appropriate for this use case",
            Condition::level_in(&["Critical"]),
        ),
        RecommendationRule::new(
            "formal-guarantees",
            Priority::High,
            "Privacy Protection",
            "Implement differential privacy with strong epsilon parameters",
            "High-risk scenarios require formal privacy guarantees",
            Condition::level_in(&["High", "Critical"]),
        ),
        RecommendationRule::new(
            "layered-mechanisms",
            Priority::High,
            "Technical Controls",
            "Implement multiple privacy protection mechanisms",
            "Layered privacy protections provide defense in depth",
            Condition::Any {
                conditions: vec![
                    Condition::selection_includes("privacy_mechanisms", "none"),
                    Condition::selection_count_below("privacy_mechanisms", 2),
                ],
            },
        ),
        RecommendationRule::new(
            "controlled-access",
            Priority::Medium,
            "Access Control",
            "Implement controlled access with user authentication",
            "Public access increases attack opportunities significantly",
            Condition::answer_equals("access_control", "public"),
        ),
        RecommendationRule::new(
            "infrastructure-security",
            Priority::Medium,
            "Infrastructure Security",
            "Strengthen technical security controls",
            "Comprehensive security infrastructure reduces attack success probability",
            Condition::Any {
                conditions: vec![
                    Condition::Unanswered {
                        question: "security_measures".into(),
                    },
                    Condition::selection_count_below("security_measures", 4),
                ],
            },
        ),
        RecommendationRule::new(
            "harm-review",
            Priority::High,
            "Impact",
            "Conduct a formal impact assessment with affected stakeholders",
            "Severe potential harm warrants independent review before release",
            Condition::any_answer_equals(
                &["privacy_impact", "discrimination_impact", "social_impact"],
                "severe",
            ),
        ),
        RecommendationRule::new(
            "risk-review-cadence",
            Priority::Low,
            "Governance",
            "Re-run this risk evaluation when data, method, or access changes",
            "Risk posture shifts as the release context changes",
            Condition::Always,
        ),
    ];

    QuestionnaireDefinition {
        tool: RISK_EVALUATION.into(),
        title: "Re-identification Risk Evaluation".to_string(),
        sections: vec![data_profile, safeguards, threats, impact],
        scoring,
        rules,
        results_gate: Some(100),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_validates_every_tool() {
        let catalog = Catalog::standard().expect("built-in definitions are valid");
        assert_eq!(catalog.len(), 4);
        for tool in [
            QUALITY_METRICS,
            RISK_EVALUATION,
            COMPLIANCE_CHECKLIST,
            USE_CASE_ASSESSMENT,
        ] {
            assert!(catalog.get(&ToolId::from(tool)).is_some(), "{tool} registered");
        }
    }

    #[test]
    fn quality_weights_match_documented_split() {
        let definition = quality_metrics();
        let weights: Vec<f64> = definition
            .scoring
            .dimensions
            .iter()
            .map(|dimension| dimension.weight)
            .collect();
        assert_eq!(weights, vec![0.35, 0.40, 0.25]);
        assert_eq!(definition.scoring.direct_ratings.len(), 3);
    }

    #[test]
    fn bands_encode_opposite_polarity() {
        assert_eq!(
            quality_metrics().scoring.bands.polarity,
            Polarity::HigherIsBetter
        );
        assert_eq!(
            risk_evaluation().scoring.bands.polarity,
            Polarity::HigherIsWorse
        );
    }
}
