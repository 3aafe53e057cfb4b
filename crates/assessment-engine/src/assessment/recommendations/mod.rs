mod rules;

pub use rules::Condition;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::model::{AnswerSet, DimensionId, QuestionId};
use super::questionnaire::QuestionnaireError;
use super::scoring::ScoreResult;
use rules::RuleContext;

/// Output ordering: Critical first, Info last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Priority {
    pub const fn label(self) -> &'static str {
        match self {
            Priority::Critical => "Critical",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
            Priority::Info => "Info",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A configured rule: when `when` holds, emit one recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRule {
    pub id: String,
    pub priority: Priority,
    pub category: String,
    pub action: String,
    pub justification: String,
    pub when: Condition,
}

impl RecommendationRule {
    pub fn new(
        id: &str,
        priority: Priority,
        category: &str,
        action: &str,
        justification: &str,
        when: Condition,
    ) -> Self {
        Self {
            id: id.to_string(),
            priority,
            category: category.to_string(),
            action: action.to_string(),
            justification: justification.to_string(),
            when,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub priority: Priority,
    pub category: String,
    pub action: String,
    pub justification: String,
    pub rule: String,
}

/// Pure rule evaluator over a score snapshot and the raw answers.
#[derive(Debug, Clone, Default)]
pub struct RecommendationGenerator {
    rules: Vec<RecommendationRule>,
}

impl RecommendationGenerator {
    pub fn new(rules: Vec<RecommendationRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[RecommendationRule] {
        &self.rules
    }

    /// Fire every matching rule, order by priority (stable within a
    /// priority), and drop exact category + action duplicates.
    pub fn generate(&self, scores: &ScoreResult, answers: &AnswerSet) -> Vec<RecommendationItem> {
        let context = RuleContext { scores, answers };

        let mut fired: Vec<&RecommendationRule> = self
            .rules
            .iter()
            .filter(|rule| match rule.when.evaluate(&context) {
                Some(true) => true,
                Some(false) => false,
                None => {
                    debug!(rule = %rule.id, "rule precondition missing; not fired");
                    false
                }
            })
            .collect();
        fired.sort_by_key(|rule| rule.priority);

        let mut seen = HashSet::new();
        fired
            .into_iter()
            .filter(|rule| seen.insert((rule.category.as_str(), rule.action.as_str())))
            .map(|rule| RecommendationItem {
                priority: rule.priority,
                category: rule.category.clone(),
                action: rule.action.clone(),
                justification: rule.justification.clone(),
                rule: rule.id.clone(),
            })
            .collect()
    }
}

pub(crate) fn validate_rules(
    rules: &[RecommendationRule],
    has_dimension: impl Fn(&DimensionId) -> bool,
    has_question: impl Fn(&QuestionId) -> bool,
    has_level: impl Fn(&str) -> bool,
) -> Result<(), QuestionnaireError> {
    let mut ids = HashSet::new();
    for rule in rules {
        if !ids.insert(rule.id.as_str()) {
            return Err(QuestionnaireError::DuplicateRule(rule.id.clone()));
        }

        let mut dimensions = Vec::new();
        let mut questions = Vec::new();
        rule.when.references(&mut dimensions, &mut questions);
        if let Some(dimension) = dimensions.into_iter().find(|id| !has_dimension(id)) {
            return Err(QuestionnaireError::UnknownRuleDimension {
                rule: rule.id.clone(),
                dimension,
            });
        }
        if let Some(question) = questions.into_iter().find(|id| !has_question(id)) {
            return Err(QuestionnaireError::UnknownRuleQuestion {
                rule: rule.id.clone(),
                question,
            });
        }

        let mut labels = Vec::new();
        rule.when.levels(&mut labels);
        if let Some(label) = labels.into_iter().find(|label| !has_level(label)) {
            return Err(QuestionnaireError::UnknownRuleLevel {
                rule: rule.id.clone(),
                label,
            });
        }
    }
    Ok(())
}
