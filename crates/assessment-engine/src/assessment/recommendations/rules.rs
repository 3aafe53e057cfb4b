use serde::{Deserialize, Serialize};

use super::super::model::{AnswerSet, AnswerValue, DimensionId, QuestionId};
use super::super::scoring::ScoreResult;

/// Inputs a rule may inspect.
pub(crate) struct RuleContext<'a> {
    pub scores: &'a ScoreResult,
    pub answers: &'a AnswerSet,
}

/// Predicate tree deciding whether a rule fires.
///
/// Evaluation is three-valued: `None` means a precondition is missing (an
/// unassessed dimension, an unanswered question, an unclassified overall
/// score). Only `Some(true)` fires a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    Always,
    DimensionBelow {
        dimension: DimensionId,
        threshold: u8,
    },
    DimensionAtLeast {
        dimension: DimensionId,
        threshold: u8,
    },
    OverallBelow {
        threshold: u8,
    },
    OverallAtLeast {
        threshold: u8,
    },
    LevelIn {
        labels: Vec<String>,
    },
    AnswerEquals {
        question: QuestionId,
        value: String,
    },
    /// Any of the listed questions carries `value`, e.g. "any metric rated poor".
    AnyAnswerEquals {
        questions: Vec<QuestionId>,
        value: String,
    },
    /// At least `minimum` of the listed questions carry `value`.
    AnswerCountAtLeast {
        questions: Vec<QuestionId>,
        value: String,
        minimum: usize,
    },
    SelectionIncludes {
        question: QuestionId,
        value: String,
    },
    SelectionCountBelow {
        question: QuestionId,
        minimum: usize,
    },
    TextProvided {
        question: QuestionId,
    },
    Unanswered {
        question: QuestionId,
    },
    All {
        conditions: Vec<Condition>,
    },
    Any {
        conditions: Vec<Condition>,
    },
    Not {
        condition: Box<Condition>,
    },
}

impl Condition {
    pub fn dimension_below(dimension: &str, threshold: u8) -> Self {
        Self::DimensionBelow {
            dimension: DimensionId::from(dimension),
            threshold,
        }
    }

    pub fn dimension_at_least(dimension: &str, threshold: u8) -> Self {
        Self::DimensionAtLeast {
            dimension: DimensionId::from(dimension),
            threshold,
        }
    }

    pub fn level_in(labels: &[&str]) -> Self {
        Self::LevelIn {
            labels: labels.iter().map(|label| label.to_string()).collect(),
        }
    }

    pub fn answer_equals(question: &str, value: &str) -> Self {
        Self::AnswerEquals {
            question: QuestionId::from(question),
            value: value.to_string(),
        }
    }

    pub fn any_answer_equals(questions: &[&str], value: &str) -> Self {
        Self::AnyAnswerEquals {
            questions: questions.iter().map(|id| QuestionId::from(*id)).collect(),
            value: value.to_string(),
        }
    }

    pub fn answer_count_at_least(questions: &[&str], value: &str, minimum: usize) -> Self {
        Self::AnswerCountAtLeast {
            questions: questions.iter().map(|id| QuestionId::from(*id)).collect(),
            value: value.to_string(),
            minimum,
        }
    }

    pub fn selection_includes(question: &str, value: &str) -> Self {
        Self::SelectionIncludes {
            question: QuestionId::from(question),
            value: value.to_string(),
        }
    }

    pub fn selection_count_below(question: &str, minimum: usize) -> Self {
        Self::SelectionCountBelow {
            question: QuestionId::from(question),
            minimum,
        }
    }

    pub fn text_provided(question: &str) -> Self {
        Self::TextProvided {
            question: QuestionId::from(question),
        }
    }

    pub(crate) fn evaluate(&self, context: &RuleContext<'_>) -> Option<bool> {
        match self {
            Condition::Always => Some(true),
            Condition::DimensionBelow {
                dimension,
                threshold,
            } => assessed_dimension(context, dimension).map(|score| score < *threshold),
            Condition::DimensionAtLeast {
                dimension,
                threshold,
            } => assessed_dimension(context, dimension).map(|score| score >= *threshold),
            Condition::OverallBelow { threshold } => {
                assessed_overall(context).map(|score| score < *threshold)
            }
            Condition::OverallAtLeast { threshold } => {
                assessed_overall(context).map(|score| score >= *threshold)
            }
            Condition::LevelIn { labels } => context
                .scores
                .overall
                .level()
                .map(|level| labels.iter().any(|label| label == level)),
            Condition::AnswerEquals { question, value } => context
                .answers
                .get(question)
                .map(|answer| answer_matches(answer, value)),
            Condition::AnyAnswerEquals { questions, value } => {
                let mut answered = false;
                for question in questions {
                    if let Some(answer) = context.answers.get(question) {
                        if answer_matches(answer, value) {
                            return Some(true);
                        }
                        answered = true;
                    }
                }
                answered.then_some(false)
            }
            Condition::AnswerCountAtLeast {
                questions,
                value,
                minimum,
            } => {
                let answered: Vec<&AnswerValue> = questions
                    .iter()
                    .filter_map(|question| context.answers.get(question))
                    .collect();
                let matching = answered
                    .iter()
                    .filter(|answer| answer_matches(answer, value))
                    .count();
                (!answered.is_empty()).then_some(matching >= *minimum)
            }
            Condition::SelectionIncludes { question, value } => {
                context.answers.get(question).map(|answer| match answer {
                    AnswerValue::Choices(selected) => selected.contains(value),
                    AnswerValue::Choice(selected) => selected == value,
                    _ => false,
                })
            }
            Condition::SelectionCountBelow { question, minimum } => {
                context.answers.get(question).map(|answer| match answer {
                    AnswerValue::Choices(selected) => selected.len() < *minimum,
                    AnswerValue::Choice(_) => 1 < *minimum,
                    _ => false,
                })
            }
            Condition::TextProvided { question } => {
                Some(context.answers.text(question).is_some())
            }
            Condition::Unanswered { question } => Some(!context.answers.is_answered(question)),
            Condition::All { conditions } => {
                let mut missing = false;
                for condition in conditions {
                    match condition.evaluate(context) {
                        Some(false) => return Some(false),
                        None => missing = true,
                        Some(true) => {}
                    }
                }
                (!missing).then_some(true)
            }
            Condition::Any { conditions } => {
                let mut missing = false;
                for condition in conditions {
                    match condition.evaluate(context) {
                        Some(true) => return Some(true),
                        None => missing = true,
                        Some(false) => {}
                    }
                }
                (!missing).then_some(false)
            }
            Condition::Not { condition } => condition.evaluate(context).map(|value| !value),
        }
    }

    /// Visit every dimension and question id referenced by this tree.
    pub(crate) fn references(&self, dimensions: &mut Vec<DimensionId>, questions: &mut Vec<QuestionId>) {
        match self {
            Condition::DimensionBelow { dimension, .. }
            | Condition::DimensionAtLeast { dimension, .. } => dimensions.push(dimension.clone()),
            Condition::AnswerEquals { question, .. }
            | Condition::SelectionIncludes { question, .. }
            | Condition::SelectionCountBelow { question, .. }
            | Condition::TextProvided { question }
            | Condition::Unanswered { question } => questions.push(question.clone()),
            Condition::AnyAnswerEquals {
                questions: ids, ..
            }
            | Condition::AnswerCountAtLeast {
                questions: ids, ..
            } => questions.extend(ids.iter().cloned()),
            Condition::All { conditions } | Condition::Any { conditions } => {
                for condition in conditions {
                    condition.references(dimensions, questions);
                }
            }
            Condition::Not { condition } => condition.references(dimensions, questions),
            Condition::Always
            | Condition::OverallBelow { .. }
            | Condition::OverallAtLeast { .. }
            | Condition::LevelIn { .. } => {}
        }
    }

    pub(crate) fn levels(&self, labels: &mut Vec<String>) {
        match self {
            Condition::LevelIn { labels: wanted } => labels.extend(wanted.iter().cloned()),
            Condition::All { conditions } | Condition::Any { conditions } => {
                for condition in conditions {
                    condition.levels(labels);
                }
            }
            Condition::Not { condition } => condition.levels(labels),
            _ => {}
        }
    }
}

fn assessed_dimension(context: &RuleContext<'_>, dimension: &DimensionId) -> Option<u8> {
    context
        .scores
        .dimension(dimension)
        .filter(|score| score.assessed)
        .map(|score| score.score)
}

fn assessed_overall(context: &RuleContext<'_>) -> Option<u8> {
    let overall = &context.scores.overall;
    overall.is_assessed().then_some(overall.score)
}

fn answer_matches(answer: &AnswerValue, value: &str) -> bool {
    match answer {
        AnswerValue::Choice(choice) => choice == value,
        AnswerValue::Unassessed { reason } => reason == value,
        AnswerValue::Text(text) => text == value,
        AnswerValue::Choices(selected) => selected.contains(value),
        AnswerValue::Number(_) => false,
    }
}
