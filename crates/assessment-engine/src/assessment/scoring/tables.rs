use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::super::model::{AnswerValue, QuestionDefinition, QuestionKind};
use super::super::questionnaire::QuestionnaireError;

/// The fixed categorical scale shared by every rating question.
pub const FOUR_TIER: [(&str, u8); 4] = [
    ("excellent", 100),
    ("good", 80),
    ("acceptable", 60),
    ("poor", 30),
];

pub fn four_tier_points(category: &str) -> Option<u8> {
    FOUR_TIER
        .iter()
        .find(|(tier, _)| *tier == category)
        .map(|(_, points)| *points)
}

/// What a single category contributes to its dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "points", rename_all = "snake_case")]
pub enum Contribution {
    Points(u8),
    /// Excluded from both the sum and the assessed count.
    Unassessed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub lower_bound: f64,
    pub points: u8,
}

/// Lookup from an answer to its numeric contribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScoreTable {
    /// excellent=100, good=80, acceptable=60, poor=30.
    #[default]
    FourTier,
    Categorical {
        entries: BTreeMap<String, Contribution>,
    },
    /// Numeric and scale answers: the last bucket whose lower bound is at or
    /// below the value; values under the first bound use the first bucket.
    Buckets { buckets: Vec<Bucket> },
    /// Multi-choice answers: `base` plus each selected option's adjustment,
    /// clamped to 0..=100.
    Tally {
        #[serde(default)]
        base: i32,
        adjustments: BTreeMap<String, i32>,
    },
}

impl ScoreTable {
    pub fn categorical<'a>(entries: impl IntoIterator<Item = (&'a str, Contribution)>) -> Self {
        Self::Categorical {
            entries: entries
                .into_iter()
                .map(|(category, contribution)| (category.to_string(), contribution))
                .collect(),
        }
    }

    pub fn buckets(bounds: impl IntoIterator<Item = (f64, u8)>) -> Self {
        Self::Buckets {
            buckets: bounds
                .into_iter()
                .map(|(lower_bound, points)| Bucket {
                    lower_bound,
                    points,
                })
                .collect(),
        }
    }

    pub fn tally<'a>(base: i32, adjustments: impl IntoIterator<Item = (&'a str, i32)>) -> Self {
        Self::Tally {
            base,
            adjustments: adjustments
                .into_iter()
                .map(|(option, delta)| (option.to_string(), delta))
                .collect(),
        }
    }

    pub fn accepts(&self, kind: QuestionKind) -> bool {
        match self {
            Self::FourTier | Self::Categorical { .. } => kind == QuestionKind::SingleChoice,
            Self::Buckets { .. } => matches!(kind, QuestionKind::Numeric | QuestionKind::Scale),
            Self::Tally { .. } => kind == QuestionKind::MultiChoice,
        }
    }

    /// Points for an answer, or `None` when the answer does not count towards
    /// the dimension.
    pub fn contribution(&self, answer: &AnswerValue) -> Option<u8> {
        match (self, answer) {
            (_, AnswerValue::Unassessed { .. }) => None,
            (Self::FourTier, AnswerValue::Choice(category)) => four_tier_points(category),
            (Self::Categorical { entries }, AnswerValue::Choice(category)) => {
                match entries.get(category) {
                    Some(Contribution::Points(points)) => Some(*points),
                    Some(Contribution::Unassessed) | None => None,
                }
            }
            (Self::Buckets { buckets }, AnswerValue::Number(value)) => {
                let mut selected = buckets.first()?;
                for bucket in buckets {
                    if bucket.lower_bound <= *value {
                        selected = bucket;
                    }
                }
                Some(selected.points)
            }
            (Self::Tally { base, adjustments }, AnswerValue::Choices(selected)) => {
                let total = selected
                    .iter()
                    .filter_map(|option| adjustments.get(option))
                    .fold(*base, |acc, delta| acc.saturating_add(*delta));
                Some(total.clamp(0, 100) as u8)
            }
            _ => None,
        }
    }

    /// Reject tables that would silently mis-score the question they are bound to.
    pub fn validate_for(&self, question: &QuestionDefinition) -> Result<(), QuestionnaireError> {
        if !self.accepts(question.kind) {
            return Err(QuestionnaireError::IncompatibleTable {
                question: question.id.clone(),
                kind: question.kind,
            });
        }

        match self {
            Self::FourTier => {
                for option in question.options.iter().filter(|option| option.assessed) {
                    if four_tier_points(&option.value).is_none() {
                        return Err(QuestionnaireError::UncoveredOption {
                            question: question.id.clone(),
                            option: option.value.clone(),
                        });
                    }
                }
            }
            Self::Categorical { entries } => {
                for option in question.options.iter().filter(|option| option.assessed) {
                    match entries.get(&option.value) {
                        Some(Contribution::Points(points)) if *points > 100 => {
                            return Err(QuestionnaireError::InvalidPoints {
                                question: question.id.clone(),
                                points: *points,
                            });
                        }
                        Some(_) => {}
                        None => {
                            return Err(QuestionnaireError::UncoveredOption {
                                question: question.id.clone(),
                                option: option.value.clone(),
                            });
                        }
                    }
                }
            }
            Self::Buckets { buckets } => {
                let increasing = buckets
                    .windows(2)
                    .all(|pair| pair[0].lower_bound < pair[1].lower_bound);
                let finite = buckets.iter().all(|bucket| bucket.lower_bound.is_finite());
                if buckets.is_empty() || !increasing || !finite {
                    return Err(QuestionnaireError::InvalidBuckets(question.id.clone()));
                }
                if let Some(bucket) = buckets.iter().find(|bucket| bucket.points > 100) {
                    return Err(QuestionnaireError::InvalidPoints {
                        question: question.id.clone(),
                        points: bucket.points,
                    });
                }
            }
            Self::Tally { adjustments, .. } => {
                if let Some(unknown) = adjustments
                    .keys()
                    .find(|option| question.option(option).is_none())
                {
                    return Err(QuestionnaireError::UnknownTallyOption {
                        question: question.id.clone(),
                        option: unknown.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}
