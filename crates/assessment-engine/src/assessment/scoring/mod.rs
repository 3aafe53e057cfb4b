mod classification;
mod tables;

pub use classification::{Band, BandTable, Classification, Polarity};
pub use tables::{four_tier_points, Bucket, Contribution, ScoreTable, FOUR_TIER};

use serde::{Deserialize, Serialize};

use super::model::{AnswerSet, DimensionId, QuestionDefinition, QuestionId};
use super::questionnaire::QuestionnaireError;

/// One itemized question feeding a dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub question: QuestionId,
    #[serde(default)]
    pub table: ScoreTable,
}

impl MetricDefinition {
    pub fn new(question: &str, table: ScoreTable) -> Self {
        Self {
            question: QuestionId::from(question),
            table,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionDefinition {
    pub id: DimensionId,
    pub label: String,
    pub weight: f64,
    pub metrics: Vec<MetricDefinition>,
}

/// A coarse self-rated "overall" answer blended with the itemized result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectRating {
    pub question: QuestionId,
    #[serde(default)]
    pub table: ScoreTable,
}

/// Split between the itemized weighted score and the direct ratings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendRatio {
    pub itemized: f64,
    pub direct: f64,
}

impl Default for BlendRatio {
    fn default() -> Self {
        Self {
            itemized: 0.7,
            direct: 0.3,
        }
    }
}

impl BlendRatio {
    fn is_valid(&self) -> bool {
        self.itemized.is_finite()
            && self.direct.is_finite()
            && self.itemized >= 0.0
            && self.direct >= 0.0
            && ((self.itemized + self.direct) - 1.0).abs() < 1e-9
    }
}

/// Rubric configuration: dimensions, direct ratings, blend, and bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub dimensions: Vec<DimensionDefinition>,
    #[serde(default)]
    pub direct_ratings: Vec<DirectRating>,
    #[serde(default)]
    pub blend: BlendRatio,
    pub bands: BandTable,
}

impl ScoringConfig {
    pub(crate) fn validate<'q>(
        &self,
        lookup: impl Fn(&QuestionId) -> Option<&'q QuestionDefinition>,
    ) -> Result<(), QuestionnaireError> {
        let mut seen = Vec::with_capacity(self.dimensions.len());
        for dimension in &self.dimensions {
            if seen.contains(&&dimension.id) {
                return Err(QuestionnaireError::DuplicateDimension(dimension.id.clone()));
            }
            seen.push(&dimension.id);

            if !(dimension.weight.is_finite() && dimension.weight > 0.0) {
                return Err(QuestionnaireError::InvalidWeight {
                    dimension: dimension.id.clone(),
                    weight: dimension.weight,
                });
            }
            if dimension.metrics.is_empty() {
                return Err(QuestionnaireError::EmptyDimension(dimension.id.clone()));
            }
            for metric in &dimension.metrics {
                let question = lookup(&metric.question).ok_or_else(|| {
                    QuestionnaireError::UnknownMetricQuestion {
                        dimension: dimension.id.clone(),
                        question: metric.question.clone(),
                    }
                })?;
                metric.table.validate_for(question)?;
            }
        }

        for rating in &self.direct_ratings {
            let question = lookup(&rating.question)
                .ok_or_else(|| QuestionnaireError::UnknownDirectRating(rating.question.clone()))?;
            rating.table.validate_for(question)?;
        }

        if !self.blend.is_valid() {
            return Err(QuestionnaireError::InvalidBlend {
                itemized: self.blend.itemized,
                direct: self.blend.direct,
            });
        }

        self.bands.validate()
    }
}

/// Per-dimension outcome. `assessed == false` means "no data", which is not
/// the same as scoring zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: DimensionId,
    pub label: String,
    pub score: u8,
    pub answered_count: usize,
    pub total_metrics: usize,
    pub assessed: bool,
}

/// Which inputs produced the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBasis {
    NoData,
    Itemized,
    Direct,
    Blended,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallResult {
    pub score: u8,
    pub basis: ScoreBasis,
    pub polarity: Polarity,
    /// Absent when there is no data to classify.
    pub classification: Option<Classification>,
}

impl OverallResult {
    pub fn is_assessed(&self) -> bool {
        self.basis != ScoreBasis::NoData
    }

    pub fn level(&self) -> Option<&str> {
        self.classification
            .as_ref()
            .map(|classification| classification.label.as_str())
    }

    pub fn description(&self) -> Option<&str> {
        self.classification
            .as_ref()
            .map(|classification| classification.description.as_str())
    }
}

/// Scores for every configured dimension plus the classified overall result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub dimensions: Vec<DimensionScore>,
    pub overall: OverallResult,
}

impl ScoreResult {
    pub fn dimension(&self, id: &DimensionId) -> Option<&DimensionScore> {
        self.dimensions.iter().find(|score| &score.dimension == id)
    }
}

/// Stateless evaluator that applies the rubric configuration to an answer set.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(&self, answers: &AnswerSet) -> ScoreResult {
        let dimensions: Vec<DimensionScore> = self
            .config
            .dimensions
            .iter()
            .map(|dimension| score_dimension(dimension, answers))
            .collect();

        let overall = self.overall(&dimensions, answers);

        ScoreResult {
            dimensions,
            overall,
        }
    }

    fn overall(&self, dimensions: &[DimensionScore], answers: &AnswerSet) -> OverallResult {
        let (weighted, total_weight) = self
            .config
            .dimensions
            .iter()
            .zip(dimensions)
            .filter(|(_, score)| score.assessed)
            .fold((0.0, 0.0), |(weighted, total), (definition, score)| {
                (
                    weighted + f64::from(score.score) * definition.weight,
                    total + definition.weight,
                )
            });
        let itemized = (total_weight > 0.0).then(|| weighted / total_weight);

        let ratings: Vec<u8> = self
            .config
            .direct_ratings
            .iter()
            .filter_map(|rating| {
                answers
                    .get(&rating.question)
                    .and_then(|answer| rating.table.contribution(answer))
            })
            .collect();
        let direct = (!ratings.is_empty()).then(|| {
            ratings.iter().map(|points| f64::from(*points)).sum::<f64>() / ratings.len() as f64
        });

        let blend = self.config.blend;
        let (raw, basis) = match (itemized, direct) {
            (Some(itemized), Some(direct)) => (
                itemized * blend.itemized + direct * blend.direct,
                ScoreBasis::Blended,
            ),
            (Some(itemized), None) => (itemized, ScoreBasis::Itemized),
            (None, Some(direct)) => (direct, ScoreBasis::Direct),
            (None, None) => (0.0, ScoreBasis::NoData),
        };

        let score = round_score(raw);
        let classification = match basis {
            ScoreBasis::NoData => None,
            _ => self.config.bands.classify(score),
        };

        OverallResult {
            score,
            basis,
            polarity: self.config.bands.polarity,
            classification,
        }
    }
}

fn score_dimension(dimension: &DimensionDefinition, answers: &AnswerSet) -> DimensionScore {
    let (sum, count) = dimension
        .metrics
        .iter()
        .filter_map(|metric| {
            answers
                .get(&metric.question)
                .and_then(|answer| metric.table.contribution(answer))
        })
        .fold((0u32, 0usize), |(sum, count), points| {
            (sum + u32::from(points), count + 1)
        });

    let score = if count > 0 {
        round_score(f64::from(sum) / count as f64)
    } else {
        0
    };

    DimensionScore {
        dimension: dimension.id.clone(),
        label: dimension.label.clone(),
        score,
        answered_count: count,
        total_metrics: dimension.metrics.len(),
        assessed: count > 0,
    }
}

fn round_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}
