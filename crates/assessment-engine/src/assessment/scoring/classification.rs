use serde::{Deserialize, Serialize};

use super::super::questionnaire::QuestionnaireError;

/// Which end of the 0-100 scale is favorable. Only the band table carries
/// this; the engine itself never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Quality and compliance tools.
    HigherIsBetter,
    /// Risk tools: a higher score means more exposure.
    HigherIsWorse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub lower_bound: u8,
    pub label: String,
    pub description: String,
}

impl Band {
    pub fn new(lower_bound: u8, label: &str, description: &str) -> Self {
        Self {
            lower_bound,
            label: label.to_string(),
            description: description.to_string(),
        }
    }
}

/// Ordered `(lower bound, label, description)` thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandTable {
    pub polarity: Polarity,
    pub bands: Vec<Band>,
}

/// The band selected for a score. `ordinal` is the band's index, so it grows
/// with the score regardless of polarity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub ordinal: usize,
    pub label: String,
    pub description: String,
}

impl BandTable {
    pub fn new(polarity: Polarity, bands: Vec<Band>) -> Self {
        Self { polarity, bands }
    }

    pub fn validate(&self) -> Result<(), QuestionnaireError> {
        let first = self.bands.first().ok_or(QuestionnaireError::EmptyBands)?;
        if first.lower_bound != 0 {
            return Err(QuestionnaireError::BandsMustStartAtZero(first.lower_bound));
        }
        if let Some(band) = self.bands.iter().find(|band| band.lower_bound > 100) {
            return Err(QuestionnaireError::BandOutOfRange(band.lower_bound));
        }
        for pair in self.bands.windows(2) {
            if pair[0].lower_bound >= pair[1].lower_bound {
                return Err(QuestionnaireError::NonMonotonicBands {
                    previous: pair[0].lower_bound,
                    next: pair[1].lower_bound,
                });
            }
        }
        Ok(())
    }

    /// Select the last band whose lower bound is at or below `score`.
    pub fn classify(&self, score: u8) -> Option<Classification> {
        self.bands
            .iter()
            .enumerate()
            .rev()
            .find(|(_, band)| band.lower_bound <= score)
            .map(|(ordinal, band)| Classification {
                ordinal,
                label: band.label.clone(),
                description: band.description.clone(),
            })
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.bands.iter().any(|band| band.label == label)
    }
}
