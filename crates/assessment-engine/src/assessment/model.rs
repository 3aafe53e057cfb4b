use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

identifier!(
    /// Identifier of a questionnaire, also used to namespace persisted keys.
    ToolId
);
identifier!(
    /// Identifier wrapper for a single question.
    QuestionId
);
identifier!(SectionId);
identifier!(DimensionId);
identifier!(
    /// Timestamp-derived identity of a saved assessment.
    AssessmentId
);

/// Answer shapes a question accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    SingleChoice,
    MultiChoice,
    FreeText,
    Numeric,
    Scale,
}

impl QuestionKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::SingleChoice => "single choice",
            Self::MultiChoice => "multi choice",
            Self::FreeText => "free text",
            Self::Numeric => "numeric",
            Self::Scale => "scale",
        }
    }

    pub const fn has_options(self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultiChoice)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A selectable value/label pair. Options with `assessed: false` are the
/// "not assessed" / "not applicable" choices that scoring skips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub value: String,
    pub label: String,
    #[serde(default = "assessed_by_default")]
    pub assessed: bool,
}

fn assessed_by_default() -> bool {
    true
}

impl AnswerOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            assessed: true,
        }
    }

    pub fn unassessed(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            assessed: false,
        }
    }
}

/// Inclusive bounds for numeric and scale answers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDefinition {
    pub id: QuestionId,
    pub kind: QuestionKind,
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<AnswerOption>,
    #[serde(default = "required_by_default")]
    pub required: bool,
    /// Owning section; assigned from the enclosing section when the
    /// questionnaire is built.
    #[serde(default = "unassigned_section")]
    pub section: SectionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<ValueRange>,
}

fn required_by_default() -> bool {
    true
}

fn unassigned_section() -> SectionId {
    SectionId(String::new())
}

impl QuestionDefinition {
    pub fn new(id: &str, kind: QuestionKind, prompt: &str) -> Self {
        Self {
            id: QuestionId::from(id),
            kind,
            prompt: prompt.to_string(),
            options: Vec::new(),
            required: true,
            section: unassigned_section(),
            range: None,
        }
    }

    pub fn with_options(mut self, options: Vec<AnswerOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some(ValueRange { min, max });
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn option(&self, value: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|option| option.value == value)
    }

    /// Check an incoming value against this question's shape.
    ///
    /// Returns `Ok(None)` for blank input (empty selection, whitespace-only
    /// text) so callers drop the key rather than store a placeholder.
    pub fn normalize(&self, value: AnswerValue) -> Result<Option<AnswerValue>, AnswerError> {
        match (self.kind, value) {
            (QuestionKind::SingleChoice, AnswerValue::Choice(choice)) => {
                if choice.is_empty() {
                    return Ok(None);
                }
                match self.option(&choice) {
                    Some(option) if option.assessed => Ok(Some(AnswerValue::Choice(choice))),
                    Some(_) => Ok(Some(AnswerValue::Unassessed { reason: choice })),
                    None => Err(self.unknown_option(choice)),
                }
            }
            (QuestionKind::MultiChoice, AnswerValue::Choice(choice)) => {
                if choice.is_empty() {
                    return Ok(None);
                }
                self.normalize(AnswerValue::Choices(BTreeSet::from([choice])))
            }
            (QuestionKind::MultiChoice, AnswerValue::Choices(choices)) => {
                if let Some(unknown) = choices.iter().find(|value| self.option(value).is_none()) {
                    return Err(self.unknown_option(unknown.clone()));
                }
                if choices.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(AnswerValue::Choices(choices)))
                }
            }
            (QuestionKind::FreeText, AnswerValue::Text(text)) => {
                if text.trim().is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(AnswerValue::Text(text)))
                }
            }
            (QuestionKind::Numeric | QuestionKind::Scale, AnswerValue::Number(number)) => {
                if !number.is_finite() {
                    return Err(AnswerError::NotANumber {
                        question: self.id.clone(),
                    });
                }
                match self.range {
                    Some(range) if !range.contains(number) => Err(AnswerError::OutOfRange {
                        question: self.id.clone(),
                        value: number,
                        min: range.min,
                        max: range.max,
                    }),
                    _ => Ok(Some(AnswerValue::Number(number))),
                }
            }
            (kind, AnswerValue::Unassessed { reason }) => {
                if kind.has_options() {
                    match self.option(&reason) {
                        Some(option) if !option.assessed => {
                            Ok(Some(AnswerValue::Unassessed { reason }))
                        }
                        _ => Err(self.unknown_option(reason)),
                    }
                } else {
                    Ok(Some(AnswerValue::Unassessed { reason }))
                }
            }
            (kind, _) => Err(AnswerError::KindMismatch {
                question: self.id.clone(),
                expected: kind,
            }),
        }
    }

    fn unknown_option(&self, value: String) -> AnswerError {
        AnswerError::UnknownOption {
            question: self.id.clone(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDefinition {
    pub id: SectionId,
    pub title: String,
    pub questions: Vec<QuestionDefinition>,
}

impl SectionDefinition {
    pub fn new(id: &str, title: &str, questions: Vec<QuestionDefinition>) -> Self {
        Self {
            id: SectionId::from(id),
            title: title.to_string(),
            questions,
        }
    }

    pub fn required_questions(&self) -> impl Iterator<Item = &QuestionDefinition> {
        self.questions.iter().filter(|question| question.required)
    }
}

/// A recorded answer, tagged by shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    Choice(String),
    Choices(BTreeSet<String>),
    Text(String),
    Number(f64),
    /// The user explicitly marked the item as not assessed or not applicable.
    Unassessed { reason: String },
}

impl AnswerValue {
    pub fn choice(value: &str) -> Self {
        Self::Choice(value.to_string())
    }

    pub fn choices<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        Self::Choices(values.into_iter().map(str::to_string).collect())
    }

    pub fn text(value: &str) -> Self {
        Self::Text(value.to_string())
    }

    pub fn unassessed(reason: &str) -> Self {
        Self::Unassessed {
            reason: reason.to_string(),
        }
    }

    /// Whether the value counts as an answer at all.
    pub fn is_present(&self) -> bool {
        match self {
            Self::Choice(value) => !value.is_empty(),
            Self::Choices(values) => !values.is_empty(),
            Self::Text(text) => !text.trim().is_empty(),
            Self::Number(number) => number.is_finite(),
            Self::Unassessed { .. } => true,
        }
    }

    pub fn is_unassessed(&self) -> bool {
        matches!(self, Self::Unassessed { .. })
    }
}

/// Answers keyed by question id. Unanswered questions are absent keys, never
/// placeholder values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet {
    answers: BTreeMap<QuestionId, AnswerValue>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer. Blank values remove the key instead.
    pub fn insert(&mut self, question: QuestionId, value: AnswerValue) -> Option<AnswerValue> {
        if value.is_present() {
            self.answers.insert(question, value)
        } else {
            self.answers.remove(&question)
        }
    }

    pub fn with(mut self, question: &str, value: AnswerValue) -> Self {
        self.insert(QuestionId::from(question), value);
        self
    }

    pub fn remove(&mut self, question: &QuestionId) -> Option<AnswerValue> {
        self.answers.remove(question)
    }

    pub fn get(&self, question: &QuestionId) -> Option<&AnswerValue> {
        self.answers.get(question)
    }

    pub fn is_answered(&self, question: &QuestionId) -> bool {
        self.answers
            .get(question)
            .map(AnswerValue::is_present)
            .unwrap_or(false)
    }

    pub fn choice(&self, question: &QuestionId) -> Option<&str> {
        match self.answers.get(question) {
            Some(AnswerValue::Choice(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn selections(&self, question: &QuestionId) -> Option<&BTreeSet<String>> {
        match self.answers.get(question) {
            Some(AnswerValue::Choices(values)) => Some(values),
            _ => None,
        }
    }

    pub fn text(&self, question: &QuestionId) -> Option<&str> {
        match self.answers.get(question) {
            Some(AnswerValue::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, QuestionId, AnswerValue> {
        self.answers.iter()
    }
}

impl FromIterator<(QuestionId, AnswerValue)> for AnswerSet {
    fn from_iter<T: IntoIterator<Item = (QuestionId, AnswerValue)>>(iter: T) -> Self {
        let mut set = AnswerSet::new();
        for (question, value) in iter {
            set.insert(question, value);
        }
        set
    }
}

/// Rejections raised when an answer does not fit its question.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnswerError {
    #[error("unknown question '{0}'")]
    UnknownQuestion(QuestionId),
    #[error("question '{question}' expects a {expected} answer")]
    KindMismatch {
        question: QuestionId,
        expected: QuestionKind,
    },
    #[error("'{value}' is not an option of question '{question}'")]
    UnknownOption { question: QuestionId, value: String },
    #[error("question '{question}' expects a finite number")]
    NotANumber { question: QuestionId },
    #[error("{value} is outside {min}..={max} for question '{question}'")]
    OutOfRange {
        question: QuestionId,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("assessment results are final; restart to change answers")]
    SessionComplete,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating_question() -> QuestionDefinition {
        QuestionDefinition::new("mean", QuestionKind::SingleChoice, "Mean preservation")
            .with_options(vec![
                AnswerOption::new("excellent", "Excellent"),
                AnswerOption::new("poor", "Poor"),
                AnswerOption::unassessed("not-assessed", "Not assessed"),
            ])
    }

    #[test]
    fn blank_answers_remove_the_key() {
        let mut answers = AnswerSet::new().with("notes", AnswerValue::text("draft"));
        answers.insert(QuestionId::from("notes"), AnswerValue::text("   "));
        assert!(!answers.is_answered(&QuestionId::from("notes")));
        assert!(answers.is_empty());

        answers.insert(QuestionId::from("tags"), AnswerValue::Choices(BTreeSet::new()));
        assert!(answers.get(&QuestionId::from("tags")).is_none());
    }

    #[test]
    fn unassessed_option_normalizes_to_explicit_variant() {
        let normalized = rating_question()
            .normalize(AnswerValue::choice("not-assessed"))
            .expect("valid option");
        assert_eq!(normalized, Some(AnswerValue::unassessed("not-assessed")));
    }

    #[test]
    fn unknown_option_is_rejected() {
        let err = rating_question()
            .normalize(AnswerValue::choice("stellar"))
            .expect_err("unknown option");
        assert!(matches!(err, AnswerError::UnknownOption { value, .. } if value == "stellar"));
    }

    #[test]
    fn scale_answers_respect_range() {
        let question =
            QuestionDefinition::new("confidence", QuestionKind::Scale, "Confidence").with_range(1.0, 5.0);
        assert!(question.normalize(AnswerValue::Number(3.0)).is_ok());
        let err = question
            .normalize(AnswerValue::Number(7.0))
            .expect_err("out of range");
        assert!(matches!(err, AnswerError::OutOfRange { .. }));
        let err = question
            .normalize(AnswerValue::choice("high"))
            .expect_err("wrong shape");
        assert!(matches!(
            err,
            AnswerError::KindMismatch {
                expected: QuestionKind::Scale,
                ..
            }
        ));
    }

    #[test]
    fn answer_values_serialize_with_type_tags() {
        let answers = AnswerSet::new()
            .with("mean", AnswerValue::choice("good"))
            .with("mechanisms", AnswerValue::choices(["k-anonymity", "noise-addition"]));
        let json = serde_json::to_value(&answers).expect("serialize");
        assert_eq!(json["mean"]["type"], "choice");
        assert_eq!(json["mean"]["value"], "good");
        assert_eq!(json["mechanisms"]["type"], "choices");
    }
}
