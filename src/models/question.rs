use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// One selectable answer choice. Ids are opaque tokens assigned at creation
/// and unique within a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,
    #[serde(rename = "optionText")]
    pub text: String,
}

impl AnswerOption {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
        }
    }

    pub fn blank() -> Self {
        Self::new("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerType {
    SingleCorrect,
    MultipleCorrect,
    /// An answer type the source data did not carry or that did not match a
    /// known label. Callers must re-validate before relying on it.
    #[default]
    Unspecified,
}

impl AnswerType {
    pub fn parse(label: &str) -> Self {
        match label {
            "Single-Correct" => AnswerType::SingleCorrect,
            "Multiple-Correct" => AnswerType::MultipleCorrect,
            _ => AnswerType::Unspecified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerType::SingleCorrect => "Single-Correct",
            AnswerType::MultipleCorrect => "Multiple-Correct",
            AnswerType::Unspecified => "",
        }
    }
}

impl Serialize for AnswerType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AnswerType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(AnswerType::parse(&label))
    }
}

/// One authored question. Fields are public so an edit buffer can be mutated
/// in place; the invariants (non-empty text, correct ids referencing existing
/// options, single-correct cardinality) are enforced at commit time by the
/// editor's validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub question_text: String,
    pub options: Vec<AnswerOption>,
    #[serde(default = "default_marks")]
    pub marks: u32,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub answer_type: AnswerType,
    #[serde(default)]
    pub correct_option_ids: Vec<String>,
}

fn default_marks() -> u32 {
    1
}

impl QuestionRecord {
    /// Fresh edit buffer: four blank options, one mark, single-correct, no
    /// correct selection yet.
    pub fn draft() -> Self {
        Self {
            question_text: String::new(),
            options: vec![
                AnswerOption::blank(),
                AnswerOption::blank(),
                AnswerOption::blank(),
                AnswerOption::blank(),
            ],
            marks: 1,
            explanation: String::new(),
            answer_type: AnswerType::SingleCorrect,
            correct_option_ids: Vec::new(),
        }
    }
}
