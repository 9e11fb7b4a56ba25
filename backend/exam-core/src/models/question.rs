use serde::{Deserialize, Serialize};
use validator::Validate;

/// Sentinel answer the external sandbox reports when every test case passed.
pub const ALL_TESTS_PASSED: &str = "all_tests_passed";

/// Sentinel recorded when the sandbox reported at least one failing test.
pub const TESTS_FAILED: &str = "tests_failed";

/// Question types supported by the bank.
///
/// `CodeOutput` is display-only (no automated checking) and `CodingChallenge`
/// is graded by the external sandbox; neither is scored by string equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    TrueFalse,
    FillBlank,
    CodeOutput,
    CodingChallenge,
    Handwrite,
}

impl QuestionType {
    /// Types graded by exact string equality against `Question::answer`.
    pub fn is_auto_graded(&self) -> bool {
        !matches!(
            self,
            QuestionType::CodeOutput | QuestionType::CodingChallenge
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// One selectable choice. Labels are unique within a question ("A", "B", ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    pub label: String,
    pub content: String,
}

/// Question as served to a session.
///
/// `content` may embed math or markup; the engine treats it as opaque
/// display text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,

    #[serde(rename = "type")]
    pub question_type: QuestionType,

    pub content: String,

    /// Present only for choice-like types, in display order.
    #[serde(default)]
    pub options: Vec<QuestionOption>,

    /// Canonical correct answer: an option label, a comma-joined label set,
    /// "True"/"False", free text, or the coding-challenge sentinel.
    pub answer: String,

    pub difficulty: Difficulty,

    /// Shown after grading; never consulted by scoring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    /// Topic the question belongs to (used by selection tooling).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
}

impl Question {
    /// Authoring integrity check: choice answers must reference existing
    /// option labels, true/false answers must be one of the fixed tokens.
    ///
    /// A question that fails this check still scores safely — every learner
    /// response simply grades as not correct.
    pub fn answer_labels_resolve(&self) -> bool {
        match self.question_type {
            QuestionType::SingleChoice => self.options.iter().any(|o| o.label == self.answer),
            QuestionType::MultipleChoice => {
                !self.answer.is_empty()
                    && self
                        .answer
                        .split(',')
                        .all(|label| self.options.iter().any(|o| o.label == label))
            }
            QuestionType::TrueFalse => self.answer == "True" || self.answer == "False",
            _ => true,
        }
    }

    /// Option labels that appear more than once, in first-occurrence order.
    pub fn duplicate_option_labels(&self) -> Vec<&str> {
        let mut duplicates = Vec::new();
        for (idx, option) in self.options.iter().enumerate() {
            let repeated = self.options[..idx]
                .iter()
                .any(|earlier| earlier.label == option.label);
            if repeated && !duplicates.contains(&option.label.as_str()) {
                duplicates.push(option.label.as_str());
            }
        }
        duplicates
    }
}

/// Request used by the admin content tooling to author a question.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(
        min = 1,
        max = 10000,
        message = "Content must be between 1 and 10000 characters"
    ))]
    pub content: String,

    #[serde(rename = "type")]
    pub question_type: QuestionType,

    #[serde(default)]
    pub options: Vec<QuestionOption>,

    #[validate(length(
        min = 1,
        max = 2000,
        message = "Answer must be between 1 and 2000 characters"
    ))]
    pub answer: String,

    pub difficulty: Difficulty,

    pub explanation: Option<String>,

    pub topic_id: Option<String>,
}
