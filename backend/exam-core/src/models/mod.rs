use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod question;
pub mod result;
pub mod timer;

pub use question::{Difficulty, Question, QuestionOption, QuestionType};
pub use result::SessionResult;

/// How a session is run; fixed at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Untimed practice over the whole set, graded at submit.
    Standard,
    /// One question at a time, graded as the learner advances.
    Immersive,
    /// Timed; expiry is an automatic submit trigger.
    Exam,
}

impl SessionMode {
    pub fn as_label(&self) -> &'static str {
        match self {
            SessionMode::Standard => "standard",
            SessionMode::Immersive => "immersive",
            SessionMode::Exam => "exam",
        }
    }
}

/// Session lifecycle. `Finished` and `Abandoned` are terminal; a new attempt
/// is a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    InProgress,
    Submitting,
    Finished,
    Abandoned,
}

/// Record handed to the persistence sink once a session reaches `Finished`.
///
/// The sink owns the storage shape beyond these fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub user_id: String,
    pub mode: SessionMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub score: u32,
    pub total_scored: u32,
    pub answers: HashMap<String, String>,
}
