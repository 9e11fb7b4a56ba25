use serde::{Deserialize, Serialize};

/// Outcome of one submitted session.
///
/// Computed once per submission and immutable afterwards; a session produces
/// at most one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    /// Correctly answered questions among the gradable ones.
    pub score: u32,

    /// Gradable questions in the set (excluded types do not count).
    pub total_scored: u32,

    /// `round(score / total_scored * 100)`; a set with nothing gradable
    /// reports 100.
    pub percentage: u32,

    /// Wall-clock seconds from session start to the submit trigger,
    /// captured before any persistence call.
    pub time_taken_seconds: u32,

    /// Gradable questions answered wrong or not at all, in the original
    /// question order. Feeds the redo-mistakes flow.
    pub wrong_question_ids: Vec<String>,
}
