use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::SessionResult;

const MASTERY_MIN_ATTEMPTS: u32 = 5;
const MASTERY_MIN_PERCENTAGE: f64 = 80.0;

/// Per-user, per-assignment practice tally for homework and weekly
/// practice. Attempts are counted per gradable question, so one finished
/// session contributes its `total_scored`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub user_id: String,
    pub assignment_id: String,
    pub attempts_total: u32,
    pub correct_count: u32,
    pub percentage: f64,
    pub updated_at: DateTime<Utc>,
}

impl ProgressSummary {
    pub fn new(user_id: impl Into<String>, assignment_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            assignment_id: assignment_id.into(),
            attempts_total: 0,
            correct_count: 0,
            percentage: 0.0,
            updated_at: Utc::now(),
        }
    }

    /// Folds one graded question outcome in.
    pub fn record_attempt(&mut self, correct: bool) {
        self.attempts_total += 1;
        if correct {
            self.correct_count += 1;
        }
        self.percentage = (f64::from(self.correct_count) / f64::from(self.attempts_total)) * 100.0;
        self.updated_at = Utc::now();
    }

    /// Folds a finished session in, one attempt per gradable question.
    pub fn record_result(&mut self, result: &SessionResult) {
        self.attempts_total += result.total_scored;
        self.correct_count += result.score;
        if self.attempts_total > 0 {
            self.percentage =
                (f64::from(self.correct_count) / f64::from(self.attempts_total)) * 100.0;
        }
        self.updated_at = Utc::now();
    }

    /// An assignment counts as mastered after at least five attempts at
    /// 80% accuracy or better.
    pub fn is_mastered(&self) -> bool {
        self.attempts_total >= MASTERY_MIN_ATTEMPTS && self.percentage >= MASTERY_MIN_PERCENTAGE
    }
}
