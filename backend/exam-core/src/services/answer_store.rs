use std::collections::HashMap;
use std::sync::Mutex;

/// Per-session map from question id to the learner's current response.
///
/// One current value per question; later writes overwrite earlier ones and
/// a missing entry means "unanswered". The owning session is the only
/// writer; the map is never shared across sessions.
#[derive(Debug, Default)]
pub struct AnswerStore {
    answers: Mutex<HashMap<String, String>>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites unconditionally. Validating the value against the
    /// question's options is a presentation concern, not the store's.
    pub fn set_answer(&self, question_id: &str, value: &str) {
        let mut answers = self.lock();
        answers.insert(question_id.to_string(), value.to_string());
    }

    pub fn get_answer(&self, question_id: &str) -> Option<String> {
        self.lock().get(question_id).cloned()
    }

    pub fn answered_count(&self) -> usize {
        self.lock().len()
    }

    /// Drops every recorded answer (new attempt over the same set).
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Copy of the current state, used for scoring and the persistence
    /// record.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned lock only means a writer panicked mid-insert; the map
        // itself is still usable.
        self.answers.lock().unwrap_or_else(|e| e.into_inner())
    }
}
