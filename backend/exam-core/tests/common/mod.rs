use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use examforge_core::models::question::{Difficulty, QuestionOption, QuestionType};
use examforge_core::{Question, ResultSink, SessionRecord};

pub fn init_tracing() {
    // Initialize tracing for tests
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn question(id: &str, question_type: QuestionType, answer: &str) -> Question {
    Question {
        id: id.to_string(),
        question_type,
        content: format!("Question {}", id),
        options: vec![
            QuestionOption {
                label: "A".to_string(),
                content: "first option".to_string(),
            },
            QuestionOption {
                label: "B".to_string(),
                content: "second option".to_string(),
            },
        ],
        answer: answer.to_string(),
        difficulty: Difficulty::Medium,
        explanation: None,
        topic_id: None,
    }
}

/// Ten single-choice questions, ids "1".."10", all with canonical answer "A".
pub fn sample_bank() -> Vec<Question> {
    (1..=10)
        .map(|i| question(&i.to_string(), QuestionType::SingleChoice, "A"))
        .collect()
}

/// Sink that remembers every record it is handed.
#[derive(Default)]
pub struct RecordingSink {
    records: Mutex<Vec<SessionRecord>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Vec<SessionRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultSink for RecordingSink {
    async fn save_result(&self, record: &SessionRecord) -> Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Sink whose writes always fail, standing in for a broken backend.
pub struct FailingSink;

#[async_trait]
impl ResultSink for FailingSink {
    async fn save_result(&self, _record: &SessionRecord) -> Result<()> {
        Err(anyhow!("storage unavailable"))
    }
}

pub fn recording_sink() -> Arc<RecordingSink> {
    Arc::new(RecordingSink::new())
}
