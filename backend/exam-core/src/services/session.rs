use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::metrics::{
    ANSWERS_RECORDED_TOTAL, RESULTS_SAVED_TOTAL, SESSIONS_ACTIVE, SESSIONS_TOTAL,
};
use crate::models::question::{ALL_TESTS_PASSED, TESTS_FAILED};
use crate::models::{Question, SessionMode, SessionRecord, SessionResult, SessionState};
use crate::services::answer_store::AnswerStore;
use crate::services::scoring;
use crate::services::session_timer::SessionTimer;

/// Host-provided persistence collaborator.
///
/// Saving happens after the session has already reached `Finished`; a
/// failure is reported and the result stays available, but the engine never
/// retries — retry policy belongs to the sink.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn save_result(&self, record: &SessionRecord) -> Result<()>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session is no longer accepting answers")]
    AlreadyFinished,
    #[error("question {0} is not part of this session")]
    UnknownQuestion(String),
}

const STATE_IN_PROGRESS: u8 = 0;
const STATE_SUBMITTING: u8 = 1;
const STATE_FINISHED: u8 = 2;
const STATE_ABANDONED: u8 = 3;

/// One attempt over a fixed question set, from start to submission.
///
/// Owns its answer store exclusively. Manual submit and timer expiry race
/// into the submitting transition; the compare-exchange on `state` is the
/// single guard that makes exactly one result and at most one sink call per
/// session, under any threading model.
pub struct PracticeSession {
    id: String,
    user_id: String,
    mode: SessionMode,
    questions: Vec<Question>,
    answers: AnswerStore,
    started_at: DateTime<Utc>,
    started_instant: Instant,
    state: AtomicU8,
    result: OnceLock<SessionResult>,
    // Immersive mode: ids graded wrong at advance time, in encounter order.
    mistakes: Mutex<Vec<String>>,
    timer: OnceLock<SessionTimer>,
    sink: Option<Arc<dyn ResultSink>>,
}

enum SubmitOutcome {
    Won {
        result: SessionResult,
        answers: HashMap<String, String>,
    },
    AlreadyTriggered,
}

impl PracticeSession {
    /// Untimed session (standard or immersive practice).
    pub fn new(
        user_id: impl Into<String>,
        mode: SessionMode,
        questions: Vec<Question>,
        sink: Option<Arc<dyn ResultSink>>,
    ) -> Arc<Self> {
        let session = Arc::new(Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            mode,
            questions,
            answers: AnswerStore::new(),
            started_at: Utc::now(),
            started_instant: Instant::now(),
            state: AtomicU8::new(STATE_IN_PROGRESS),
            result: OnceLock::new(),
            mistakes: Mutex::new(Vec::new()),
            timer: OnceLock::new(),
            sink,
        });

        SESSIONS_TOTAL.with_label_values(&["created"]).inc();
        SESSIONS_ACTIVE.inc();
        tracing::info!(
            "Session created: {} for user: {} ({} questions, mode={})",
            session.id,
            session.user_id,
            session.questions.len(),
            session.mode.as_label()
        );

        session
    }

    /// Timed exam session: arms the countdown, expiry auto-submits.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start_exam(
        user_id: impl Into<String>,
        questions: Vec<Question>,
        duration_seconds: u32,
        config: &EngineConfig,
        sink: Option<Arc<dyn ResultSink>>,
    ) -> Arc<Self> {
        let session = Self::new(user_id, SessionMode::Exam, questions, sink);

        let weak: Weak<PracticeSession> = Arc::downgrade(&session);
        let timer = SessionTimer::start(
            duration_seconds,
            config.timer_critical_threshold_seconds,
            move || {
                if let Some(session) = weak.upgrade() {
                    tracing::info!("Timer expired, auto-submitting: session={}", session.id);
                    session.request_submit();
                }
            },
        );
        let _ = session.timer.set(timer);

        session
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn state(&self) -> SessionState {
        match self.state.load(Ordering::SeqCst) {
            STATE_IN_PROGRESS => SessionState::InProgress,
            STATE_SUBMITTING => SessionState::Submitting,
            STATE_ABANDONED => SessionState::Abandoned,
            _ => SessionState::Finished,
        }
    }

    pub fn answered_count(&self) -> usize {
        self.answers.answered_count()
    }

    pub fn answer_for(&self, question_id: &str) -> Option<String> {
        self.answers.get_answer(question_id)
    }

    /// Seconds left on the countdown; `None` for untimed sessions.
    pub fn remaining_seconds(&self) -> Option<u32> {
        self.timer.get().map(SessionTimer::remaining_seconds)
    }

    /// Whether the countdown is inside the warning window.
    pub fn is_critical(&self) -> bool {
        self.timer.get().map(SessionTimer::is_critical).unwrap_or(false)
    }

    /// Records the learner's current response; later writes overwrite.
    pub fn record_answer(&self, question_id: &str, value: &str) -> Result<(), SessionError> {
        if self.state.load(Ordering::SeqCst) != STATE_IN_PROGRESS {
            return Err(SessionError::AlreadyFinished);
        }
        self.answers.set_answer(question_id, value);
        ANSWERS_RECORDED_TOTAL
            .with_label_values(&[self.mode.as_label()])
            .inc();
        Ok(())
    }

    /// Records the external sandbox verdict for a coding challenge. The
    /// engine never executes code; it only keeps the reported outcome.
    pub fn record_grading_verdict(
        &self,
        question_id: &str,
        all_tests_passed: bool,
    ) -> Result<(), SessionError> {
        let value = if all_tests_passed {
            ALL_TESTS_PASSED
        } else {
            TESTS_FAILED
        };
        self.record_answer(question_id, value)
    }

    /// Immersive flow: grades the current answer immediately and remembers
    /// a mistake before the learner moves on. Returns whether the recorded
    /// answer was correct; excluded types always report `true` here since
    /// they cannot be graded in place.
    pub fn grade_and_advance(&self, question_id: &str) -> Result<bool, SessionError> {
        if self.state.load(Ordering::SeqCst) != STATE_IN_PROGRESS {
            return Err(SessionError::AlreadyFinished);
        }
        let question = self
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| SessionError::UnknownQuestion(question_id.to_string()))?;

        if !question.question_type.is_auto_graded() {
            return Ok(true);
        }

        let given = self.answers.get_answer(question_id);
        let correct = scoring::is_answer_correct(question, given.as_deref());
        if !correct {
            let mut mistakes = self.mistakes.lock().unwrap_or_else(|e| e.into_inner());
            if !mistakes.iter().any(|id| id == &question.id) {
                mistakes.push(question.id.clone());
            }
        }
        Ok(correct)
    }

    /// Mistakes accumulated so far by the immersive flow.
    pub fn mistakes_so_far(&self) -> Vec<String> {
        self.mistakes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Submit trigger (manual or timer expiry). The first trigger wins and
    /// produces the session's single result; later calls are a no-op that
    /// returns the already-computed result. The persistence save runs in
    /// the background and never blocks reaching `Finished`.
    pub fn request_submit(&self) -> Option<SessionResult> {
        match self.begin_submit() {
            SubmitOutcome::Won { result, answers } => {
                if let Some(sink) = self.sink.clone() {
                    let record = self.record_for(&result, answers);
                    tokio::spawn(async move {
                        save_record(sink, record).await;
                    });
                }
                Some(result)
            }
            SubmitOutcome::AlreadyTriggered => self.result.get().cloned(),
        }
    }

    /// Like [`request_submit`](Self::request_submit) but awaits the sink.
    /// A sink failure is reported and the session still finishes with its
    /// result intact.
    pub async fn submit_and_wait(&self) -> Option<SessionResult> {
        match self.begin_submit() {
            SubmitOutcome::Won { result, answers } => {
                if let Some(sink) = self.sink.clone() {
                    let record = self.record_for(&result, answers);
                    save_record(sink, record).await;
                }
                Some(result)
            }
            SubmitOutcome::AlreadyTriggered => self.result.get().cloned(),
        }
    }

    /// The single test-and-set transition. Elapsed time is captured here,
    /// before any persistence I/O, so it reflects true wall time.
    fn begin_submit(&self) -> SubmitOutcome {
        let won = self
            .state
            .compare_exchange(
                STATE_IN_PROGRESS,
                STATE_SUBMITTING,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();
        if !won {
            return SubmitOutcome::AlreadyTriggered;
        }

        if let Some(timer) = self.timer.get() {
            timer.stop();
        }

        let time_taken_seconds =
            u32::try_from(self.started_instant.elapsed().as_secs()).unwrap_or(u32::MAX);
        let answers = self.answers.snapshot();
        let mut result = scoring::score(&self.questions, &answers);
        result.time_taken_seconds = time_taken_seconds;

        let _ = self.result.set(result.clone());
        self.state.store(STATE_FINISHED, Ordering::SeqCst);

        SESSIONS_TOTAL.with_label_values(&["submitted"]).inc();
        SESSIONS_ACTIVE.dec();
        tracing::info!(
            "Session submitted: {} score={}/{} ({}%) in {}s",
            self.id,
            result.score,
            result.total_scored,
            result.percentage,
            result.time_taken_seconds
        );

        SubmitOutcome::Won { result, answers }
    }

    /// Exit without finishing. No scoring happens and no result is
    /// produced; any "session abandoned" bookkeeping is the caller's.
    pub fn abandon(&self) -> bool {
        let abandoned = self
            .state
            .compare_exchange(
                STATE_IN_PROGRESS,
                STATE_ABANDONED,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();
        if abandoned {
            if let Some(timer) = self.timer.get() {
                timer.stop();
            }
            SESSIONS_TOTAL.with_label_values(&["abandoned"]).inc();
            SESSIONS_ACTIVE.dec();
            tracing::info!("Session abandoned: {}", self.id);
        }
        abandoned
    }

    /// The computed result, available once the session is finished.
    pub fn result(&self) -> Option<&SessionResult> {
        self.result.get()
    }

    /// Ordered wrong-question ids for the redo-mistakes flow.
    pub fn wrong_question_ids(&self) -> Option<&[String]> {
        self.result.get().map(|r| r.wrong_question_ids.as_slice())
    }

    /// Question subset for a redo attempt: `source` order is preserved and
    /// ids no longer resolvable in `source` are dropped.
    pub fn redo_questions(wrong_question_ids: &[String], source: &[Question]) -> Vec<Question> {
        source
            .iter()
            .filter(|q| wrong_question_ids.iter().any(|id| id == &q.id))
            .cloned()
            .collect()
    }

    /// Seeds a brand-new untimed session over this session's mistakes.
    /// Returns `None` until a result exists.
    pub fn redo_mistakes(
        &self,
        source: &[Question],
        sink: Option<Arc<dyn ResultSink>>,
    ) -> Option<Arc<Self>> {
        let result = self.result.get()?;
        let questions = Self::redo_questions(&result.wrong_question_ids, source);
        Some(Self::new(
            self.user_id.clone(),
            SessionMode::Standard,
            questions,
            sink,
        ))
    }

    fn record_for(
        &self,
        result: &SessionResult,
        answers: HashMap<String, String>,
    ) -> SessionRecord {
        SessionRecord {
            session_id: self.id.clone(),
            user_id: self.user_id.clone(),
            mode: self.mode,
            started_at: self.started_at,
            finished_at: Utc::now(),
            score: result.score,
            total_scored: result.total_scored,
            answers,
        }
    }
}

async fn save_record(sink: Arc<dyn ResultSink>, record: SessionRecord) {
    match sink.save_result(&record).await {
        Ok(()) => {
            RESULTS_SAVED_TOTAL.with_label_values(&["success"]).inc();
            tracing::info!("Session result saved: session={}", record.session_id);
        }
        Err(e) => {
            RESULTS_SAVED_TOTAL.with_label_values(&["error"]).inc();
            tracing::error!(
                "Failed to save result for session {}: {:#}",
                record.session_id,
                e
            );
        }
    }
}
