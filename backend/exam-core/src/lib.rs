//! In-process domain core for an exam-preparation application: question
//! model, practice/exam session lifecycle, scoring, timers, randomized set
//! building, homework progress and unlock policy.
//!
//! Transport, storage, auth and rendering stay with the host; the engine
//! only talks to the outside through the [`services::session::ResultSink`]
//! seam and plain data.

pub mod config;
pub mod metrics;
pub mod models;
pub mod services;

pub use config::EngineConfig;
pub use models::{Question, SessionMode, SessionRecord, SessionResult, SessionState};
pub use services::session::{PracticeSession, ResultSink, SessionError};
