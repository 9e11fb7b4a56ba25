use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, register_int_gauge, IntCounterVec, IntGauge};

lazy_static! {
    // Business Metrics
    pub static ref SESSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "sessions_total",
        "Total number of practice sessions",
        &["status"]
    )
    .unwrap();

    pub static ref SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        "sessions_active",
        "Number of currently active sessions"
    )
    .unwrap();

    pub static ref ANSWERS_RECORDED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "answers_recorded_total",
        "Total number of answers recorded",
        &["mode"]
    )
    .unwrap();

    pub static ref RESULTS_SAVED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "results_saved_total",
        "Total number of session results handed to the persistence sink",
        &["status"]
    )
    .unwrap();
}
