use std::collections::HashMap;

use crate::models::{Question, SessionResult};

/// Grades an answer set against its question list.
///
/// Pure and total: a malformed question (answer referencing no option,
/// duplicate ids, empty answer) never panics, it simply grades as not
/// correct. `code_output` questions are display-only and `coding_challenge`
/// verdicts come from the external sandbox, so neither type contributes to
/// `total_scored`.
///
/// `time_taken_seconds` is left at zero; the session controller stamps it.
pub fn score(questions: &[Question], answers: &HashMap<String, String>) -> SessionResult {
    let mut total_scored = 0u32;
    let mut correct = 0u32;
    let mut wrong_question_ids = Vec::new();

    for question in questions {
        if !question.question_type.is_auto_graded() {
            continue;
        }
        total_scored += 1;
        if is_correct(question, answers) {
            correct += 1;
        } else {
            wrong_question_ids.push(question.id.clone());
        }
    }

    SessionResult {
        score: correct,
        total_scored,
        percentage: percentage(correct, total_scored),
        time_taken_seconds: 0,
        wrong_question_ids,
    }
}

/// Exact string equality, no trimming or case folding. Unanswered is wrong.
pub fn is_correct(question: &Question, answers: &HashMap<String, String>) -> bool {
    is_answer_correct(question, answers.get(&question.id).map(String::as_str))
}

pub fn is_answer_correct(question: &Question, given: Option<&str>) -> bool {
    given == Some(question.answer.as_str())
}

/// Rounded percent of gradable questions answered correctly. A set with
/// nothing gradable reports 100.
fn percentage(correct: u32, total_scored: u32) -> u32 {
    if total_scored == 0 {
        return 100;
    }
    ((f64::from(correct) / f64::from(total_scored)) * 100.0).round() as u32
}
