use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{Question, QuestionType};

/// Builds a question set from per-type quotas over `pool`, used by the
/// admin set-building tooling.
///
/// The pool is first narrowed to `topic_filter` when given. Each quota
/// bucket is shuffled uniformly and capped silently at availability —
/// a shortfall is never an error. Selections are concatenated in quota
/// order and then deduplicated by id, keeping the first occurrence, so a
/// caller-supplied pool containing duplicate ids stays safe.
pub fn select_random(
    pool: &[Question],
    quotas: &[(QuestionType, usize)],
    topic_filter: Option<&str>,
) -> Vec<Question> {
    select_random_with(pool, quotas, topic_filter, &mut rand::rng())
}

/// [`select_random`] with a caller-supplied RNG, so set building can be
/// reproduced from a seed.
pub fn select_random_with<R: Rng + ?Sized>(
    pool: &[Question],
    quotas: &[(QuestionType, usize)],
    topic_filter: Option<&str>,
    rng: &mut R,
) -> Vec<Question> {
    let filtered: Vec<&Question> = pool
        .iter()
        .filter(|q| topic_filter.map_or(true, |topic| q.topic_id.as_deref() == Some(topic)))
        .collect();

    let mut selected: Vec<Question> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for (question_type, count) in quotas {
        if *count == 0 {
            continue;
        }
        let mut candidates: Vec<&Question> = filtered
            .iter()
            .copied()
            .filter(|q| q.question_type == *question_type)
            .collect();
        candidates.shuffle(rng);
        for question in candidates.into_iter().take(*count) {
            if seen.insert(question.id.as_str()) {
                selected.push(question.clone());
            }
        }
    }

    selected
}
