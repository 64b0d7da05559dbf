//! Tally engine
//!
//! Pure leaf logic: a poll plus the full answer history in, a fresh
//! [`TallyResult`] out. The state machine decides when to cache the result.

use super::state::{Answer, Poll, TallyResult};

/// Count votes for `poll` from the full answer history.
///
/// Answers for other polls are filtered out. An `option_index` outside the
/// poll's option range is a data-integrity violation rejected at admission;
/// encountering one here panics rather than skewing the count silently.
pub fn compute_tally(poll: &Poll, answers: &[Answer]) -> TallyResult {
    let contributing: Vec<Answer> = answers
        .iter()
        .filter(|a| a.poll_id == poll.id)
        .cloned()
        .collect();

    let mut votes = vec![0u64; poll.options.len()];
    for answer in &contributing {
        votes[answer.option_index] += 1;
    }

    TallyResult {
        poll_id: poll.id.clone(),
        question: poll.question.clone(),
        options: poll.options.clone(),
        votes,
        total_votes: contributing.len() as u64,
        answers: contributing,
    }
}
