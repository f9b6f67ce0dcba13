use std::collections::HashSet;

use crate::quiz::normalize::{normalize_answer, normalize_text};
use crate::quiz::Question;

/// `type|title|options joined by "||"|answer|source`, computed on a
/// question whose fields are already normalized.
pub fn identity_key(question: &Question) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        question.kind.as_str(),
        question.title,
        question.options.join("||"),
        question.answer,
        question.source
    )
}

fn canonicalize(question: Question) -> Question {
    Question {
        title: normalize_text(&question.title),
        options: question.options.iter().map(|o| normalize_text(o)).collect(),
        answer: normalize_answer(&question.answer),
        ..question
    }
}

/// Merges `incoming` into `existing`, keeping the first question seen for
/// every identity key. Questions without a title are dropped. The result
/// keeps the order in which keys were first seen and holds the normalized
/// form of every question.
pub fn merge(existing: Vec<Question>, incoming: Vec<Question>) -> Vec<Question> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged: Vec<Question> = Vec::with_capacity(existing.len() + incoming.len());

    for question in existing.into_iter().chain(incoming) {
        let question = canonicalize(question);
        if question.title.is_empty() {
            log::debug!("Skipping a candidate without a title");
            continue;
        }
        if seen.insert(identity_key(&question)) {
            merged.push(question);
        }
    }

    merged
}
