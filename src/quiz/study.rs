use std::borrow::Cow;

use rand::Rng;

use crate::bank::error::BankError;
use crate::quiz::normalize::{normalize_answer, normalize_text};
use crate::quiz::shuffle::{shuffle_options, split_option, ParsedOption};
use crate::quiz::{Question, QuestionType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TypeFilter {
    #[default]
    All,
    Only(QuestionType),
}

impl TypeFilter {
    pub fn matches(&self, question: &Question) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Only(kind) => question.kind == *kind,
        }
    }
}

pub fn filter_questions(questions: &[Question], filter: TypeFilter) -> Vec<Question> {
    questions
        .iter()
        .filter(|q| filter.matches(q))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Wrong,
    /// No correct option can be derived from the stored answer.
    Undecidable,
}

/// Options the learner picks from. Judge questions collected without
/// explicit options are answered with T or F.
pub fn effective_options(question: &Question) -> Cow<'_, [String]> {
    if question.kind == QuestionType::Judge && question.options.is_empty() {
        Cow::Owned(vec!["T".to_string(), "F".to_string()])
    } else {
        Cow::Borrowed(question.options.as_slice())
    }
}

/// Positions of the options the stored answer points at. Every option is
/// read as `(letter, body)`, with unlabelled options taking the letter of
/// their position, and is correct when the answer contains its letter.
pub fn correct_indices(question: &Question) -> Vec<usize> {
    if question.kind == QuestionType::Programming {
        return vec![];
    }
    let answer = question.answer.trim().to_uppercase();
    if answer.is_empty() {
        return vec![];
    }
    let options = effective_options(question);
    let parsed: Vec<ParsedOption> = options
        .iter()
        .enumerate()
        .map(|(i, o)| split_option(o, i))
        .collect();

    if question.kind == QuestionType::Judge {
        // "T" / "F" against options such as "T", "正确" or "B. 错误".
        let by_token = options.iter().zip(parsed.iter()).position(|(o, p)| {
            o.trim().eq_ignore_ascii_case(&answer)
                || normalize_answer(o) == answer
                || normalize_answer(&p.body) == answer
        });
        if let Some(i) = by_token {
            return vec![i];
        }
    }

    parsed
        .iter()
        .enumerate()
        .filter(|(_, p)| answer.contains(p.letter))
        .map(|(i, _)| i)
        .collect()
}

/// What a learner sees when asking for the answer: the correct options, or
/// the stored answer when no option can be matched.
pub fn reveal_answer(question: &Question) -> String {
    let options = effective_options(question);
    let correct = correct_indices(question);
    if !correct.is_empty() {
        return correct
            .iter()
            .map(|&i| options[i].as_str())
            .collect::<Vec<_>>()
            .join("\n");
    }
    if question.answer.is_empty() {
        "No answer recorded for this question".to_string()
    } else {
        question.answer.clone()
    }
}

pub fn check_answer(question: &Question, selected: &[usize]) -> Verdict {
    let mut correct = correct_indices(question);
    if correct.is_empty() {
        return Verdict::Undecidable;
    }

    let is_correct = if question.kind == QuestionType::Multiple {
        let mut selected = selected.to_vec();
        selected.sort_unstable();
        selected.dedup();
        correct.sort_unstable();
        correct.dedup();
        selected == correct
    } else {
        selected.len() == 1 && selected[0] == correct[0]
    };

    if is_correct {
        Verdict::Correct
    } else {
        Verdict::Wrong
    }
}

/// Reads a learner's reply as option positions. The reply may be the full
/// text of an option (a keyboard button) or a run of letters such as "AC".
pub fn parse_selection(question: &Question, reply: &str) -> Option<Vec<usize>> {
    let reply = normalize_text(reply);
    if reply.is_empty() {
        return None;
    }
    let options = effective_options(question);

    if let Some(i) = options.iter().position(|o| normalize_text(o) == reply) {
        return Some(vec![i]);
    }

    if question.kind == QuestionType::Judge {
        let token = normalize_answer(&reply);
        return options
            .iter()
            .position(|o| normalize_answer(o) == token || o.trim().eq_ignore_ascii_case(&token))
            .map(|i| vec![i]);
    }

    let letters: Vec<char> = options
        .iter()
        .enumerate()
        .map(|(i, o)| split_option(o, i).letter)
        .collect();
    let mut picked = Vec::new();
    for c in reply.chars().filter(|c| !c.is_whitespace() && *c != ',') {
        let letter = c.to_ascii_uppercase();
        let index = letters.iter().position(|&l| l == letter)?;
        picked.push(index);
    }
    if picked.is_empty() {
        None
    } else {
        Some(picked)
    }
}

/// Text shown for one question: type, provenance, statement and options.
pub fn render_question(question: &Question, number: usize) -> String {
    let mut text = format!("Question #{} · {}", number, question.kind.label());
    if !question.source.is_empty() {
        text.push_str(&format!(" · {}", question.source));
    }
    text.push_str("\n\n");
    text.push_str(&question.title);

    if question.kind != QuestionType::Programming {
        for option in question.options.iter() {
            text.push('\n');
            text.push_str(option);
        }
    }
    text
}

/// One pass through a filtered slice of the bank.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StudySession {
    pub questions: Vec<Question>,
    pub position: usize,
    pub score: usize,
    pub scored: usize,
}

impl StudySession {
    /// With `shuffle` set, every question gets its options reordered
    /// independently, the same as "shuffle all".
    pub fn new<R: Rng + ?Sized>(
        bank: &[Question],
        filter: TypeFilter,
        shuffle: bool,
        rng: &mut R,
    ) -> Result<Self, BankError> {
        let mut questions = filter_questions(bank, filter);
        if questions.is_empty() {
            return Err(BankError::EmptyBank);
        }
        if shuffle {
            for question in questions.iter_mut() {
                shuffle_options(question, rng);
            }
        }
        Ok(Self {
            questions,
            position: 0,
            score: 0,
            scored: 0,
        })
    }

    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.position)
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.questions.len()
    }

    /// Reveals the answer of the current question and moves on without
    /// scoring it.
    pub fn reveal(&mut self) -> Option<String> {
        let text = reveal_answer(self.current()?);
        self.record(Verdict::Undecidable);
        Some(text)
    }

    /// Records the verdict for the current question and moves on.
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Correct => {
                self.score += 1;
                self.scored += 1;
            }
            Verdict::Wrong => self.scored += 1,
            Verdict::Undecidable => {}
        }
        self.position += 1;
    }
}
