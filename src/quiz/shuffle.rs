use rand::seq::SliceRandom;
use rand::Rng;

use crate::quiz::{option_letter, Question, QuestionType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOption {
    pub letter: char,
    pub body: String,
}

fn is_label_separator(c: char) -> bool {
    matches!(c, '.' | '、' | '．' | '。') || c.is_whitespace()
}

/// Splits "B. Some text" into `B` and "Some text". Options without a
/// leading label get the letter of their position.
pub fn split_option(option: &str, index: usize) -> ParsedOption {
    let text = option.trim_start();
    let mut chars = text.chars();

    if let (Some(first), Some(second)) = (chars.next(), chars.next()) {
        if first.is_ascii_alphabetic() && is_label_separator(second) {
            let rest = &text[first.len_utf8()..];
            return ParsedOption {
                letter: first.to_ascii_uppercase(),
                body: rest.trim_start_matches(is_label_separator).trim().to_string(),
            };
        }
    }

    ParsedOption {
        letter: option_letter(index),
        body: option
            .trim()
            .trim_start_matches(is_label_separator)
            .to_string(),
    }
}

/// Reorders the options of `question` uniformly at random and rewrites the
/// answer so it points at the same option bodies under their new letters.
///
/// Judge and programming questions, and questions with fewer than two
/// options, are left untouched. An empty answer stays empty.
pub fn shuffle_options<R: Rng + ?Sized>(question: &mut Question, rng: &mut R) {
    if matches!(question.kind, QuestionType::Judge | QuestionType::Programming) {
        return;
    }
    if question.options.len() < 2 {
        return;
    }

    // The answer is a run of letters, so membership is a char lookup.
    let mut parsed: Vec<(ParsedOption, bool)> = question
        .options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let parsed = split_option(option, i);
            let is_correct = question.answer.contains(parsed.letter);
            (parsed, is_correct)
        })
        .collect();

    parsed.shuffle(rng);

    let mut correct_letters: Vec<char> = Vec::new();
    question.options = parsed
        .iter()
        .enumerate()
        .map(|(i, (option, is_correct))| {
            let letter = option_letter(i);
            if *is_correct {
                correct_letters.push(letter);
            }
            if option.body.is_empty() {
                format!("{}.", letter)
            } else {
                format!("{}. {}", letter, option.body)
            }
        })
        .collect();

    if question.answer.is_empty() {
        return;
    }
    question.answer = match question.kind {
        QuestionType::Multiple => correct_letters.into_iter().collect(),
        _ => correct_letters
            .first()
            .map(|c| c.to_string())
            .unwrap_or_default(),
    };
}

/// Non-mutating form of [`shuffle_options`].
pub fn shuffled<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> Question {
    let mut copy = question.clone();
    shuffle_options(&mut copy, rng);
    copy
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    fn options(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn correct_bodies(question: &Question) -> BTreeSet<String> {
        question
            .options
            .iter()
            .enumerate()
            .map(|(i, o)| split_option(o, i))
            .filter(|p| question.answer.contains(p.letter))
            .map(|p| p.body)
            .collect()
    }

    #[test]
    fn labels_are_split_from_bodies() {
        assert_eq!(
            split_option("B. Some text", 0),
            ParsedOption { letter: 'B', body: "Some text".to_string() }
        );
        assert_eq!(split_option("c、内容", 0).letter, 'C');
        assert_eq!(split_option("c、内容", 0).body, "内容");
        assert_eq!(split_option("D．. 答案", 0).body, "答案");
        assert_eq!(split_option("A.", 3).body, "");
        assert_eq!(split_option("A.", 3).letter, 'A');
    }

    #[test]
    fn unlabelled_options_take_their_position() {
        assert_eq!(
            split_option("Paris", 2),
            ParsedOption { letter: 'C', body: "Paris".to_string() }
        );
        assert_eq!(split_option(". 42 ", 0).body, "42");
        // A lone letter has no separator, so it is a body.
        assert_eq!(
            split_option("A", 1),
            ParsedOption { letter: 'B', body: "A".to_string() }
        );
    }

    #[test]
    fn single_choice_answer_follows_its_option() {
        let mut rng = StdRng::seed_from_u64(7);
        let original = Question::new(
            QuestionType::Single,
            "1+1=?",
            options(&["A. 1", "B. 2"]),
            "B",
            "X",
        );
        for _ in 0..20 {
            let q = shuffled(&original, &mut rng);
            let idx = q.options.iter().position(|o| o.ends_with(" 2")).unwrap();
            assert_eq!(q.answer, option_letter(idx).to_string());
            assert!(q.options == options(&["A. 1", "B. 2"]) || q.options == options(&["A. 2", "B. 1"]));
        }
    }

    #[test]
    fn multiple_choice_keeps_cardinality_and_content() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut q = Question::new(
            QuestionType::Multiple,
            "pick primes",
            options(&["A. 2", "B. 4", "C. 5", "D. 9", "E. 11"]),
            "ACE",
            "X",
        );
        let expected = correct_bodies(&q);
        for _ in 0..10 {
            shuffle_options(&mut q, &mut rng);
            assert_eq!(q.answer.len(), 3);
            assert_eq!(correct_bodies(&q), expected);
            let letters: Vec<char> = q.answer.chars().collect();
            let mut sorted = letters.clone();
            sorted.sort();
            assert_eq!(letters, sorted, "answer letters follow new positions");
        }
    }

    #[test]
    fn judge_and_programming_are_untouched() {
        let mut rng = StdRng::seed_from_u64(1);
        let judge = Question::new(QuestionType::Judge, "sky is blue", options(&["T", "F"]), "T", "X");
        let prog = Question::new(QuestionType::Programming, "write fizzbuzz", vec![], "", "PTA");
        assert_eq!(shuffled(&judge, &mut rng), judge);
        assert_eq!(shuffled(&prog, &mut rng), prog);
    }

    #[test]
    fn fewer_than_two_options_is_a_no_op() {
        let mut rng = StdRng::seed_from_u64(1);
        let q = Question::new(QuestionType::Single, "only", options(&["only one"]), "A", "X");
        assert_eq!(shuffled(&q, &mut rng), q);
    }

    #[test]
    fn empty_answer_stays_empty() {
        let mut rng = StdRng::seed_from_u64(3);
        let q = Question::new(
            QuestionType::Single,
            "unknown",
            options(&["red", "green", "blue"]),
            "",
            "X",
        );
        let s = shuffled(&q, &mut rng);
        assert_eq!(s.answer, "");
        assert_eq!(s.options.len(), 3);
        assert!(s.options.iter().all(|o| o.starts_with(char::is_uppercase) && o[1..].starts_with(". ")));
    }

    #[test]
    fn empty_bodies_render_as_bare_letters() {
        let mut rng = StdRng::seed_from_u64(5);
        let q = Question::new(QuestionType::Single, "labels", options(&["A.", "B."]), "A", "X");
        let s = shuffled(&q, &mut rng);
        assert_eq!(s.options, options(&["A.", "B."]));
        assert_eq!(s.answer.len(), 1);
    }

    #[test]
    fn every_ordering_shows_up() {
        let mut rng = StdRng::seed_from_u64(11);
        let q = Question::new(QuestionType::Single, "abc", options(&["x", "y", "z"]), "A", "X");
        let mut seen = BTreeSet::new();
        for _ in 0..300 {
            seen.insert(shuffled(&q, &mut rng).options);
        }
        assert_eq!(seen.len(), 6);
    }
}
