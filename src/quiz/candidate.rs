use serde_json::Value;

use crate::bank::error::BankError;
use crate::quiz::normalize::{normalize_answer, normalize_text};
use crate::quiz::{Question, QuestionType};

const ANSWER_MARKERS: [&str; 5] = ["正确答案", "我的答案", "Answer:", "answer:", "ANSWER:"];

/// A question-shaped record as an extraction source hands it over. Nothing
/// here is trusted: any field may be missing or have the wrong JSON type.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct RawCandidate {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, alias = "typeHint")]
    pub type_hint: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub options: Value,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl RawCandidate {
    /// Turns the record into a typed candidate, or `None` when it has no
    /// usable title.
    pub fn into_question(self, default_source: &str) -> Option<Question> {
        let title = normalize_text(self.title.as_deref().unwrap_or_default());
        let title = strip_type_label(&title);
        if title.is_empty() {
            return None;
        }

        let kind = match self.kind.as_deref() {
            Some(tag) => QuestionType::parse(tag).unwrap_or_else(|| QuestionType::from_hint(tag)),
            None => QuestionType::from_hint(self.type_hint.as_deref().unwrap_or_default()),
        };

        let (title, inline_answer) = split_inline_answer(title);
        let raw_answer = match self.answer.as_deref().map(str::trim) {
            Some(answer) if !answer.is_empty() => answer.to_string(),
            _ => inline_answer.unwrap_or_default(),
        };

        let source = self
            .source
            .map(|s| normalize_text(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default_source.to_string());

        if kind == QuestionType::Programming {
            return Some(Question::new(kind, title, vec![], normalize_text(&raw_answer), source));
        }

        let options = match self.options {
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(normalize_text)
                .filter(|o| !o.is_empty())
                .collect(),
            _ => vec![],
        };

        Some(Question::new(kind, title, options, canonical_answer(&raw_answer), source))
    }
}

fn canonical_answer(raw: &str) -> String {
    match raw.trim() {
        "√" | "✓" => "T".to_string(),
        "×" | "✗" => "F".to_string(),
        other => normalize_answer(other),
    }
}

/// Drops a leading "【单选题】"-style label.
fn strip_type_label(title: &str) -> String {
    if let Some(rest) = title.strip_prefix('【') {
        if let Some(end) = rest.find('】') {
            return rest[end + '】'.len_utf8()..].trim().to_string();
        }
    }
    title.to_string()
}

/// Finds "正确答案: B" style markers left inside a title and splits them off.
fn split_inline_answer(title: String) -> (String, Option<String>) {
    for marker in ANSWER_MARKERS {
        let Some(start) = title.find(marker) else {
            continue;
        };
        let after = title[start + marker.len()..]
            .trim_start_matches(|c: char| c == ':' || c == '：' || c.is_whitespace());

        let token: String = match after.chars().next() {
            Some(c @ ('√' | '×' | '对' | '错')) => c.to_string(),
            _ => after.chars().take_while(|c| c.is_ascii_alphabetic()).collect(),
        };
        if token.is_empty() {
            continue;
        }

        let stripped = title[..start].trim().to_string();
        if stripped.is_empty() {
            return (title, Some(token));
        }
        return (stripped, Some(token));
    }
    (title, None)
}

/// Parses an extraction payload: either a JSON array of candidates or an
/// object with a `questions` array. Unusable records are dropped.
pub fn parse_candidates(json: &str, default_source: &str) -> Result<Vec<Question>, BankError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| BankError::ImportParse(e.to_string()))?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("questions") {
            Some(Value::Array(items)) => items,
            _ => return Err(BankError::ImportParse("missing `questions` array".to_string())),
        },
        _ => return Err(BankError::ImportParse("expected an array of questions".to_string())),
    };

    let total = items.len();
    let questions: Vec<Question> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RawCandidate>(item) {
            Ok(raw) => raw.into_question(default_source),
            Err(e) => {
                log::debug!("Dropping an unreadable candidate: {}", e);
                None
            }
        })
        .collect();

    if questions.len() < total {
        log::warn!("Dropped {} of {} candidates", total - questions.len(), total);
    }
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawCandidate {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn complete_candidate_is_normalized() {
        let q = raw(r#"{"type":"multiple","title":" 选出 \n 质数 ","options":["A. 2"," B.  4","C. 5",""],"answer":"A, C","source":"PTA"}"#)
            .into_question("fallback")
            .unwrap();
        assert_eq!(q.kind, QuestionType::Multiple);
        assert_eq!(q.title, "选出 质数");
        assert_eq!(q.options, vec!["A. 2", "B. 4", "C. 5"]);
        assert_eq!(q.answer, "AC");
        assert_eq!(q.source, "PTA");
    }

    #[test]
    fn missing_title_is_malformed() {
        assert!(raw(r#"{"options":["A. 1"]}"#).into_question("x").is_none());
        assert!(raw(r#"{"title":"【单选题】  "}"#).into_question("x").is_none());
    }

    #[test]
    fn type_label_is_stripped_and_hint_used() {
        let q = raw(r#"{"title":"【判断题】地球是圆的","typeHint":"判断题","answer":"对"}"#)
            .into_question("超星章节")
            .unwrap();
        assert_eq!(q.title, "地球是圆的");
        assert_eq!(q.kind, QuestionType::Judge);
        assert_eq!(q.answer, "T");
        assert_eq!(q.source, "超星章节");
    }

    #[test]
    fn completion_becomes_programming_without_options() {
        let q = raw(r#"{"type":"completion","title":"Implement f","options":["x","y"],"answer":" "}"#)
            .into_question("PTA")
            .unwrap();
        assert_eq!(q.kind, QuestionType::Programming);
        assert!(q.options.is_empty());
        assert_eq!(q.answer, "");
    }

    #[test]
    fn inline_answer_markers_are_used_when_answer_missing() {
        let q = raw(r#"{"title":"1+1=? 正确答案：B","options":["A. 1","B. 2"]}"#)
            .into_question("x")
            .unwrap();
        assert_eq!(q.title, "1+1=?");
        assert_eq!(q.answer, "B");

        let judge = raw(r#"{"type":"judge","title":"水是湿的 正确答案: √"}"#)
            .into_question("x")
            .unwrap();
        assert_eq!(judge.answer, "T");
    }

    #[test]
    fn explicit_answer_beats_inline_marker() {
        let q = raw(r#"{"title":"q 正确答案: A","answer":"C"}"#).into_question("x").unwrap();
        assert_eq!(q.answer, "C");
        assert_eq!(q.title, "q");
    }

    #[test]
    fn non_array_options_become_empty() {
        let q = raw(r#"{"title":"q","options":"A. 1"}"#).into_question("x").unwrap();
        assert!(q.options.is_empty());
    }

    #[test]
    fn payload_shapes() {
        let from_array = parse_candidates(r#"[{"title":"a"},{"title":""},7]"#, "tg").unwrap();
        assert_eq!(from_array.len(), 1);
        assert_eq!(from_array[0].source, "tg");

        let from_doc = parse_candidates(r#"{"questions":[{"title":"a"},{"title":"b"}]}"#, "tg").unwrap();
        assert_eq!(from_doc.len(), 2);

        assert!(matches!(parse_candidates("{", "tg"), Err(BankError::ImportParse(_))));
        assert!(matches!(parse_candidates(r#"{"items":[]}"#, "tg"), Err(BankError::ImportParse(_))));
        assert!(matches!(parse_candidates("\"text\"", "tg"), Err(BankError::ImportParse(_))));
    }
}
