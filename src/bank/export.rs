use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::Value;

use crate::bank::error::BankError;
use crate::quiz::Question;

pub const DEFAULT_EXPORT_VERSION: &str = "1.2";

/// The interchange file: `version`, `exportTime`, `totalCount`, `questions`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: String,
    pub export_time: String,
    pub total_count: usize,
    pub questions: Vec<Question>,
}

impl ExportDocument {
    pub fn new(version: &str, exported_at: DateTime<Utc>, questions: Vec<Question>) -> Self {
        Self {
            version: version.to_string(),
            export_time: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            total_count: questions.len(),
            questions,
        }
    }

    pub fn to_json(&self) -> Result<String, BankError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("question_bank_{}.json", date.format("%Y-%m-%d"))
}

/// Uploaded bytes as text. Anything that is not UTF-8 is rejected rather
/// than patched with replacement characters.
pub fn decode_upload(data: Vec<u8>) -> Result<String, BankError> {
    String::from_utf8(data)
        .map_err(|e| BankError::ImportParse(format!("the file is not UTF-8 text ({})", e)))
}

/// Reads the `questions` array out of an exported document. Only that field
/// is required; the rest of the envelope is informational.
pub fn parse_import(json: &str) -> Result<Vec<Question>, BankError> {
    let mut value: Value =
        serde_json::from_str(json).map_err(|e| BankError::ImportParse(e.to_string()))?;
    let questions = match value.get_mut("questions").map(Value::take) {
        Some(questions @ Value::Array(_)) => questions,
        _ => return Err(BankError::ImportParse("missing `questions` array".to_string())),
    };
    serde_json::from_value(questions).map_err(|e| BankError::ImportParse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::QuestionType;
    use chrono::TimeZone;

    #[test]
    fn document_uses_interchange_field_names() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap();
        let doc = ExportDocument::new(
            DEFAULT_EXPORT_VERSION,
            at,
            vec![Question::new(QuestionType::Judge, "t", vec![], "T", "X")],
        );
        let value: Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert_eq!(value["version"], "1.2");
        assert_eq!(value["exportTime"], "2026-10-19T08:30:00.000Z");
        assert_eq!(value["totalCount"], 1);
        assert_eq!(value["questions"][0]["type"], "judge");
    }

    #[test]
    fn export_document_imports_back() {
        let questions = vec![
            Question::new(QuestionType::Single, "a", vec!["A. 1".into(), "B. 2".into()], "B", "X"),
            Question::new(QuestionType::Programming, "b", vec![], "", "PTA"),
        ];
        let doc = ExportDocument::new("1.2", Utc::now(), questions.clone());
        assert_eq!(parse_import(&doc.to_json().unwrap()).unwrap(), questions);
    }

    #[test]
    fn bare_questions_object_is_accepted() {
        let parsed = parse_import(r#"{"questions":[{"title":"x"}]}"#).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].kind, QuestionType::Single);
    }

    #[test]
    fn malformed_imports_are_rejected() {
        for bad in ["", "not json", "[]", r#"{"questions":{}}"#, r#"{"version":"1.2"}"#, r#"{"questions":[{"type":"essay","title":"x"}]}"#] {
            assert!(matches!(parse_import(bad), Err(BankError::ImportParse(_))), "input: {bad:?}");
        }
    }

    #[test]
    fn file_name_carries_the_date() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(export_file_name(date), "question_bank_2026-10-19.json");
    }

    #[test]
    fn uploads_must_be_utf8() {
        let text = "{\"questions\": []}".as_bytes().to_vec();
        assert_eq!(decode_upload(text).unwrap(), "{\"questions\": []}");

        let latin1 = vec![b'{', 0xe9, 0xff, 0xfe, b'}'];
        let err = decode_upload(latin1).unwrap_err();
        assert!(matches!(err, BankError::ImportParse(_)));
        assert!(err.is_user_facing());
    }
}
