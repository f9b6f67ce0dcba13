pub mod candidate;
pub mod merge;
pub mod normalize;
pub mod shuffle;
pub mod study;

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[default]
    Single,
    Multiple,
    Judge,
    Programming,
}

impl QuestionType {
    pub const ALL: [QuestionType; 4] = [
        QuestionType::Single,
        QuestionType::Multiple,
        QuestionType::Judge,
        QuestionType::Programming,
    ];

    /// The tag used in identity keys and in the persisted JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Single => "single",
            QuestionType::Multiple => "multiple",
            QuestionType::Judge => "judge",
            QuestionType::Programming => "programming",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::Single => "Single choice",
            QuestionType::Multiple => "Multiple choice",
            QuestionType::Judge => "True or false",
            QuestionType::Programming => "Programming",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(tag.trim()))
    }

    /// Maps the type labels course platforms print next to a question.
    pub fn from_hint(hint: &str) -> Self {
        let hint = hint.to_lowercase();
        if hint.contains("多选") || hint.contains("multiple") {
            QuestionType::Multiple
        } else if hint.contains("判断") || hint.contains("judge") || hint.contains("true or false")
        {
            QuestionType::Judge
        } else if hint.contains("编程")
            || hint.contains("函数")
            || hint.contains("programming")
            || hint.contains("completion")
        {
            QuestionType::Programming
        } else {
            QuestionType::Single
        }
    }
}

/// A question as stored in the bank. Candidates produced by extraction have
/// the same shape but have not been through [`merge::merge`] yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    #[serde(rename = "type", default)]
    pub kind: QuestionType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub answer: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: String,
}

impl Question {
    pub fn new(
        kind: QuestionType,
        title: impl Into<String>,
        options: Vec<String>,
        answer: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            options,
            answer: answer.into(),
            source: source.into(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Label of the option at `index`: A for 0, B for 1 and so on.
pub fn option_letter(index: usize) -> char {
    char::from_u32('A' as u32 + index as u32).unwrap_or('?')
}
