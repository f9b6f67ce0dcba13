const TRUE_MARKERS: [&str; 3] = ["正确", "对", "TRUE"];
const FALSE_MARKERS: [&str; 3] = ["错误", "错", "FALSE"];

/// Collapses every run of whitespace into one space and trims both ends.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical answer token for a raw answer string.
///
/// Rules, first match wins:
/// 1. empty after [`normalize_text`] gives an empty token;
/// 2. every Latin letter in the upper-cased text, concatenated in order
///    ("B, D" gives "BD", "Answer: B" gives "ANSWERB");
/// 3. a true marker gives "T";
/// 4. a false marker gives "F";
/// 5. otherwise the normalized text itself.
///
/// Letters are checked before the true/false markers, so "正确 (C)" is
/// read as the letter answer "C".
pub fn normalize_answer(raw: &str) -> String {
    let text = normalize_text(raw);
    if text.is_empty() {
        return String::new();
    }

    let upper = text.to_uppercase();
    let letters: String = upper.chars().filter(|c| c.is_ascii_uppercase()).collect();
    if !letters.is_empty() {
        return letters;
    }

    if TRUE_MARKERS.iter().any(|m| upper.contains(m)) {
        return "T".to_string();
    }
    if FALSE_MARKERS.iter().any(|m| upper.contains(m)) {
        return "F".to_string();
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_collapses_and_trims() {
        assert_eq!(normalize_text("  1 +\n1\t=  ? "), "1 + 1 = ?");
        assert_eq!(normalize_text("\u{3000}题目\u{3000}"), "题目");
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text(" \n\t "), "");
    }

    #[test]
    fn letters_are_extracted_in_order() {
        assert_eq!(normalize_answer("B, D"), "BD");
        assert_eq!(normalize_answer("b 和 d"), "BD");
        // Every Latin letter counts, words included.
        assert_eq!(normalize_answer("Answer: B, D"), "ANSWERBD");
        assert_eq!(normalize_answer("my answer is c"), "MYANSWERISC");
        assert_eq!(normalize_answer("A"), "A");
        assert_eq!(normalize_answer(" a c d "), "ACD");
    }

    #[test]
    fn true_false_markers() {
        assert_eq!(normalize_answer("正确"), "T");
        assert_eq!(normalize_answer("对"), "T");
        assert_eq!(normalize_answer("错误"), "F");
        assert_eq!(normalize_answer("错"), "F");
    }

    #[test]
    fn letters_win_over_markers() {
        // "TRUE" is itself made of letters.
        assert_eq!(normalize_answer("true"), "TRUE");
        assert_eq!(normalize_answer("正确 (C)"), "C");
    }

    #[test]
    fn empty_and_free_text() {
        assert_eq!(normalize_answer(""), "");
        assert_eq!(normalize_answer("   "), "");
        assert_eq!(normalize_answer("  42 \n 17 "), "42 17");
        assert_eq!(normalize_answer("√"), "√");
    }

    #[test]
    fn answer_normalization_is_idempotent() {
        let samples = [
            "",
            "Answer: B, D",
            "正确",
            "错误",
            "true",
            "  free\ttext 1 2 ",
            "√",
            "对 ",
            "ß",
        ];
        for raw in samples {
            let once = normalize_answer(raw);
            assert_eq!(normalize_answer(&once), once, "raw: {raw:?}");
        }
    }
}
