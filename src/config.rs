use std::path::PathBuf;

use crate::bank::export::DEFAULT_EXPORT_VERSION;

#[derive(Debug, Clone)]
pub struct Config {
    pub bank_path: PathBuf,
    pub dialogue_db: String,
    pub export_version: String,
}

impl Config {
    /// Reads the settings from the environment (a `.env` file is loaded
    /// beforehand in `main`). Unset or blank values fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Self {
            bank_path: PathBuf::from(get("BANK_PATH", "question_bank.json")),
            dialogue_db: get("DIALOGUE_DB", "db.sqlite"),
            export_version: get("EXPORT_VERSION", DEFAULT_EXPORT_VERSION),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_apply_when_unset_or_blank() {
        let config = Config::from_lookup(|key| (key == "DIALOGUE_DB").then(|| "  ".to_string()));
        assert_eq!(config.bank_path, PathBuf::from("question_bank.json"));
        assert_eq!(config.dialogue_db, "db.sqlite");
        assert_eq!(config.export_version, "1.2");
    }

    #[test]
    fn values_are_read_from_lookup() {
        let env: HashMap<&str, &str> = [
            ("BANK_PATH", "/var/lib/bank.json"),
            ("DIALOGUE_DB", "dialogues.sqlite"),
            ("EXPORT_VERSION", "2.0"),
        ]
        .into_iter()
        .collect();
        let config = Config::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.bank_path, PathBuf::from("/var/lib/bank.json"));
        assert_eq!(config.dialogue_db, "dialogues.sqlite");
        assert_eq!(config.export_version, "2.0");
    }
}
