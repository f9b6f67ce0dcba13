use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::bank::error::BankError;
use crate::quiz::Question;

/// Whole-bank persistence: read everything, replace everything.
pub trait BankStore {
    fn get(&self) -> Result<Vec<Question>, BankError>;
    fn set(&mut self, questions: &[Question]) -> Result<(), BankError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    questions: Vec<Question>,
}

impl BankStore for MemoryStore {
    fn get(&self) -> Result<Vec<Question>, BankError> {
        Ok(self.questions.clone())
    }

    fn set(&mut self, questions: &[Question]) -> Result<(), BankError> {
        self.questions = questions.to_vec();
        Ok(())
    }
}

/// Keeps the bank as a pretty-printed JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "question_bank.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl BankStore for JsonFileStore {
    fn get(&self) -> Result<Vec<Question>, BankError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    fn set(&mut self, questions: &[Question]) -> Result<(), BankError> {
        let data = serde_json::to_string_pretty(questions)?;
        // Write next to the target, then swap it in.
        let temp = self.temp_path();
        fs::write(&temp, data)?;
        fs::rename(&temp, &self.path)?;
        log::debug!("Wrote {} questions to {}", questions.len(), self.path.display());
        Ok(())
    }
}
