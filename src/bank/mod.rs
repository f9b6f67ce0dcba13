pub mod error;
pub mod export;
pub mod store;

use std::sync::{Arc, Mutex};

use chrono::Utc;
use rand::Rng;

use crate::quiz::merge::merge;
use crate::quiz::shuffle::shuffle_options;
use crate::quiz::{Question, QuestionType};
use error::BankError;
use export::ExportDocument;
use store::BankStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ImportMode {
    /// Run the imported questions through the merger.
    Merge,
    /// Store the imported questions verbatim, skipping dedup.
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectReport {
    pub collected: usize,
    pub added: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BankStats {
    pub total: usize,
    pub single: usize,
    pub multiple: usize,
    pub judge: usize,
    pub programming: usize,
}

impl BankStats {
    pub fn of(questions: &[Question]) -> Self {
        let count = |kind: QuestionType| questions.iter().filter(|q| q.kind == kind).count();
        Self {
            total: questions.len(),
            single: count(QuestionType::Single),
            multiple: count(QuestionType::Multiple),
            judge: count(QuestionType::Judge),
            programming: count(QuestionType::Programming),
        }
    }
}

/// The canonical bank. Every operation is a single read-modify-write under
/// one lock, so concurrent collections cannot clobber each other.
pub struct QuestionBank<S: BankStore> {
    store: Mutex<S>,
}

impl<S: BankStore> QuestionBank<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    fn with_store<T>(
        &self,
        op: impl FnOnce(&mut S) -> Result<T, BankError>,
    ) -> Result<T, BankError> {
        let mut store = self.store.lock().map_err(|_| BankError::Poisoned)?;
        op(&mut *store)
    }

    pub fn questions(&self) -> Result<Vec<Question>, BankError> {
        self.with_store(|store| store.get())
    }

    pub fn stats(&self) -> Result<BankStats, BankError> {
        Ok(BankStats::of(&self.questions()?))
    }

    pub fn collect(&self, candidates: Vec<Question>) -> Result<CollectReport, BankError> {
        let collected = candidates.len();
        self.with_store(|store| {
            let existing = store.get()?;
            let before = existing.len();
            let merged = merge(existing, candidates);
            store.set(&merged)?;

            let report = CollectReport {
                collected,
                added: merged.len().saturating_sub(before),
                total: merged.len(),
            };
            log::info!(
                "Collected {} candidates: {} new, {} in bank",
                report.collected,
                report.added,
                report.total
            );
            Ok(report)
        })
    }

    pub fn clear(&self) -> Result<(), BankError> {
        self.with_store(|store| store.set(&[]))?;
        log::info!("Question bank cleared");
        Ok(())
    }

    pub fn export(&self, version: &str) -> Result<ExportDocument, BankError> {
        let questions = self.questions()?;
        if questions.is_empty() {
            return Err(BankError::EmptyBank);
        }
        log::info!("Exporting {} questions", questions.len());
        Ok(ExportDocument::new(version, Utc::now(), questions))
    }

    pub fn export_json(&self, version: &str) -> Result<String, BankError> {
        self.export(version)?.to_json()
    }

    /// Returns the number of questions in the bank afterwards.
    pub fn import(&self, questions: Vec<Question>, mode: ImportMode) -> Result<usize, BankError> {
        let imported = questions.len();
        let total = self.with_store(|store| {
            let next = match mode {
                ImportMode::Merge => merge(store.get()?, questions),
                ImportMode::Replace => questions,
            };
            store.set(&next)?;
            Ok(next.len())
        })?;
        log::info!("Imported {} questions ({:?}), bank now holds {}", imported, mode, total);
        Ok(total)
    }

    /// Shuffles the options of every stored question and persists the result.
    pub fn shuffle_all<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<usize, BankError> {
        self.with_store(|store| {
            let mut questions = store.get()?;
            if questions.is_empty() {
                return Err(BankError::EmptyBank);
            }
            for question in questions.iter_mut() {
                shuffle_options(question, rng);
            }
            store.set(&questions)?;
            log::info!("Shuffled options of {} questions", questions.len());
            Ok(questions.len())
        })
    }
}

/// Runs a bank operation on tokio's blocking pool, keeping file I/O and
/// lock waits off the async workers.
pub async fn run_blocking<S, T, F>(bank: &Arc<QuestionBank<S>>, op: F) -> Result<T, BankError>
where
    S: BankStore + Send + 'static,
    T: Send + 'static,
    F: FnOnce(&QuestionBank<S>) -> Result<T, BankError> + Send + 'static,
{
    let bank = Arc::clone(bank);
    tokio::task::spawn_blocking(move || op(&bank)).await?
}
