use thiserror::Error;

#[derive(Error, Debug)]
pub enum BankError {
    #[error("The question bank is empty")]
    EmptyBank,

    #[error("Could not read the question data: {0}")]
    ImportParse(String),

    #[error("Bank storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bank encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("The bank lock was poisoned by a panicking writer")]
    Poisoned,

    #[error("Bank task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl BankError {
    /// Precondition failures are reported back to the user as-is; the other
    /// variants are operational faults.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, BankError::EmptyBank | BankError::ImportParse(_))
    }
}
