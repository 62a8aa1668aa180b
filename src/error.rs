use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, QuizError>;

#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("Record '{record}' is corrupted: {reason}")]
    DataCorruption { record: String, reason: String },

    #[error("Invalid question catalog: {0}")]
    InvalidCatalog(String),

    #[error("Unacceptable username: {0:?}")]
    InvalidUsername(String),

    #[error("Not a record name: {0}")]
    InvalidRecordName(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to create application data folder {path:?}: {source}")]
    AppDataRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QuizError {
    pub(crate) fn corrupted(record: impl Into<String>, reason: impl ToString) -> Self {
        QuizError::DataCorruption {
            record: record.into(),
            reason: reason.to_string(),
        }
    }
}
