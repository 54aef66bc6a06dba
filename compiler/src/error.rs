use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error at line {line}, column {column}: {msg}")]
    ParseError {
        msg:    String,
        line:   usize,
        column: usize,
    },

    #[error("No root message found for app \"{0}\"")]
    NoRootMessage(String),

    #[error("Form store error: {0}")]
    Store(String),

    #[error("Record {0} must be a JSON object")]
    InvalidRecord(String),
}
