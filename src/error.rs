use thiserror::Error;

/// Shape and contract errors. Malformed *data* is never an error anywhere in
/// this crate (coerce-or-null handles it); these variants signal a caller
/// mistake such as referencing a dropped column or supplying a mask of the
/// wrong length.
#[derive(Error, Debug)]
pub enum ScourError {
    #[error("Unknown column '{column}'")]
    UnknownColumn { column: String },

    #[error("Length mismatch: expected {expected} rows, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Keep::None marks conflicts, not survivors; use Keep::First or Keep::Last to drop duplicates")]
    InvalidKeepPolicy,

    #[error("Type mismatch on column '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScourError>;
