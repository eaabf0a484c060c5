use thiserror::Error;

pub type TableResult<T> = Result<T, TableError>;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("No column named '{name}'")]
    MissingColumn { name: String },

    #[error("Column '{name}' already exists")]
    DuplicateColumn { name: String },

    #[error("Shape mismatch: {what}")]
    Shape { what: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] ns_core::NsError),
}
