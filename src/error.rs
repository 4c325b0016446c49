use thiserror::Error;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Error type returned by ingestion functions.
///
/// The two domain failures ([`IngestionError::InvalidFormat`] and
/// [`IngestionError::SchemaMismatch`]) render a fixed Portuguese message so callers can hand
/// them straight to end users.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error while reading an upload (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Workbook parsing error (corrupt or unsupported `.xlsx`/`.xls` bytes).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// CSV parsing error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Extraction schema JSON could not be decoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// At least one upload has a missing or unsupported extension. Aborts the whole batch.
    #[error("Arquivo com formato inválido")]
    InvalidFormat { file_name: String },

    /// The header row of a worksheet lacks one or more required labels.
    #[error("{message}")]
    SchemaMismatch {
        file_name: String,
        missing: Vec<String>,
        message: String,
    },

    /// The extraction schema or ingestion options were rejected.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}
