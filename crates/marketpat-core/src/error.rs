use thiserror::Error;

/// Validation errors for values that cross the crate boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol is {len} characters long, max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },
    #[error("cannot derive a symbol from path '{path}'")]
    SymbolFromPath { path: String },
}

/// Field-level conversion failure. Never fatal: the offending field is
/// replaced by its default and the failure is reported alongside the value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("unable to convert '{value}' to a date, expected YYYY-MM-DD")]
    InvalidDate { value: String },
    #[error("unable to convert {field} value '{value}' to a price")]
    InvalidPrice { field: &'static str, value: String },
    #[error("{field} price '{value}' must be finite and non-negative")]
    PriceOutOfRange { field: &'static str, value: String },
    #[error("unable to convert volume '{value}' to a share count")]
    InvalidVolume { value: String },
}

impl FieldError {
    /// Name of the raw column the failure came from.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidDate { .. } => "date",
            Self::InvalidPrice { field, .. } | Self::PriceOutOfRange { field, .. } => field,
            Self::InvalidVolume { .. } => "volume",
        }
    }
}

/// Fatal ingestion failures. When one of these is returned the registry has
/// not been touched by the failed call.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unable to read row source: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("row {line} has {found} fields, expected at least 6")]
    ShortRow { line: usize, found: usize },
}
