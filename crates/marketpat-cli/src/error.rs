use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] marketpat_core::ValidationError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Ingest(#[from] marketpat_core::IngestError),

    #[error(transparent)]
    Storage(#[from] marketpat_warehouse::WarehouseError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Task(_) => 1,
            Self::Validation(_) => 2,
            Self::Command(_) => 2,
            Self::Serialization(_) => 4,
            Self::Ingest(_) => 6,
            Self::Storage(_) => 7,
            Self::Io(_) => 10,
        }
    }
}
