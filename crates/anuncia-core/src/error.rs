use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Ingest error: {0}")]
    Ingest(#[from] crate::ingest::IngestError),

    #[error("no usable records in input")]
    EmptyDataset,

    #[error("Export error: {0}")]
    Export(#[from] crate::export::ExportError),

    #[error("Invalid record status: {0}")]
    InvalidStatus(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
