mod ingestor;
mod normalizer;

pub use ingestor::{IngestError, IngestResult, Ingestor};
pub use normalizer::{clean_text, Normalizer};
