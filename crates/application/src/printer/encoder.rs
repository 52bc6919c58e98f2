use domain::{LabelConfig, LabelData, PrinterDialect};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EncodeError {
    #[error("Barcode is empty")]
    EmptyBarcode,
    #[error("Barcode too long: {0} bytes (max 255)")]
    BarcodeTooLong(usize),
    #[error("Label too small: {0}")]
    LabelTooSmall(String),
    #[error("Text cannot be encoded: {0}")]
    UnsupportedText(String),
}

/// Payloads for one physical label. Every chunk is one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopySequence {
    pub chunks: Vec<Vec<u8>>,
}

/// Everything a dialect needs sent for one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedJob {
    pub dialect: PrinterDialect,
    /// Host-side copies. A dialect that replicates on the printer emits one.
    pub sequences: Vec<CopySequence>,
}

impl EncodedJob {
    pub fn transfer_count(&self) -> usize {
        self.sequences.iter().map(|s| s.chunks.len()).sum()
    }

    pub fn total_bytes(&self) -> usize {
        self.sequences
            .iter()
            .flat_map(|s| s.chunks.iter())
            .map(Vec::len)
            .sum()
    }
}

/// Turns one label job into printer commands. Pure: no I/O.
pub trait LabelEncoder: Send + Sync {
    fn dialect(&self) -> PrinterDialect;

    fn encode(&self, data: &LabelData, config: &LabelConfig) -> Result<EncodedJob, EncodeError>;
}
