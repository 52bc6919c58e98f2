//! Domain layer - Pure label-printing rules with no I/O
//!
//! This crate contains:
//! - Label model (LabelData, LabelConfig) and printer status
//! - Barcode symbology classification and check-digit validation
//! - Connection state machine and USB descriptor negotiation rules
//! - Transport interfaces (traits) implemented by infrastructure
//!
//! Principles:
//! - No dependencies on infrastructure
//! - Testable in isolation

pub mod barcode;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod label;
pub mod printer;

// Re-export commonly used types
pub use barcode::{BarcodeSymbology, classify};
pub use dialect::{EscPosSettings, PrinterDialect, TsplSettings};
pub use error::DomainError;
pub use label::{LabelConfig, LabelData};
pub use printer::{PrintOutcome, PrinterError, PrinterStatus};
