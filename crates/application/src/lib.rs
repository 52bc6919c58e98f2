//! Application layer - Label encoding, connection management and print jobs

pub mod printer;

pub use printer::{LabelPrinter, PrinterManager};
