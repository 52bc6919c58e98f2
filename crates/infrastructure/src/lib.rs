//! Infrastructure layer - USB transport and configuration

pub mod config;
pub mod printer;

pub use config::PrinterAgentConfig;
pub use printer::{MockUsbHost, NusbHost};
