use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::driver::UsbError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PrinterError {
    #[error("USB access is not supported on this host")]
    NotSupported,
    #[error("No device selected")]
    NoDeviceSelected,
    #[error("Access denied: {0}")]
    AccessDenied(String),
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Write failed: {0}")]
    WriteFailed(String),
    #[error("Not connected")]
    NotConnected,
    #[error("Invalid print job: {0}")]
    InvalidJob(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
}

impl PrinterError {
    /// Message shown to the operator.
    ///
    /// "No device selected", "access denied" and "connection failed" never
    /// share wording, so a caller can tell retry-the-picker apart from
    /// close-the-other-app apart from replug-the-device.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotSupported => "USB printing is not supported on this host.".to_string(),
            Self::NoDeviceSelected => {
                "No printer selected. Please select your thermal printer.".to_string()
            }
            Self::AccessDenied(_) => {
                "Access denied. Please ensure the printer is not in use by another application."
                    .to_string()
            }
            Self::ConnectionFailed(detail) => format!("Printer connection failed: {detail}"),
            Self::WriteFailed(_) => {
                "Failed to send data to printer. Please reconnect.".to_string()
            }
            Self::NotConnected => "Printer not connected. Please connect first.".to_string(),
            Self::InvalidJob(detail) => format!("Invalid print job: {detail}"),
            Self::Encode(detail) => format!("Label encoding failed: {detail}"),
        }
    }
}

impl From<UsbError> for PrinterError {
    fn from(err: UsbError) -> Self {
        match err {
            UsbError::NoDeviceSelected => Self::NoDeviceSelected,
            UsbError::AccessDenied(detail) => Self::AccessDenied(detail),
            UsbError::Transfer(detail) => Self::WriteFailed(detail),
            other @ (UsbError::NoPrintingInterface
            | UsbError::Disconnected
            | UsbError::Other(_)) => Self::ConnectionFailed(other.to_string()),
        }
    }
}

/// Snapshot of the connection, produced after every connect/disconnect attempt
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterStatus {
    pub connected: bool,
    pub printer_name: Option<String>,
    pub error: Option<String>,
}

impl PrinterStatus {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn connected(printer_name: impl Into<String>) -> Self {
        Self {
            connected: true,
            printer_name: Some(printer_name.into()),
            error: None,
        }
    }

    pub fn failed(error: &PrinterError) -> Self {
        Self {
            connected: false,
            printer_name: None,
            error: Some(error.user_message()),
        }
    }
}

/// Result of a print request as reported to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PrintOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: &PrinterError) -> Self {
        Self {
            success: false,
            error: Some(error.user_message()),
        }
    }
}

impl From<Result<(), PrinterError>> for PrintOutcome {
    fn from(result: Result<(), PrinterError>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self::failed(&e),
        }
    }
}
