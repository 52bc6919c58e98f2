use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid label configuration: {0}")]
    InvalidLabelConfig(String),

    #[error("Invalid vendor ID: {0}")]
    InvalidVendorId(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
