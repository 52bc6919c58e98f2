use async_trait::async_trait;
use thiserror::Error;

use super::allowlist::VendorAllowlist;
use super::descriptor::InterfaceInfo;

/// Errors raised by a USB host stack
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UsbError {
    #[error("No device selected")]
    NoDeviceSelected,
    #[error("Access denied: {0}")]
    AccessDenied(String),
    #[error("No suitable printing interface found on the device")]
    NoPrintingInterface,
    #[error("Device disconnected")]
    Disconnected,
    #[error("Transfer failed: {0}")]
    Transfer(String),
    #[error("{0}")]
    Other(String),
}

/// Host USB stack: capability check and permission-gated device picker
#[async_trait]
pub trait UsbHost: Send + Sync {
    /// Whether this host can talk to USB devices at all
    fn is_supported(&self) -> bool;

    /// Let the user (or the host policy) pick one device matching `filters`.
    /// Returns `UsbError::NoDeviceSelected` when nothing was picked.
    async fn request_device(
        &self,
        filters: &VendorAllowlist,
    ) -> Result<Box<dyn UsbDevice>, UsbError>;
}

/// A picked device. Write-only: there is no IN path and no status read-back.
#[async_trait]
pub trait UsbDevice: Send {
    /// Product string advertised by the device
    fn product_name(&self) -> Option<String>;

    async fn open(&mut self) -> Result<(), UsbError>;

    async fn close(&mut self) -> Result<(), UsbError>;

    /// Value of the active configuration, `None` if unconfigured
    fn configuration(&self) -> Option<u8>;

    async fn select_configuration(&mut self, value: u8) -> Result<(), UsbError>;

    /// All interface alternate settings of the active configuration
    fn interfaces(&self) -> Result<Vec<InterfaceInfo>, UsbError>;

    async fn claim_interface(&mut self, interface: u8) -> Result<(), UsbError>;

    async fn select_alternate(&mut self, interface: u8, alternate: u8) -> Result<(), UsbError>;

    async fn release_interface(&mut self, interface: u8) -> Result<(), UsbError>;

    /// Bulk-OUT transfer of `data` to `endpoint`
    async fn transfer_out(&mut self, endpoint: u8, data: &[u8]) -> Result<(), UsbError>;
}
