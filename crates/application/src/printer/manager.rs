use std::sync::Arc;

use domain::driver::{
    ConnectionState, EndpointSelection, UsbDevice, UsbError, UsbHost, VendorAllowlist,
    select_bulk_out,
};
use domain::{PrinterError, PrinterStatus};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Name reported when the device has no product string
pub const DEFAULT_PRINTER_NAME: &str = "Thermal Printer";

/// Configuration selected when the device comes up unconfigured
const DEFAULT_CONFIGURATION: u8 = 1;

/// An opened device with its printing interface claimed
struct ClaimedPrinter {
    device: Box<dyn UsbDevice>,
    interface: u8,
    endpoint: u8,
    name: String,
}

#[derive(Default)]
struct Session {
    state: ConnectionState,
    printer: Option<ClaimedPrinter>,
    last_error: Option<PrinterError>,
}

/// Owns the single USB printer handle.
///
/// Connect, disconnect and send all go through one lock, so an interface
/// is never claimed twice and transfers never overlap.
pub struct PrinterManager {
    host: Arc<dyn UsbHost>,
    filters: VendorAllowlist,
    session: Mutex<Session>,
}

impl PrinterManager {
    pub fn new(host: Arc<dyn UsbHost>, filters: VendorAllowlist) -> Self {
        Self {
            host,
            filters,
            session: Mutex::new(Session::default()),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.host.is_supported()
    }

    pub fn filters(&self) -> &VendorAllowlist {
        &self.filters
    }

    pub async fn is_connected(&self) -> bool {
        self.session.lock().await.state.is_connected()
    }

    pub async fn status(&self) -> PrinterStatus {
        let session = self.session.lock().await;
        Self::snapshot(&session)
    }

    /// Pick, open and claim a printer. Any handle held so far is released first.
    pub async fn connect(&self) -> PrinterStatus {
        let mut session = self.session.lock().await;

        if !self.host.is_supported() {
            warn!("USB is not available on this host");
            session.last_error = Some(PrinterError::NotSupported);
            return Self::snapshot(&session);
        }

        if let Some(previous) = session.printer.take() {
            info!(printer = %previous.name, "Releasing current printer before reconnecting");
            Self::release(previous).await;
        }
        session.state = ConnectionState::Connecting;
        session.last_error = None;
        debug!(filters = self.filters.filters().len(), "🔌 Requesting printer");

        match self.negotiate().await {
            Ok(printer) => {
                info!(
                    printer = %printer.name,
                    interface = printer.interface,
                    endpoint = format_args!("{:#04x}", printer.endpoint),
                    "✅ Printer connected"
                );
                session.state = ConnectionState::Connected;
                session.printer = Some(printer);
            }
            Err(e) => {
                warn!(error = %e, "❌ Printer connection failed");
                session.state = session.state.to_disconnected();
                session.last_error = Some(e);
            }
        }

        Self::snapshot(&session)
    }

    /// Release the interface and close the device. Safe to call when nothing is held.
    pub async fn disconnect(&self) {
        let mut session = self.session.lock().await;
        if let Some(printer) = session.printer.take() {
            info!(printer = %printer.name, "Disconnecting printer");
            Self::release(printer).await;
        }
        session.state = session.state.to_disconnected();
        session.last_error = None;
    }

    /// Bulk-OUT transfer of one payload.
    ///
    /// A failed transfer drops the handle before the error is returned, so
    /// later sends fail with `NotConnected` without touching the device.
    pub async fn send(&self, data: &[u8]) -> Result<(), PrinterError> {
        let mut session = self.session.lock().await;
        if !session.state.is_connected() {
            return Err(PrinterError::NotConnected);
        }
        let Some(printer) = session.printer.as_mut() else {
            session.state = session.state.to_disconnected();
            return Err(PrinterError::NotConnected);
        };

        match printer.device.transfer_out(printer.endpoint, data).await {
            Ok(()) => {
                debug!(bytes = data.len(), "Payload sent");
                Ok(())
            }
            Err(e) => {
                let failed = session.printer.take();
                session.state = session.state.to_disconnected();
                let err = PrinterError::WriteFailed(e.to_string());
                session.last_error = Some(err.clone());
                error!(error = %e, bytes = data.len(), "❌ Transfer failed, printer disconnected");

                if let Some(printer) = failed {
                    Self::release(printer).await;
                }
                Err(err)
            }
        }
    }

    async fn negotiate(&self) -> Result<ClaimedPrinter, PrinterError> {
        let mut device = self.host.request_device(&self.filters).await?;
        device.open().await?;

        match Self::claim_printer_interface(device.as_mut()).await {
            Ok(selection) => {
                let name = device
                    .product_name()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_PRINTER_NAME.to_string());
                Ok(ClaimedPrinter {
                    device,
                    interface: selection.interface,
                    endpoint: selection.endpoint,
                    name,
                })
            }
            Err(e) => {
                if let Err(close_err) = device.close().await {
                    warn!(error = %close_err, "Failed to close device after negotiation error");
                }
                Err(e.into())
            }
        }
    }

    async fn claim_printer_interface(
        device: &mut dyn UsbDevice,
    ) -> Result<EndpointSelection, UsbError> {
        if device.configuration().is_none() {
            debug!("Device unconfigured, selecting configuration {DEFAULT_CONFIGURATION}");
            device.select_configuration(DEFAULT_CONFIGURATION).await?;
        }

        let interfaces = device.interfaces()?;
        let selection = select_bulk_out(&interfaces).ok_or(UsbError::NoPrintingInterface)?;
        if !selection.printer_class {
            debug!(
                interface = selection.interface,
                "No printer-class interface, using first bulk-OUT endpoint"
            );
        }

        device.claim_interface(selection.interface).await?;

        if selection.alternate != 0 {
            let selected = device
                .select_alternate(selection.interface, selection.alternate)
                .await;
            if let Err(e) = selected {
                if let Err(release_err) = device.release_interface(selection.interface).await {
                    warn!(error = %release_err, "Failed to release interface");
                }
                return Err(e);
            }
        }

        Ok(selection)
    }

    async fn release(mut printer: ClaimedPrinter) {
        if let Err(e) = printer.device.release_interface(printer.interface).await {
            warn!(error = %e, interface = printer.interface, "Failed to release interface");
        }
        if let Err(e) = printer.device.close().await {
            warn!(error = %e, "Failed to close device");
        }
    }

    fn snapshot(session: &Session) -> PrinterStatus {
        match (&session.printer, &session.last_error) {
            (Some(printer), _) if session.state.is_connected() => {
                PrinterStatus::connected(printer.name.clone())
            }
            (_, Some(err)) => PrinterStatus::failed(err),
            _ => PrinterStatus::disconnected(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use domain::driver::{EndpointInfo, InterfaceInfo, USB_CLASS_PRINTER};
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        Host {}

        #[async_trait]
        impl UsbHost for Host {
            fn is_supported(&self) -> bool;
            async fn request_device(
                &self,
                filters: &VendorAllowlist,
            ) -> Result<Box<dyn UsbDevice>, UsbError>;
        }
    }

    mock! {
        Device {}

        #[async_trait]
        impl UsbDevice for Device {
            fn product_name(&self) -> Option<String>;
            async fn open(&mut self) -> Result<(), UsbError>;
            async fn close(&mut self) -> Result<(), UsbError>;
            fn configuration(&self) -> Option<u8>;
            async fn select_configuration(&mut self, value: u8) -> Result<(), UsbError>;
            fn interfaces(&self) -> Result<Vec<InterfaceInfo>, UsbError>;
            async fn claim_interface(&mut self, interface: u8) -> Result<(), UsbError>;
            async fn select_alternate(&mut self, interface: u8, alternate: u8) -> Result<(), UsbError>;
            async fn release_interface(&mut self, interface: u8) -> Result<(), UsbError>;
            async fn transfer_out(&mut self, endpoint: u8, data: &[u8]) -> Result<(), UsbError>;
        }
    }

    fn printer_interfaces() -> Vec<InterfaceInfo> {
        vec![InterfaceInfo {
            number: 0,
            alternate: 0,
            class: USB_CLASS_PRINTER,
            endpoints: vec![EndpointInfo::bulk_in(0x01), EndpointInfo::bulk_out(0x02)],
        }]
    }

    fn host_with(device: MockDevice) -> Arc<dyn UsbHost> {
        let mut host = MockHost::new();
        host.expect_is_supported().return_const(true);
        host.expect_request_device()
            .times(1)
            .return_once(move |_| Ok(Box::new(device) as Box<dyn UsbDevice>));
        Arc::new(host)
    }

    /// Device that opens, is configured and exposes one printer interface
    fn healthy_device() -> MockDevice {
        let mut device = MockDevice::new();
        device.expect_open().times(1).returning(|| Ok(()));
        device.expect_configuration().return_const(Some(1u8));
        device.expect_interfaces().returning(|| Ok(printer_interfaces()));
        device
            .expect_claim_interface()
            .with(eq(0u8))
            .times(1)
            .returning(|_| Ok(()));
        device
            .expect_product_name()
            .return_const(Some("XP-365B".to_string()));
        device
    }

    #[tokio::test]
    async fn test_connect_claims_printer_interface() {
        let manager = PrinterManager::new(host_with(healthy_device()), VendorAllowlist::default());

        let status = manager.connect().await;

        assert_eq!(status, PrinterStatus::connected("XP-365B"));
        assert!(manager.is_connected().await);
    }

    #[tokio::test]
    async fn test_unsupported_host_reports_capability_error() {
        let mut host = MockHost::new();
        host.expect_is_supported().return_const(false);
        host.expect_request_device().never();
        let manager = PrinterManager::new(Arc::new(host), VendorAllowlist::default());

        let status = manager.connect().await;

        assert!(!status.connected);
        assert_eq!(
            status.error.as_deref(),
            Some("USB printing is not supported on this host.")
        );
    }

    #[tokio::test]
    async fn test_no_device_selected() {
        let mut host = MockHost::new();
        host.expect_is_supported().return_const(true);
        host.expect_request_device()
            .returning(|_| Err(UsbError::NoDeviceSelected));
        let manager = PrinterManager::new(Arc::new(host), VendorAllowlist::default());

        let status = manager.connect().await;

        assert_eq!(
            status.error.as_deref(),
            Some("No printer selected. Please select your thermal printer.")
        );
        assert!(!manager.is_connected().await);
    }

    #[tokio::test]
    async fn test_busy_interface_is_access_denied_and_device_closed() {
        let mut device = MockDevice::new();
        device.expect_open().returning(|| Ok(()));
        device.expect_configuration().return_const(Some(1u8));
        device.expect_interfaces().returning(|| Ok(printer_interfaces()));
        device
            .expect_claim_interface()
            .returning(|_| Err(UsbError::AccessDenied("interface busy".into())));
        device.expect_close().times(1).returning(|| Ok(()));
        let manager = PrinterManager::new(host_with(device), VendorAllowlist::default());

        let status = manager.connect().await;

        assert_eq!(
            status.error.as_deref(),
            Some("Access denied. Please ensure the printer is not in use by another application.")
        );
    }

    #[tokio::test]
    async fn test_unconfigured_device_selects_configuration_one() {
        let mut device = MockDevice::new();
        device.expect_open().returning(|| Ok(()));
        device.expect_configuration().return_const(None::<u8>);
        device
            .expect_select_configuration()
            .with(eq(1u8))
            .times(1)
            .returning(|_| Ok(()));
        device.expect_interfaces().returning(|| Ok(printer_interfaces()));
        device.expect_claim_interface().returning(|_| Ok(()));
        device.expect_product_name().return_const(None::<String>);
        let manager = PrinterManager::new(host_with(device), VendorAllowlist::default());

        let status = manager.connect().await;

        assert_eq!(status, PrinterStatus::connected(DEFAULT_PRINTER_NAME));
    }

    #[tokio::test]
    async fn test_no_bulk_out_endpoint_fails_negotiation() {
        let mut device = MockDevice::new();
        device.expect_open().returning(|| Ok(()));
        device.expect_configuration().return_const(Some(1u8));
        device.expect_interfaces().returning(|| {
            Ok(vec![InterfaceInfo {
                number: 0,
                alternate: 0,
                class: USB_CLASS_PRINTER,
                endpoints: vec![EndpointInfo::bulk_in(0x01)],
            }])
        });
        device.expect_claim_interface().never();
        device.expect_close().times(1).returning(|| Ok(()));
        let manager = PrinterManager::new(host_with(device), VendorAllowlist::default());

        let status = manager.connect().await;

        assert_eq!(
            status.error.as_deref(),
            Some("Printer connection failed: No suitable printing interface found on the device")
        );
    }

    #[tokio::test]
    async fn test_failed_alternate_releases_interface() {
        let mut device = MockDevice::new();
        device.expect_open().returning(|| Ok(()));
        device.expect_configuration().return_const(Some(1u8));
        device.expect_interfaces().returning(|| {
            Ok(vec![InterfaceInfo {
                number: 2,
                alternate: 1,
                class: USB_CLASS_PRINTER,
                endpoints: vec![EndpointInfo::bulk_out(0x03)],
            }])
        });
        device.expect_claim_interface().returning(|_| Ok(()));
        device
            .expect_select_alternate()
            .with(eq(2u8), eq(1u8))
            .returning(|_, _| Err(UsbError::Other("stall".into())));
        device
            .expect_release_interface()
            .with(eq(2u8))
            .times(1)
            .returning(|_| Ok(()));
        device.expect_close().times(1).returning(|| Ok(()));
        let manager = PrinterManager::new(host_with(device), VendorAllowlist::default());

        let status = manager.connect().await;

        assert!(!status.connected);
        assert!(!manager.is_connected().await);
    }

    #[tokio::test]
    async fn test_send_requires_connection() {
        let mut host = MockHost::new();
        host.expect_request_device().never();
        let manager = PrinterManager::new(Arc::new(host), VendorAllowlist::default());

        assert_eq!(manager.send(b"CLS\r\n").await, Err(PrinterError::NotConnected));
    }

    #[tokio::test]
    async fn test_transfer_failure_disconnects_before_returning() {
        let mut device = healthy_device();
        device
            .expect_transfer_out()
            .withf(|endpoint, _| *endpoint == 0x02)
            .times(1)
            .returning(|_, _| Err(UsbError::Transfer("pipe error".into())));
        device.expect_release_interface().times(1).returning(|_| Ok(()));
        device.expect_close().times(1).returning(|| Ok(()));
        let manager = PrinterManager::new(host_with(device), VendorAllowlist::default());
        manager.connect().await;

        let first = manager.send(b"PRINT 1,1\r\n").await;
        assert_eq!(first, Err(PrinterError::WriteFailed("Transfer failed: pipe error".into())));
        assert!(!manager.is_connected().await);
        assert_eq!(
            manager.status().await.error.as_deref(),
            Some("Failed to send data to printer. Please reconnect.")
        );

        // transfer_out expectation is times(1): the device is not touched again
        assert_eq!(manager.send(b"PRINT 1,1\r\n").await, Err(PrinterError::NotConnected));
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let mut device = healthy_device();
        device.expect_release_interface().times(1).returning(|_| Ok(()));
        device.expect_close().times(1).returning(|| Ok(()));
        let manager = PrinterManager::new(host_with(device), VendorAllowlist::default());
        manager.connect().await;

        manager.disconnect().await;
        manager.disconnect().await;

        assert_eq!(manager.status().await, PrinterStatus::disconnected());
    }
}
