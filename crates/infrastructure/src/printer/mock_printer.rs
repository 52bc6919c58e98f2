use async_trait::async_trait;
use domain::driver::{
    EndpointInfo, InterfaceInfo, USB_CLASS_PRINTER, UsbDevice, UsbError, UsbHost, VendorAllowlist,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// One recorded bulk-OUT transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTransfer {
    pub endpoint: u8,
    pub data: Vec<u8>,
}

/// Everything the mock devices were asked to do, shared by all clones
#[derive(Debug, Clone, Default)]
pub struct UsbActivity {
    pub requests: usize,
    pub opens: usize,
    pub closes: usize,
    pub claimed: Vec<u8>,
    pub released: Vec<u8>,
    pub configurations: Vec<u8>,
    /// Transfers that reached the device, including failed ones
    pub attempts: usize,
    pub transfers: Vec<RecordedTransfer>,
}

/// In-memory USB host with one printer attached.
///
/// Failures can be injected at each negotiation step and per transfer.
#[derive(Clone)]
pub struct MockUsbHost {
    pub supported: bool,
    pub vendor_id: u16,
    pub product_id: u16,
    pub product_name: Option<String>,
    pub configuration: Option<u8>,
    pub interfaces: Vec<InterfaceInfo>,
    pub pick_error: Option<UsbError>,
    pub open_error: Option<UsbError>,
    pub claim_error: Option<UsbError>,
    /// Zero-based index of the transfer attempt that fails
    pub fail_transfer_at: Option<usize>,
    /// Every transfer whose payload starts with these bytes fails
    pub fail_transfers_starting_with: Option<Vec<u8>>,
    /// How long each transfer takes before it completes
    pub transfer_latency: Option<Duration>,
    pub activity: Arc<Mutex<UsbActivity>>,
}

impl Default for MockUsbHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockUsbHost {
    pub fn new() -> Self {
        Self {
            supported: true,
            vendor_id: 0x0416,
            product_id: 0x5011,
            product_name: Some("Mock Thermal Printer".to_string()),
            configuration: Some(1),
            interfaces: vec![InterfaceInfo {
                number: 0,
                alternate: 0,
                class: USB_CLASS_PRINTER,
                endpoints: vec![EndpointInfo::bulk_out(0x01), EndpointInfo::bulk_in(0x02)],
            }],
            pick_error: None,
            open_error: None,
            claim_error: None,
            fail_transfer_at: None,
            fail_transfers_starting_with: None,
            transfer_latency: None,
            activity: Arc::new(Mutex::new(UsbActivity::default())),
        }
    }

    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    pub fn with_ids(mut self, vendor_id: u16, product_id: u16) -> Self {
        self.vendor_id = vendor_id;
        self.product_id = product_id;
        self
    }

    pub fn with_product_name(mut self, name: Option<&str>) -> Self {
        self.product_name = name.map(str::to_string);
        self
    }

    pub fn unconfigured(mut self) -> Self {
        self.configuration = None;
        self
    }

    pub fn with_interfaces(mut self, interfaces: Vec<InterfaceInfo>) -> Self {
        self.interfaces = interfaces;
        self
    }

    pub fn with_pick_error(mut self, err: UsbError) -> Self {
        self.pick_error = Some(err);
        self
    }

    pub fn with_open_error(mut self, err: UsbError) -> Self {
        self.open_error = Some(err);
        self
    }

    pub fn with_claim_error(mut self, err: UsbError) -> Self {
        self.claim_error = Some(err);
        self
    }

    pub fn failing_transfer_at(mut self, index: usize) -> Self {
        self.fail_transfer_at = Some(index);
        self
    }

    pub fn failing_transfers_starting_with(mut self, prefix: &[u8]) -> Self {
        self.fail_transfers_starting_with = Some(prefix.to_vec());
        self
    }

    pub fn with_transfer_latency(mut self, latency: Duration) -> Self {
        self.transfer_latency = Some(latency);
        self
    }

    pub async fn activity(&self) -> UsbActivity {
        self.activity.lock().await.clone()
    }

    pub async fn transfers(&self) -> Vec<RecordedTransfer> {
        self.activity.lock().await.transfers.clone()
    }

    /// All successfully transferred bytes, concatenated
    pub async fn sent_data(&self) -> Vec<u8> {
        self.activity
            .lock()
            .await
            .transfers
            .iter()
            .flat_map(|t| t.data.iter().copied())
            .collect()
    }
}

#[async_trait]
impl UsbHost for MockUsbHost {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn request_device(
        &self,
        filters: &VendorAllowlist,
    ) -> Result<Box<dyn UsbDevice>, UsbError> {
        self.activity.lock().await.requests += 1;
        if let Some(err) = &self.pick_error {
            return Err(err.clone());
        }
        if !filters.matches(self.vendor_id, self.product_id) {
            return Err(UsbError::NoDeviceSelected);
        }
        Ok(Box::new(MockUsbDevice {
            host: self.clone(),
            opened: false,
            configuration: self.configuration,
            claimed: Vec::new(),
        }))
    }
}

pub struct MockUsbDevice {
    host: MockUsbHost,
    opened: bool,
    configuration: Option<u8>,
    claimed: Vec<u8>,
}

impl MockUsbDevice {
    fn ensure_open(&self) -> Result<(), UsbError> {
        if self.opened {
            Ok(())
        } else {
            Err(UsbError::Disconnected)
        }
    }
}

#[async_trait]
impl UsbDevice for MockUsbDevice {
    fn product_name(&self) -> Option<String> {
        self.host.product_name.clone()
    }

    async fn open(&mut self) -> Result<(), UsbError> {
        if let Some(err) = &self.host.open_error {
            return Err(err.clone());
        }
        self.host.activity.lock().await.opens += 1;
        self.opened = true;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), UsbError> {
        self.host.activity.lock().await.closes += 1;
        self.opened = false;
        self.claimed.clear();
        Ok(())
    }

    fn configuration(&self) -> Option<u8> {
        self.configuration
    }

    async fn select_configuration(&mut self, value: u8) -> Result<(), UsbError> {
        self.ensure_open()?;
        self.host.activity.lock().await.configurations.push(value);
        self.configuration = Some(value);
        Ok(())
    }

    fn interfaces(&self) -> Result<Vec<InterfaceInfo>, UsbError> {
        self.ensure_open()?;
        Ok(self.host.interfaces.clone())
    }

    async fn claim_interface(&mut self, interface: u8) -> Result<(), UsbError> {
        self.ensure_open()?;
        if let Some(err) = &self.host.claim_error {
            return Err(err.clone());
        }
        self.host.activity.lock().await.claimed.push(interface);
        self.claimed.push(interface);
        Ok(())
    }

    async fn select_alternate(&mut self, interface: u8, _alternate: u8) -> Result<(), UsbError> {
        if !self.claimed.contains(&interface) {
            return Err(UsbError::Other(format!("interface {interface} not claimed")));
        }
        Ok(())
    }

    async fn release_interface(&mut self, interface: u8) -> Result<(), UsbError> {
        self.host.activity.lock().await.released.push(interface);
        self.claimed.retain(|i| *i != interface);
        Ok(())
    }

    async fn transfer_out(&mut self, endpoint: u8, data: &[u8]) -> Result<(), UsbError> {
        self.ensure_open()?;
        if self.claimed.is_empty() {
            return Err(UsbError::Transfer("no interface claimed".to_string()));
        }
        if let Some(latency) = self.host.transfer_latency {
            tokio::time::sleep(latency).await;
        }

        let mut activity = self.host.activity.lock().await;
        let attempt = activity.attempts;
        activity.attempts += 1;

        let rejected_prefix = self
            .host
            .fail_transfers_starting_with
            .as_ref()
            .is_some_and(|prefix| data.starts_with(prefix));
        if self.host.fail_transfer_at == Some(attempt) || rejected_prefix {
            return Err(UsbError::Transfer(format!(
                "injected failure on transfer {attempt}"
            )));
        }

        activity.transfers.push(RecordedTransfer {
            endpoint,
            data: data.to_vec(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_transfers_across_clones() {
        let host = MockUsbHost::new();
        let observer = host.clone();

        let mut device = host
            .request_device(&VendorAllowlist::default())
            .await
            .unwrap();
        device.open().await.unwrap();
        device.claim_interface(0).await.unwrap();
        device.transfer_out(0x01, b"CLS\r\n").await.unwrap();

        assert_eq!(
            observer.transfers().await,
            vec![RecordedTransfer {
                endpoint: 0x01,
                data: b"CLS\r\n".to_vec()
            }]
        );
        assert_eq!(observer.activity().await.claimed, vec![0]);
    }

    #[test]
    fn test_allowlist_filters_device() {
        let host = MockUsbHost::new().with_ids(0x1234, 0x0001);
        let result = tokio_test::block_on(host.request_device(&VendorAllowlist::default()));
        assert!(matches!(result, Err(UsbError::NoDeviceSelected)));

        let unfiltered = tokio_test::block_on(host.request_device(&VendorAllowlist::new(vec![])));
        assert!(unfiltered.is_ok());
        assert_eq!(tokio_test::block_on(host.activity()).requests, 2);
    }

    #[tokio::test]
    async fn test_transfer_requires_claimed_interface() {
        let host = MockUsbHost::new();
        let mut device = host
            .request_device(&VendorAllowlist::default())
            .await
            .unwrap();
        assert_eq!(
            device.transfer_out(0x01, b"x").await,
            Err(UsbError::Disconnected)
        );
        device.open().await.unwrap();
        assert!(matches!(
            device.transfer_out(0x01, b"x").await,
            Err(UsbError::Transfer(_))
        ));
    }

    #[tokio::test]
    async fn test_injected_transfer_failures() {
        let host = MockUsbHost::new()
            .failing_transfer_at(1)
            .failing_transfers_starting_with(b"SIZE");
        let mut device = host
            .request_device(&VendorAllowlist::default())
            .await
            .unwrap();
        device.open().await.unwrap();
        device.claim_interface(0).await.unwrap();

        assert!(device.transfer_out(1, b"a").await.is_ok());
        assert!(device.transfer_out(1, b"b").await.is_err());
        assert!(device.transfer_out(1, b"c").await.is_ok());
        assert!(device.transfer_out(1, b"SIZE 50 mm").await.is_err());

        let activity = host.activity().await;
        assert_eq!(activity.attempts, 4);
        assert_eq!(host.sent_data().await, b"ac".to_vec());
    }
}
