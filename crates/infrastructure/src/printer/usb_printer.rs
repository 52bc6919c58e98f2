use async_trait::async_trait;
use domain::driver::{
    EndpointDirection, EndpointInfo, InterfaceInfo, TransferKind, UsbDevice, UsbError, UsbHost,
    VendorAllowlist,
};
use nusb::descriptors::TransferType;
use nusb::transfer::{Buffer, Bulk, Direction, Out};
use nusb::{DeviceInfo, Endpoint, ErrorKind, Interface};
use std::collections::HashMap;
use tracing::{debug, info};

/// USB host backed by the operating system through `nusb`.
///
/// There is no interactive picker: the first attached device that passes
/// the vendor allowlist is chosen.
#[derive(Debug, Default, Clone)]
pub struct NusbHost;

impl NusbHost {
    pub fn new() -> Self {
        Self
    }
}

fn map_error(err: nusb::Error) -> UsbError {
    match err.kind() {
        ErrorKind::PermissionDenied | ErrorKind::Busy => UsbError::AccessDenied(err.to_string()),
        ErrorKind::Disconnected => UsbError::Disconnected,
        _ => UsbError::Other(err.to_string()),
    }
}

#[async_trait]
impl UsbHost for NusbHost {
    fn is_supported(&self) -> bool {
        cfg!(any(
            target_os = "linux",
            target_os = "android",
            target_os = "macos",
            target_os = "windows"
        ))
    }

    async fn request_device(
        &self,
        filters: &VendorAllowlist,
    ) -> Result<Box<dyn UsbDevice>, UsbError> {
        let devices = nusb::list_devices().await.map_err(map_error)?;

        let mut candidates = devices.filter(|d| filters.matches(d.vendor_id(), d.product_id()));
        let Some(info) = candidates.next() else {
            debug!("No attached USB device matches the vendor allowlist");
            return Err(UsbError::NoDeviceSelected);
        };

        info!(
            vendor_id = format_args!("{:04x}", info.vendor_id()),
            product_id = format_args!("{:04x}", info.product_id()),
            product = info.product_string().unwrap_or("unknown"),
            "Found USB printer candidate"
        );
        Ok(Box::new(NusbDevice::new(info)))
    }
}

pub struct NusbDevice {
    info: DeviceInfo,
    device: Option<nusb::Device>,
    interfaces: HashMap<u8, Interface>,
    endpoints: HashMap<u8, Endpoint<Bulk, Out>>,
}

impl NusbDevice {
    fn new(info: DeviceInfo) -> Self {
        Self {
            info,
            device: None,
            interfaces: HashMap::new(),
            endpoints: HashMap::new(),
        }
    }

    fn device(&self) -> Result<&nusb::Device, UsbError> {
        self.device.as_ref().ok_or(UsbError::Disconnected)
    }

    fn endpoint(&mut self, address: u8) -> Result<&mut Endpoint<Bulk, Out>, UsbError> {
        if !self.endpoints.contains_key(&address) {
            let endpoint = self
                .interfaces
                .values()
                .find_map(|iface| iface.endpoint::<Bulk, Out>(address).ok())
                .ok_or_else(|| {
                    UsbError::Transfer(format!(
                        "endpoint {address:#04x} is not on a claimed interface"
                    ))
                })?;
            self.endpoints.insert(address, endpoint);
        }
        self.endpoints
            .get_mut(&address)
            .ok_or(UsbError::Disconnected)
    }
}

#[async_trait]
impl UsbDevice for NusbDevice {
    fn product_name(&self) -> Option<String> {
        self.info.product_string().map(str::to_string)
    }

    async fn open(&mut self) -> Result<(), UsbError> {
        let device = self.info.open().await.map_err(map_error)?;
        self.device = Some(device);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), UsbError> {
        // Dropping the handles releases interfaces and closes the device
        self.endpoints.clear();
        self.interfaces.clear();
        self.device = None;
        Ok(())
    }

    fn configuration(&self) -> Option<u8> {
        self.device
            .as_ref()?
            .active_configuration()
            .ok()
            .map(|config| config.configuration_value())
    }

    async fn select_configuration(&mut self, value: u8) -> Result<(), UsbError> {
        self.device()?
            .set_configuration(value)
            .await
            .map_err(map_error)
    }

    fn interfaces(&self) -> Result<Vec<InterfaceInfo>, UsbError> {
        let config = self
            .device()?
            .active_configuration()
            .map_err(|e| UsbError::Other(e.to_string()))?;

        Ok(config
            .interface_alt_settings()
            .map(|alt| InterfaceInfo {
                number: alt.interface_number(),
                alternate: alt.alternate_setting(),
                class: alt.class(),
                endpoints: alt
                    .endpoints()
                    .map(|ep| EndpointInfo {
                        address: ep.address(),
                        direction: match ep.direction() {
                            Direction::In => EndpointDirection::In,
                            Direction::Out => EndpointDirection::Out,
                        },
                        transfer: match ep.transfer_type() {
                            TransferType::Control => TransferKind::Control,
                            TransferType::Isochronous => TransferKind::Isochronous,
                            TransferType::Bulk => TransferKind::Bulk,
                            TransferType::Interrupt => TransferKind::Interrupt,
                        },
                    })
                    .collect(),
            })
            .collect())
    }

    async fn claim_interface(&mut self, interface: u8) -> Result<(), UsbError> {
        let claimed = self
            .device()?
            .claim_interface(interface)
            .await
            .map_err(map_error)?;
        self.interfaces.insert(interface, claimed);
        Ok(())
    }

    async fn select_alternate(&mut self, interface: u8, alternate: u8) -> Result<(), UsbError> {
        let claimed = self
            .interfaces
            .get(&interface)
            .ok_or_else(|| UsbError::Other(format!("interface {interface} is not claimed")))?;
        claimed.set_alt_setting(alternate).await.map_err(map_error)
    }

    async fn release_interface(&mut self, interface: u8) -> Result<(), UsbError> {
        if self.interfaces.remove(&interface).is_some() {
            self.endpoints.clear();
        }
        Ok(())
    }

    async fn transfer_out(&mut self, endpoint: u8, data: &[u8]) -> Result<(), UsbError> {
        let ep = self.endpoint(endpoint)?;
        ep.submit(Buffer::from(data.to_vec()));
        let completion = ep.next_complete().await;
        completion
            .status
            .map_err(|e| UsbError::Transfer(e.to_string()))?;

        if completion.actual_len != data.len() {
            return Err(UsbError::Transfer(format!(
                "short write: {} of {} bytes",
                completion.actual_len,
                data.len()
            )));
        }
        Ok(())
    }
}
