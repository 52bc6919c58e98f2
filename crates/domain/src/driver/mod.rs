mod allowlist;
mod connection_state;
mod descriptor;
mod usb;

pub use allowlist::{VendorAllowlist, VendorFilter, parse_usb_id};
pub use connection_state::ConnectionState;
pub use descriptor::{
    EndpointDirection, EndpointInfo, EndpointSelection, InterfaceInfo, TransferKind,
    USB_CLASS_PRINTER, USB_CLASS_VENDOR_SPECIFIC, select_bulk_out,
};
pub use usb::{UsbDevice, UsbError, UsbHost};
