pub mod mock_printer;
pub mod usb_printer;

pub use mock_printer::{MockUsbDevice, MockUsbHost, RecordedTransfer, UsbActivity};
pub use usb_printer::{NusbDevice, NusbHost};
