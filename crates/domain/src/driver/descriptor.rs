//! Descriptor model of a USB device, reduced to what printer negotiation needs

/// USB interface class code of printers
pub const USB_CLASS_PRINTER: u8 = 0x07;
/// USB interface class code of vendor-specific interfaces
pub const USB_CLASS_VENDOR_SPECIFIC: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Control,
    Isochronous,
    Bulk,
    Interrupt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointInfo {
    /// Full endpoint address including the direction bit
    pub address: u8,
    pub direction: EndpointDirection,
    pub transfer: TransferKind,
}

impl EndpointInfo {
    pub fn bulk_out(address: u8) -> Self {
        Self {
            address,
            direction: EndpointDirection::Out,
            transfer: TransferKind::Bulk,
        }
    }

    pub fn bulk_in(address: u8) -> Self {
        Self {
            address: address | 0x80,
            direction: EndpointDirection::In,
            transfer: TransferKind::Bulk,
        }
    }

    pub fn is_bulk_out(&self) -> bool {
        self.direction == EndpointDirection::Out && self.transfer == TransferKind::Bulk
    }
}

/// One alternate setting of an interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub number: u8,
    pub alternate: u8,
    pub class: u8,
    pub endpoints: Vec<EndpointInfo>,
}

impl InterfaceInfo {
    pub fn is_printer_like(&self) -> bool {
        self.class == USB_CLASS_PRINTER || self.class == USB_CLASS_VENDOR_SPECIFIC
    }

    fn first_bulk_out(&self) -> Option<&EndpointInfo> {
        self.endpoints.iter().find(|e| e.is_bulk_out())
    }
}

/// Interface, alternate setting and endpoint chosen for printing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointSelection {
    pub interface: u8,
    pub alternate: u8,
    pub endpoint: u8,
    /// Whether the interface advertised the printer or vendor-specific class
    pub printer_class: bool,
}

/// Pick the bulk-OUT endpoint to print through.
///
/// The first bulk-OUT endpoint on a printer-class (7) or vendor-specific
/// (255) interface wins; otherwise the first bulk-OUT endpoint on any
/// interface. Interfaces are scanned in descriptor order.
pub fn select_bulk_out(interfaces: &[InterfaceInfo]) -> Option<EndpointSelection> {
    let preferred = interfaces
        .iter()
        .filter(|i| i.is_printer_like())
        .find_map(|i| i.first_bulk_out().map(|e| (i, e)));

    let (interface, endpoint) = preferred.or_else(|| {
        interfaces
            .iter()
            .find_map(|i| i.first_bulk_out().map(|e| (i, e)))
    })?;

    Some(EndpointSelection {
        interface: interface.number,
        alternate: interface.alternate,
        endpoint: endpoint.address,
        printer_class: interface.is_printer_like(),
    })
}
