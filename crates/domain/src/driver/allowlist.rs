use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// One entry of the device picker filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorFilter {
    pub vendor_id: u16,
    #[serde(default)]
    pub product_id: Option<u16>,
    #[serde(default)]
    pub label: Option<String>,
}

impl VendorFilter {
    pub fn vendor(vendor_id: u16) -> Self {
        Self {
            vendor_id,
            product_id: None,
            label: None,
        }
    }

    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id.is_none_or(|p| p == product_id)
    }
}

/// Vendor IDs offered in the device picker.
///
/// This is a discovery hint, not a compatibility guarantee: chips from these
/// vendors show up in many cheap label printers, but whether a device can
/// actually print is decided by probing its interfaces for a bulk-OUT
/// endpoint. Extend it through configuration when a printer is not listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorAllowlist {
    filters: Vec<VendorFilter>,
}

const KNOWN_PRINTER_VENDORS: [(u16, &str); 8] = [
    (0x0416, "Winbond"),
    (0x0483, "STMicroelectronics"),
    (0x0525, "Netchip Technology"),
    (0x1fc9, "NXP"),
    (0x20d1, "Deli"),
    (0x28e9, "GD32"),
    (0x1a86, "QinHeng Electronics"),
    (0x067b, "Prolific"),
];

impl Default for VendorAllowlist {
    fn default() -> Self {
        Self {
            filters: KNOWN_PRINTER_VENDORS
                .iter()
                .map(|(vendor_id, label)| VendorFilter {
                    vendor_id: *vendor_id,
                    product_id: None,
                    label: Some(label.to_string()),
                })
                .collect(),
        }
    }
}

impl VendorAllowlist {
    pub fn new(filters: Vec<VendorFilter>) -> Self {
        Self { filters }
    }

    /// Build from vendor ID strings such as `"0x0416"`, `"0416"` or `"1046"`
    pub fn from_ids<S: AsRef<str>>(ids: &[S]) -> Result<Self> {
        let filters = ids
            .iter()
            .map(|id| parse_usb_id(id.as_ref()).map(VendorFilter::vendor))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { filters })
    }

    /// Restrict every entry to one product ID
    pub fn with_product(mut self, product_id: u16) -> Self {
        for filter in &mut self.filters {
            filter.product_id = Some(product_id);
        }
        self
    }

    pub fn filters(&self) -> &[VendorFilter] {
        &self.filters
    }

    /// An empty allowlist lets every device through, like an unfiltered picker
    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.filters.is_empty()
            || self
                .filters
                .iter()
                .any(|f| f.matches(vendor_id, product_id))
    }
}

/// Parse a USB vendor/product ID. Hex needs a `0x` prefix unless the string
/// is exactly four hex digits (the form `lsusb` prints).
pub fn parse_usb_id(raw: &str) -> Result<u16> {
    let raw = raw.trim();
    let parsed = if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16)
    } else if raw.len() == 4 {
        u16::from_str_radix(raw, 16)
    } else {
        raw.parse::<u16>()
    };
    parsed.map_err(|e| DomainError::InvalidVendorId(format!("{raw}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allowlist_has_eight_vendors() {
        let allowlist = VendorAllowlist::default();
        assert_eq!(allowlist.filters().len(), 8);
        assert!(allowlist.matches(0x0416, 0x5011));
        assert!(allowlist.matches(0x1a86, 0x7584));
        assert!(!allowlist.matches(0x046d, 0xc52b));
    }

    #[test]
    fn test_product_restriction() {
        let allowlist = VendorAllowlist::from_ids(&["0x0416"])
            .unwrap()
            .with_product(0x5011);
        assert!(allowlist.matches(0x0416, 0x5011));
        assert!(!allowlist.matches(0x0416, 0x0001));
    }

    #[test]
    fn test_empty_allowlist_matches_everything() {
        let allowlist = VendorAllowlist::new(Vec::new());
        assert!(allowlist.matches(0x1234, 0x5678));
    }

    #[test]
    fn test_parse_usb_id_forms() {
        assert_eq!(parse_usb_id("0x0416").unwrap(), 0x0416);
        assert_eq!(parse_usb_id("20d1").unwrap(), 0x20d1);
        assert_eq!(parse_usb_id("0483").unwrap(), 0x0483);
        assert_eq!(parse_usb_id("1046").unwrap(), 0x1046);
        assert_eq!(parse_usb_id("65535").unwrap(), 0xffff);
        assert!(parse_usb_id("0xZZ").is_err());
        assert!(parse_usb_id("70000").is_err());
    }
}
