use config::{Config, ConfigError, Environment, File};
use domain::driver::{VendorAllowlist, parse_usb_id};
use domain::{DomainError, EscPosSettings, LabelConfig, TsplSettings};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UsbConfig {
    /// Vendor IDs offered to the device picker, e.g. `"0x0416"`
    #[serde(default = "default_vendor_ids")]
    pub vendor_ids: Vec<String>,
    /// Restrict the picker to one product
    #[serde(default)]
    pub product_id: Option<String>,
}

impl Default for UsbConfig {
    fn default() -> Self {
        Self {
            vendor_ids: default_vendor_ids(),
            product_id: None,
        }
    }
}

fn default_vendor_ids() -> Vec<String> {
    VendorAllowlist::default()
        .filters()
        .iter()
        .map(|f| format!("{:#06x}", f.vendor_id))
        .collect()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct JobConfig {
    #[serde(default = "default_copy_delay_ms")]
    pub copy_delay_ms: u64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            copy_delay_ms: default_copy_delay_ms(),
        }
    }
}

fn default_copy_delay_ms() -> u64 {
    100
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct PrinterAgentConfig {
    #[serde(default)]
    pub usb: UsbConfig,
    #[serde(default)]
    pub escpos: EscPosSettings,
    #[serde(default)]
    pub tspl: TsplSettings,
    #[serde(default)]
    pub job: JobConfig,
    /// Label stock used when a print command does not say otherwise
    #[serde(default)]
    pub label: LabelConfig,
}

impl PrinterAgentConfig {
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Shipped defaults, e.g. config/default.toml
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
            // Per-environment overrides
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            // Environment variables (e.g. LABEL__USB__VENDOR_IDS=0x0416,0x20d1)
            .add_source(
                Environment::with_prefix("LABEL")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("usb.vendor_ids")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }

    /// Vendor allowlist for the device picker, narrowed to `usb.product_id` if set
    pub fn allowlist(&self) -> Result<VendorAllowlist, DomainError> {
        let allowlist = VendorAllowlist::from_ids(&self.usb.vendor_ids)?;
        match &self.usb.product_id {
            Some(product_id) => Ok(allowlist.with_product(parse_usb_id(product_id)?)),
            None => Ok(allowlist),
        }
    }

    pub fn copy_delay(&self) -> Duration {
        Duration::from_millis(self.job.copy_delay_ms)
    }
}
