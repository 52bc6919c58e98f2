use serde::{Deserialize, Serialize};

/// Printer firmware command language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrinterDialect {
    #[serde(rename = "TSPL")]
    Tspl,
    #[serde(rename = "ESC/POS")]
    EscPos,
}

impl PrinterDialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tspl => "TSPL",
            Self::EscPos => "ESC/POS",
        }
    }
}

impl std::fmt::Display for PrinterDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// ESC/POS label parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscPosSettings {
    /// `GS |` print density
    #[serde(default = "default_escpos_density")]
    pub density: u8,
    /// `GS h` barcode height in dots (1 dot = 0.125 mm at 203 DPI)
    #[serde(default = "default_barcode_height")]
    pub barcode_height: u8,
    /// `GS w` module width, 1-6
    #[serde(default = "default_module_width")]
    pub module_width: u8,
    /// Characters of the item name that fit on one line
    #[serde(default = "default_name_max_chars")]
    pub name_max_chars: usize,
    #[serde(default = "default_currency_prefix")]
    pub currency_prefix: String,
}

fn default_escpos_density() -> u8 {
    4
}
fn default_barcode_height() -> u8 {
    60
}
fn default_module_width() -> u8 {
    2
}
fn default_name_max_chars() -> usize {
    24
}
fn default_currency_prefix() -> String {
    "Rs.".to_string()
}

impl Default for EscPosSettings {
    fn default() -> Self {
        Self {
            density: default_escpos_density(),
            barcode_height: default_barcode_height(),
            module_width: default_module_width(),
            name_max_chars: default_name_max_chars(),
            currency_prefix: default_currency_prefix(),
        }
    }
}

/// TSPL label parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsplSettings {
    /// Gap between labels in mm
    #[serde(default = "default_gap_mm")]
    pub gap_mm: f64,
    #[serde(default = "default_speed")]
    pub speed: u8,
    #[serde(default = "default_tspl_density")]
    pub density: u8,
    /// 8 dots/mm at 203 DPI
    #[serde(default = "default_dots_per_mm")]
    pub dots_per_mm: u32,
    #[serde(default = "default_tspl_name_max_chars")]
    pub name_max_chars: usize,
    #[serde(default = "default_currency_prefix")]
    pub currency_prefix: String,
}

fn default_gap_mm() -> f64 {
    2.0
}
fn default_speed() -> u8 {
    4
}
fn default_tspl_density() -> u8 {
    8
}
fn default_dots_per_mm() -> u32 {
    8
}
fn default_tspl_name_max_chars() -> usize {
    20
}

impl Default for TsplSettings {
    fn default() -> Self {
        Self {
            gap_mm: default_gap_mm(),
            speed: default_speed(),
            density: default_tspl_density(),
            dots_per_mm: default_dots_per_mm(),
            name_max_chars: default_tspl_name_max_chars(),
            currency_prefix: default_currency_prefix(),
        }
    }
}
