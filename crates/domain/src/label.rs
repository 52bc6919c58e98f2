use crate::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Upper bound on copies per job (the label dialog clamps to the same range)
pub const MAX_COPIES: u32 = 100;

/// One logical label. A job repeats it `LabelConfig::copies` times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelData {
    pub barcode: String,
    pub item_name: String,
    #[serde(default)]
    pub price: Option<f64>,
}

impl LabelData {
    pub fn new(
        barcode: impl Into<String>,
        item_name: impl Into<String>,
        price: Option<f64>,
    ) -> Self {
        Self {
            barcode: barcode.into(),
            item_name: item_name.into(),
            price,
        }
    }

    /// Price to print, if any. Zero, negative and non-finite prices are not printed.
    pub fn printable_price(&self) -> Option<f64> {
        self.price.filter(|p| p.is_finite() && *p > 0.0)
    }
}

/// Physical label layout and job options, immutable for one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelConfig {
    /// Label width in mm
    #[serde(default = "default_width")]
    pub width: f64,
    /// Label height in mm
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default = "default_copies")]
    pub copies: u32,
    /// Also read as `show_name`: config file keys arrive lowercased
    #[serde(default = "default_show", alias = "show_name")]
    pub show_name: bool,
    #[serde(default = "default_show", alias = "show_price")]
    pub show_price: bool,
}

fn default_width() -> f64 {
    50.0
}
fn default_height() -> f64 {
    30.0
}
fn default_copies() -> u32 {
    1
}
fn default_show() -> bool {
    true
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            copies: default_copies(),
            show_name: default_show(),
            show_price: default_show(),
        }
    }
}

impl LabelConfig {
    pub fn with_copies(mut self, copies: u32) -> Self {
        self.copies = copies;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.copies == 0 {
            return Err(DomainError::InvalidLabelConfig(
                "copies must be at least 1".to_string(),
            ));
        }
        if self.copies > MAX_COPIES {
            return Err(DomainError::InvalidLabelConfig(format!(
                "copies must be at most {MAX_COPIES}, got {}",
                self.copies
            )));
        }
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(DomainError::InvalidLabelConfig(format!(
                    "{name} must be a positive number of mm, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_label_config() {
        let config = LabelConfig::default();
        assert_eq!(config.width, 50.0);
        assert_eq!(config.height, 30.0);
        assert_eq!(config.copies, 1);
        assert!(config.show_name && config.show_price);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_copies_bounds() {
        assert!(LabelConfig::default().with_copies(0).validate().is_err());
        assert!(LabelConfig::default().with_copies(100).validate().is_ok());
        assert!(LabelConfig::default().with_copies(101).validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_dimensions() {
        let config = LabelConfig {
            width: 0.0,
            ..LabelConfig::default()
        };
        assert!(config.validate().is_err());

        let config = LabelConfig {
            height: f64::NAN,
            ..LabelConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_printable_price() {
        assert_eq!(
            LabelData::new("1", "a", Some(19.99)).printable_price(),
            Some(19.99)
        );
        assert_eq!(LabelData::new("1", "a", Some(0.0)).printable_price(), None);
        assert_eq!(LabelData::new("1", "a", Some(-2.0)).printable_price(), None);
        assert_eq!(LabelData::new("1", "a", None).printable_price(), None);
    }

    #[test]
    fn test_label_data_wire_format() {
        let data: LabelData =
            serde_json::from_str(r#"{"barcode":"4006381333931","itemName":"Tea"}"#).unwrap();
        assert_eq!(data.item_name, "Tea");
        assert_eq!(data.price, None);

        let config: LabelConfig =
            serde_json::from_str(r#"{"copies":3,"showPrice":false}"#).unwrap();
        assert_eq!(config.copies, 3);
        assert!(!config.show_price);
        assert_eq!(config.width, 50.0);
    }
}
