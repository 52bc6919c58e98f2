use clap::{Parser, Subcommand, ValueEnum};
use domain::{LabelConfig, LabelData};

#[derive(Parser, Debug)]
#[command(author, version, about = "Thermal label printer agent", long_about = None)]
pub struct Args {
    /// Path to config directory
    #[arg(long, default_value = "config")]
    pub config_dir: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Show which barcode symbology a code prints as
    Detect { code: String },
    /// Connect to the printer and report its status
    Status,
    /// Print price labels
    Print(PrintArgs),
    /// Print one sample label over ESC/POS
    TestPrint {
        /// Record transfers on a simulated printer instead of USB
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectChoice {
    /// TSPL first, ESC/POS when TSPL fails
    Auto,
    Tspl,
    Escpos,
}

#[derive(clap::Args, Debug, PartialEq)]
pub struct PrintArgs {
    #[arg(long)]
    pub barcode: String,

    #[arg(long, default_value = "")]
    pub name: String,

    #[arg(long)]
    pub price: Option<f64>,

    /// Label width in mm (default from config)
    #[arg(long)]
    pub width: Option<f64>,

    /// Label height in mm (default from config)
    #[arg(long)]
    pub height: Option<f64>,

    #[arg(long)]
    pub copies: Option<u32>,

    /// Leave the item name off the label
    #[arg(long)]
    pub no_name: bool,

    /// Leave the price off the label
    #[arg(long)]
    pub no_price: bool,

    #[arg(long, value_enum, default_value_t = DialectChoice::Auto)]
    pub dialect: DialectChoice,

    /// Record transfers on a simulated printer instead of USB
    #[arg(long)]
    pub dry_run: bool,
}

impl PrintArgs {
    pub fn label_data(&self) -> LabelData {
        LabelData::new(self.barcode.clone(), self.name.clone(), self.price)
    }

    /// Layout from the command line, falling back to the configured stock
    pub fn label_config(&self, defaults: &LabelConfig) -> LabelConfig {
        LabelConfig {
            width: self.width.unwrap_or(defaults.width),
            height: self.height.unwrap_or(defaults.height),
            copies: self.copies.unwrap_or(defaults.copies),
            show_name: defaults.show_name && !self.no_name,
            show_price: defaults.show_price && !self.no_price,
        }
    }
}
