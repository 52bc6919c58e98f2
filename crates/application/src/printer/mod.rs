pub mod encoder;
pub mod escpos;
pub mod job;
pub mod manager;
pub mod tspl;

pub use encoder::{CopySequence, EncodeError, EncodedJob, LabelEncoder};
pub use escpos::{EscPosBuilder, EscPosEncoder};
pub use job::{DEFAULT_COPY_DELAY, LabelPrinter};
pub use manager::{DEFAULT_PRINTER_NAME, PrinterManager};
pub use tspl::{TsplEncoder, TsplScript};
