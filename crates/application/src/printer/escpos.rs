use domain::barcode::{classify, normalize};
use domain::{EscPosSettings, LabelConfig, LabelData, PrinterDialect};

use super::encoder::{CopySequence, EncodeError, EncodedJob, LabelEncoder};

const ESC: u8 = 0x1B;
const GS: u8 = 0x1D;
const LF: u8 = 0x0A;
const FF: u8 = 0x0C;

/// Low-level ESC/POS byte builder
#[derive(Debug, Default)]
pub struct EscPosBuilder {
    buffer: Vec<u8>,
}

impl EscPosBuilder {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    pub fn initialize(mut self) -> Self {
        // ESC @: Initialize printer
        self.buffer.extend_from_slice(&[ESC, 0x40]);
        self
    }

    pub fn density(mut self, level: u8) -> Self {
        // GS | n: Print density
        self.buffer.extend_from_slice(&[GS, 0x7C, level]);
        self
    }

    pub fn align_center(mut self) -> Self {
        // ESC a n: Align (0: Left, 1: Center, 2: Right)
        self.buffer.extend_from_slice(&[ESC, 0x61, 0x01]);
        self
    }

    pub fn normal_size(mut self) -> Self {
        // GS ! n: Character size
        self.buffer.extend_from_slice(&[GS, 0x21, 0x00]);
        self
    }

    pub fn double_size(mut self) -> Self {
        self.buffer.extend_from_slice(&[GS, 0x21, 0x11]);
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.buffer.extend_from_slice(text.as_bytes());
        self
    }

    pub fn line_feed(mut self) -> Self {
        self.buffer.push(LF);
        self
    }

    pub fn feed(mut self, n: u8) -> Self {
        // ESC d n: Print and feed n lines
        self.buffer.extend_from_slice(&[ESC, 0x64, n]);
        self
    }

    pub fn barcode_height(mut self, dots: u8) -> Self {
        // GS h n
        self.buffer.extend_from_slice(&[GS, 0x68, dots]);
        self
    }

    pub fn barcode_width(mut self, module: u8) -> Self {
        // GS w n, valid 1-6
        self.buffer.extend_from_slice(&[GS, 0x77, module.clamp(1, 6)]);
        self
    }

    pub fn hri_below(mut self) -> Self {
        // GS H n: HRI position (2: below)
        self.buffer.extend_from_slice(&[GS, 0x48, 0x02]);
        self
    }

    pub fn hri_font(mut self, font: u8) -> Self {
        // GS f n
        self.buffer.extend_from_slice(&[GS, 0x66, font]);
        self
    }

    /// GS k m n d1..dn. Data past 255 bytes is dropped, `n` is one byte.
    pub fn barcode(mut self, system: u8, data: &[u8]) -> Self {
        let data = &data[..data.len().min(u8::MAX as usize)];
        self.buffer.extend_from_slice(&[GS, 0x6B, system, data.len() as u8]);
        self.buffer.extend_from_slice(data);
        self
    }

    pub fn form_feed(mut self) -> Self {
        // FF: advance to the next label on gap-sensing printers
        self.buffer.push(FF);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.buffer
    }
}

/// ESC/POS encoder. The host repeats each copy; every copy is three
/// transfers: name block, barcode block, price+feed block.
#[derive(Debug, Clone, Default)]
pub struct EscPosEncoder {
    settings: EscPosSettings,
}

impl EscPosEncoder {
    pub fn new(settings: EscPosSettings) -> Self {
        Self { settings }
    }

    fn name_block(&self, data: &LabelData, config: &LabelConfig) -> Vec<u8> {
        let mut builder = EscPosBuilder::new()
            .initialize()
            .density(self.settings.density)
            .align_center();

        if config.show_name && !data.item_name.is_empty() {
            let name: String = data
                .item_name
                .chars()
                .take(self.settings.name_max_chars)
                .collect();
            builder = builder.normal_size().text(&name).line_feed();
        }

        builder.feed(1).build()
    }

    fn barcode_block(&self, payload: &[u8], system: u8) -> Vec<u8> {
        EscPosBuilder::new()
            .barcode_height(self.settings.barcode_height)
            .barcode_width(self.settings.module_width)
            .hri_below()
            .hri_font(0)
            .barcode(system, payload)
            .build()
    }

    fn price_and_feed_block(&self, data: &LabelData, config: &LabelConfig) -> Vec<u8> {
        let mut builder = EscPosBuilder::new();

        if let Some(price) = data.printable_price().filter(|_| config.show_price) {
            let text = format!("{}{:.2}", self.settings.currency_prefix, price);
            builder = builder.line_feed().double_size().text(&text).line_feed();
        }

        builder.feed(3).form_feed().build()
    }
}

impl LabelEncoder for EscPosEncoder {
    fn dialect(&self) -> PrinterDialect {
        PrinterDialect::EscPos
    }

    fn encode(&self, data: &LabelData, config: &LabelConfig) -> Result<EncodedJob, EncodeError> {
        let payload = normalize(&data.barcode);
        if payload.is_empty() {
            return Err(EncodeError::EmptyBarcode);
        }
        if payload.len() > u8::MAX as usize {
            return Err(EncodeError::BarcodeTooLong(payload.len()));
        }
        let system = classify(&payload).escpos_code();

        let copy = CopySequence {
            chunks: vec![
                self.name_block(data, config),
                self.barcode_block(payload.as_bytes(), system),
                self.price_and_feed_block(data, config),
            ],
        };

        Ok(EncodedJob {
            dialect: PrinterDialect::EscPos,
            sequences: vec![copy; config.copies as usize],
        })
    }
}
