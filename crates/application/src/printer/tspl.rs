use domain::barcode::{classify, normalize};
use domain::{LabelConfig, LabelData, PrinterDialect, TsplSettings};

use super::encoder::{CopySequence, EncodeError, EncodedJob, LabelEncoder};

/// Rough glyph widths in dots of TSPL fonts "2" and "3"; no real metrics
const FONT2_CHAR_DOTS: f64 = 12.0;
const FONT3_CHAR_DOTS: f64 = 16.0;
const TOP_MARGIN: i64 = 8;
const MIN_TEXT_X: i64 = 8;
const NAME_LINE_DOTS: i64 = 24;
const MAX_BARCODE_HEIGHT: i64 = 60;
/// Room kept under the barcode for its human readable line
const BARCODE_FOOTER_DOTS: f64 = 40.0;
const BARCODE_HALF_WIDTH_GUESS: i64 = 80;

/// Line-oriented TSPL script, CRLF terminated
#[derive(Debug, Default)]
pub struct TsplScript {
    lines: Vec<String>,
}

impl TsplScript {
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    pub fn command(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut script = self.lines.join("\r\n");
        script.push_str("\r\n");
        script.into_bytes()
    }
}

/// TSPL encoder. One script per job; the printer replicates the label
/// through `PRINT <copies>,1`.
#[derive(Debug, Clone, Default)]
pub struct TsplEncoder {
    settings: TsplSettings,
}

impl TsplEncoder {
    pub fn new(settings: TsplSettings) -> Self {
        Self { settings }
    }
}

/// TSPL string literals cannot escape quotes and the bitmap fonts are ASCII only
fn check_literal(text: &str) -> Result<(), EncodeError> {
    match text.chars().find(|c| *c == '"' || !(' '..='~').contains(c)) {
        Some(c) => Err(EncodeError::UnsupportedText(format!(
            "{c:?} in {text:?} cannot be sent in a TSPL string"
        ))),
        None => Ok(()),
    }
}

fn centered_x(label_width_dots: f64, chars: usize, char_dots: f64) -> i64 {
    (((label_width_dots - chars as f64 * char_dots) / 2.0).floor() as i64).max(MIN_TEXT_X)
}

impl LabelEncoder for TsplEncoder {
    fn dialect(&self) -> PrinterDialect {
        PrinterDialect::Tspl
    }

    fn encode(&self, data: &LabelData, config: &LabelConfig) -> Result<EncodedJob, EncodeError> {
        let payload = normalize(&data.barcode);
        if payload.is_empty() {
            return Err(EncodeError::EmptyBarcode);
        }
        check_literal(&payload)?;

        let dots_per_mm = self.settings.dots_per_mm as f64;
        let width_dots = config.width * dots_per_mm;
        let height_dots = config.height * dots_per_mm;

        let mut script = TsplScript::new()
            .command(format!("SIZE {} mm, {} mm", config.width, config.height))
            .command(format!("GAP {} mm, 0 mm", self.settings.gap_mm))
            .command(format!("SPEED {}", self.settings.speed))
            .command(format!("DENSITY {}", self.settings.density))
            .command("DIRECTION 1,0")
            .command("REFERENCE 0,0")
            .command("CLS");

        let mut y = TOP_MARGIN;

        if config.show_name && !data.item_name.is_empty() {
            let name: String = data
                .item_name
                .chars()
                .take(self.settings.name_max_chars)
                .collect();
            check_literal(&name)?;
            let x = centered_x(width_dots, name.chars().count(), FONT2_CHAR_DOTS);
            script = script.command(format!("TEXT {x},{y},\"2\",0,1,1,\"{name}\""));
            y += NAME_LINE_DOTS;
        }

        let barcode_height =
            ((height_dots - y as f64 - BARCODE_FOOTER_DOTS).floor() as i64).min(MAX_BARCODE_HEIGHT);
        if barcode_height <= 0 {
            return Err(EncodeError::LabelTooSmall(format!(
                "{} mm leaves no room for the barcode",
                config.height
            )));
        }
        let barcode_x = ((width_dots / 2.0).floor() as i64 - BARCODE_HALF_WIDTH_GUESS).max(0);
        let token = classify(&payload).tspl_token();
        script = script.command(format!(
            "BARCODE {barcode_x},{y},\"{token}\",{barcode_height},1,0,2,2,\"{payload}\""
        ));
        y += barcode_height + 16;

        if let Some(price) = data.printable_price().filter(|_| config.show_price) {
            let text = format!("{}{:.2}", self.settings.currency_prefix, price);
            check_literal(&text)?;
            let x = centered_x(width_dots, text.chars().count(), FONT3_CHAR_DOTS);
            script = script.command(format!("TEXT {x},{y},\"3\",0,1,1,\"{text}\""));
        }

        script = script.command(format!("PRINT {},1", config.copies));

        Ok(EncodedJob {
            dialect: PrinterDialect::Tspl,
            sequences: vec![CopySequence {
                chunks: vec![script.build()],
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script_of(job: &EncodedJob) -> String {
        String::from_utf8(job.sequences[0].chunks[0].clone()).unwrap()
    }

    #[test]
    fn test_full_script() {
        let data = LabelData::new("4006381333931792", "Test Item", Some(19.99));
        let config = LabelConfig::default().with_copies(2);
        let job = TsplEncoder::default().encode(&data, &config).unwrap();

        let expected = [
            "SIZE 50 mm, 30 mm",
            "GAP 2 mm, 0 mm",
            "SPEED 4",
            "DENSITY 8",
            "DIRECTION 1,0",
            "REFERENCE 0,0",
            "CLS",
            "TEXT 146,8,\"2\",0,1,1,\"Test Item\"",
            "BARCODE 120,32,\"128\",60,1,0,2,2,\"4006381333931792\"",
            "TEXT 136,108,\"3\",0,1,1,\"Rs.19.99\"",
            "PRINT 2,1",
        ]
        .join("\r\n")
            + "\r\n";
        assert_eq!(script_of(&job), expected);
    }

    #[test]
    fn test_single_payload_regardless_of_copies() {
        let data = LabelData::new("4006381333931", "Tea", None);
        for copies in [1, 7, 100] {
            let job = TsplEncoder::default()
                .encode(&data, &LabelConfig::default().with_copies(copies))
                .unwrap();
            assert_eq!(job.transfer_count(), 1);
            let script = script_of(&job);
            let print_lines: Vec<&str> =
                script.lines().filter(|l| l.starts_with("PRINT")).collect();
            assert_eq!(print_lines, vec![format!("PRINT {copies},1").as_str()]);
        }
    }

    #[test]
    fn test_symbology_tokens() {
        for (code, token) in [
            ("4006381333931", "\"EAN13\""),
            ("96385074", "\"EAN8\""),
            ("036000291452", "\"UPCA\""),
            ("ABC-123", "\"39\""),
        ] {
            let job = TsplEncoder::default()
                .encode(&LabelData::new(code, "", None), &LabelConfig::default())
                .unwrap();
            assert!(script_of(&job).contains(token), "barcode {code}");
        }
    }

    #[test]
    fn test_without_name_barcode_moves_up() {
        let config = LabelConfig {
            show_name: false,
            show_price: false,
            ..LabelConfig::default()
        };
        let job = TsplEncoder::default()
            .encode(&LabelData::new("ABC", "Hidden", Some(5.0)), &config)
            .unwrap();
        let script = script_of(&job);
        assert!(!script.contains("TEXT"));
        assert!(script.contains("BARCODE 120,8,\"39\",60,"));
    }

    #[test]
    fn test_long_name_is_truncated_and_clamped() {
        let data = LabelData::new("ABC", "X".repeat(30), None);
        let job = TsplEncoder::default()
            .encode(&data, &LabelConfig::default())
            .unwrap();
        // 20 chars * 12 dots = 240, (400 - 240) / 2 = 80
        assert!(script_of(&job).contains(&format!("TEXT 80,8,\"2\",0,1,1,\"{}\"", "X".repeat(20))));

        let narrow = LabelConfig {
            width: 20.0,
            ..LabelConfig::default()
        };
        let job = TsplEncoder::default().encode(&data, &narrow).unwrap();
        assert!(script_of(&job).contains("TEXT 8,8,"));
        assert!(script_of(&job).contains("BARCODE 0,32,"));
    }

    #[test]
    fn test_short_label_limits_barcode_height() {
        let config = LabelConfig {
            height: 12.0,
            ..LabelConfig::default()
        };
        let job = TsplEncoder::default()
            .encode(&LabelData::new("ABC", "Tea", None), &config)
            .unwrap();
        // 96 - 32 - 40 = 24
        assert!(script_of(&job).contains("BARCODE 120,32,\"39\",24,"));
    }

    #[test]
    fn test_rejects_label_without_room_for_barcode() {
        let config = LabelConfig {
            height: 8.0,
            ..LabelConfig::default()
        };
        let result = TsplEncoder::default().encode(&LabelData::new("ABC", "Tea", None), &config);
        assert!(matches!(result, Err(EncodeError::LabelTooSmall(_))));
    }

    #[test]
    fn test_rejects_text_tspl_cannot_quote() {
        let encoder = TsplEncoder::default();
        let config = LabelConfig::default();
        let quoted = LabelData::new("ABC", "12\" ruler", None);
        assert!(matches!(
            encoder.encode(&quoted, &config),
            Err(EncodeError::UnsupportedText(_))
        ));
        let accented = LabelData::new("ABC", "Café", None);
        assert!(matches!(
            encoder.encode(&accented, &config),
            Err(EncodeError::UnsupportedText(_))
        ));
        assert_eq!(
            encoder.encode(&LabelData::new("", "Tea", None), &config),
            Err(EncodeError::EmptyBarcode)
        );
    }

    #[test]
    fn test_fractional_sizes() {
        let config = LabelConfig {
            width: 40.5,
            height: 25.0,
            ..LabelConfig::default()
        };
        let job = TsplEncoder::default()
            .encode(&LabelData::new("ABC", "", None), &config)
            .unwrap();
        assert!(script_of(&job).starts_with("SIZE 40.5 mm, 25 mm\r\n"));
    }
}
