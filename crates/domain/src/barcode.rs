use serde::{Deserialize, Serialize};

/// Barcode symbology derived from the barcode text
///
/// Never stored: always recomputed from the code with [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarcodeSymbology {
    #[serde(rename = "EAN13")]
    Ean13,
    #[serde(rename = "EAN8")]
    Ean8,
    #[serde(rename = "UPCA")]
    UpcA,
    #[serde(rename = "CODE39")]
    Code39,
    #[serde(rename = "CODE128")]
    Code128,
}

impl BarcodeSymbology {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ean13 => "EAN13",
            Self::Ean8 => "EAN8",
            Self::UpcA => "UPCA",
            Self::Code39 => "CODE39",
            Self::Code128 => "CODE128",
        }
    }

    /// Barcode system `m` of the ESC/POS `GS k m n d1..dn` command
    pub fn escpos_code(&self) -> u8 {
        match self {
            Self::UpcA => 65,
            Self::Ean13 => 67,
            Self::Ean8 => 68,
            Self::Code39 => 69,
            Self::Code128 => 73,
        }
    }

    /// Code type token of the TSPL `BARCODE` command
    pub fn tspl_token(&self) -> &'static str {
        match self {
            Self::Ean13 => "EAN13",
            Self::Ean8 => "EAN8",
            Self::UpcA => "UPCA",
            Self::Code39 => "39",
            Self::Code128 => "128",
        }
    }
}

impl std::fmt::Display for BarcodeSymbology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Remove every whitespace character from a scanned or typed code
pub fn normalize(code: &str) -> String {
    code.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Determine the symbology to print `code` with.
///
/// Rules:
/// - 8 digits with a valid check digit: EAN-8
/// - 12 digits with a valid check digit: UPC-A
/// - 13 digits with a valid check digit: EAN-13
/// - any other all-digit string (including 14-digit ITF/GTIN codes): CODE128
/// - `A-Z 0-9 - . $ / + %` and space: CODE39
/// - everything else: CODE128
///
/// Total: every input maps to a printable symbology.
pub fn classify(code: &str) -> BarcodeSymbology {
    let clean = normalize(code);

    if is_numeric(&clean) {
        return match clean.len() {
            8 if validate_ean(&clean) => BarcodeSymbology::Ean8,
            12 if validate_upca(&clean) => BarcodeSymbology::UpcA,
            13 if validate_ean(&clean) => BarcodeSymbology::Ean13,
            _ => BarcodeSymbology::Code128,
        };
    }

    if is_code39_charset(&clean) {
        BarcodeSymbology::Code39
    } else {
        BarcodeSymbology::Code128
    }
}

/// Validate the check digit of an EAN-8 or EAN-13 code.
///
/// EAN-13 weights the twelve data digits 1,3,1,3,...; shorter codes
/// (EAN-8) weight them 3,1,3,1,...
pub fn validate_ean(code: &str) -> bool {
    let Some((data, check)) = split_check_digit(code) else {
        return false;
    };
    let is_ean13 = data.len() == 12;
    let sum: u32 = data
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let weight = match (is_ean13, i % 2 == 0) {
                (true, true) | (false, false) => 1,
                (true, false) | (false, true) => 3,
            };
            d * weight
        })
        .sum();
    (10 - sum % 10) % 10 == check
}

/// Validate the check digit of a UPC-A code (data digits weighted 3,1,3,1,...)
pub fn validate_upca(code: &str) -> bool {
    let Some((data, check)) = split_check_digit(code) else {
        return false;
    };
    let sum: u32 = data
        .iter()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d * 3 } else { *d })
        .sum();
    (10 - sum % 10) % 10 == check
}

fn split_check_digit(code: &str) -> Option<(Vec<u32>, u32)> {
    if code.len() < 2 || !is_numeric(code) {
        return None;
    }
    let mut digits: Vec<u32> = code.chars().filter_map(|c| c.to_digit(10)).collect();
    let check = digits.pop()?;
    Some((digits, check))
}

fn is_numeric(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit())
}

fn is_code39_charset(code: &str) -> bool {
    !code.is_empty()
        && code.bytes().all(|b| {
            b.is_ascii_uppercase()
                || b.is_ascii_digit()
                || matches!(b, b'-' | b'.' | b' ' | b'$' | b'/' | b'+' | b'%')
        })
}
