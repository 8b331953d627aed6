use crate::domain::model::CanonicalSerial;
use crate::utils::error::{RegistryError, Result};

/// Standardizes a free-form serial number into its canonical form:
/// uppercase English letters first, then zero padding, then ASCII digits,
/// at a fixed total width.
///
/// Persian and Arabic-Indic digit glyphs are translated to ASCII digits;
/// every other non-alphanumeric character is dropped, as are letters outside
/// `A-Z` after uppercasing. The relative order of letters and of digits is
/// preserved.
///
/// Fails with [`RegistryError::SerialOverflow`] when the letters and digits
/// together do not fit into `width`.
pub fn normalize(raw: &str, width: usize) -> Result<CanonicalSerial> {
    let mut alpha = String::new();
    let mut digits = String::new();

    for c in raw.chars().filter(|c| c.is_alphanumeric()) {
        let c = translate_digit(c).to_ascii_uppercase();
        if c.is_ascii_uppercase() {
            alpha.push(c);
        } else if c.is_ascii_digit() {
            digits.push(c);
        }
    }

    let significant = alpha.len() + digits.len();
    if significant > width {
        return Err(RegistryError::SerialOverflow {
            serial: raw.to_string(),
            length: significant,
            width,
        });
    }

    Ok(CanonicalSerial::from_parts(
        &alpha,
        width - significant,
        &digits,
    ))
}

/// Maps Persian (U+06F0..U+06F9) and Arabic-Indic (U+0660..U+0669) digit
/// glyphs onto `0-9`; every other character passes through unchanged.
fn translate_digit(c: char) -> char {
    let code = c as u32;
    let offset = match code {
        0x06F0..=0x06F9 => code - 0x06F0,
        0x0660..=0x0669 => code - 0x0660,
        _ => return c,
    };
    (b'0' + offset as u8) as char
}
