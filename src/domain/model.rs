use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Default width of the canonical serial form. All persisted ranges and
/// invalid serials share one width; comparing serials of different widths is
/// meaningless.
pub const SERIAL_WIDTH: usize = 30;

/// A serial number in canonical form: uppercase alphabetic prefix, zero
/// padding, ASCII digit suffix, at a fixed total width.
///
/// The fixed width makes plain lexicographic order equal to the intended
/// alphabetic-then-numeric order, so range lookups compare canonical strings
/// directly. Values are only produced by [`crate::core::normalize`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalSerial(String);

impl CanonicalSerial {
    pub(crate) fn from_parts(alpha: &str, padding: usize, digits: &str) -> Self {
        let mut s = String::with_capacity(alpha.len() + padding + digits.len());
        s.push_str(alpha);
        for _ in 0..padding {
            s.push('0');
        }
        s.push_str(digits);
        CanonicalSerial(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn width(&self) -> usize {
        self.0.len()
    }

    /// Splits the canonical form back into its alphabetic prefix and numeric
    /// value. Padding zeros are absorbed into the integer, so
    /// `AA0000000000000000000000000090` splits into `("AA", 90)`.
    ///
    /// A serial with no digits at all has numeric value 0.
    pub fn split(&self) -> (String, u128) {
        let alpha: String = self.0.chars().filter(|c| c.is_ascii_alphabetic()).collect();
        let digits: String = self.0.chars().filter(|c| c.is_ascii_digit()).collect();
        let value = digits.parse::<u128>().unwrap_or(0);
        (alpha, value)
    }
}

impl std::fmt::Display for CanonicalSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One registry entry: every canonical serial between `start` and `end`
/// (inclusive on both ends) belongs to the product batch described here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerialRange {
    /// Row ordinal from the source batch; used to name the range in
    /// collision reports.
    pub id: i64,
    pub reference: String,
    pub description: String,
    pub start: CanonicalSerial,
    pub end: CanonicalSerial,
    pub effective_date: NaiveDate,
}

impl SerialRange {
    pub fn contains(&self, serial: &CanonicalSerial) -> bool {
        self.start <= *serial && *serial <= self.end
    }
}

/// Denylist member: a serial known to be counterfeit or defective.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvalidSerial {
    pub serial: CanonicalSerial,
}

/// Classification of one validation query. The wire strings are a stable
/// contract consumed by the webhook handler, the lookup API and the audit
/// log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "FAILURE")]
    Failure,
    #[serde(rename = "DOUBLE")]
    Double,
    #[serde(rename = "NOT-FOUND")]
    NotFound,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Ok => "OK",
            ValidationStatus::Failure => "FAILURE",
            ValidationStatus::Double => "DOUBLE",
            ValidationStatus::NotFound => "NOT-FOUND",
        }
    }
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of validating one raw serial. Transient; persistence of outcomes
/// is the audit log's concern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationOutcome {
    pub status: ValidationStatus,
    pub matched: Option<SerialRange>,
    pub answer: String,
}

/// Problems found by the collision checker, newest-first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollisionReport {
    pub problems: Vec<String>,
}

impl CollisionReport {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn render(&self) -> String {
        self.problems.join("\n")
    }
}

/// Outcome of one bulk import run.
///
/// `errors` is capped for reporting; `total_errors` counts every underlying
/// row failure regardless of the cap.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub ranges_inserted: usize,
    pub invalids_inserted: usize,
    pub errors: Vec<String>,
    pub total_errors: usize,
}

/// One processed inbound message, as persisted by the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub status: ValidationStatus,
    pub sender: String,
    pub message: String,
    pub answer: String,
    pub date: NaiveDateTime,
}

/// Per-status totals over the audit log, for the status surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub ok: usize,
    pub failure: usize,
    pub double: usize,
    pub not_found: usize,
}

/// One row of the range sheet, as handed to the import pipeline. The date
/// arrives as raw text; parsing it is the pipeline's job.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRangeRow {
    pub row: i64,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub start_serial: String,
    pub end_serial: String,
    pub date: Option<String>,
}

/// One row of the invalid-serial sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct RawInvalidRow {
    pub failed_serial: String,
}
