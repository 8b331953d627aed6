use chrono::NaiveDate;

use crate::core::normalize::normalize;
use crate::domain::model::{
    ImportReport, InvalidSerial, RawInvalidRow, RawRangeRow, SerialRange,
};
use crate::domain::ports::{RegistryStore, StatusLog};
use crate::utils::error::{RegistryError, Result};

pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_MAX_ERRORS: usize = 100;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y"];

/// Placeholder effective date for rows whose date cell is blank, carried
/// over from the legacy spreadsheets.
fn sentinel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2012, 7, 2).unwrap()
}

/// Accumulates row errors with a reporting cap. Capped entries collapse into
/// a single marker; the tally keeps counting past the cap. Batch-level
/// problems bypass the cap via [`ErrorLog::note`].
struct ErrorLog {
    entries: Vec<String>,
    total: usize,
    cap: usize,
}

impl ErrorLog {
    fn new(cap: usize) -> Self {
        ErrorLog {
            entries: Vec::new(),
            total: 0,
            cap,
        }
    }

    fn push(&mut self, message: String) {
        self.total += 1;
        if self.total < self.cap {
            self.entries.push(message);
        } else if self.total == self.cap {
            self.entries.push("Too many errors!".to_string());
        }
    }

    fn note(&mut self, message: String) {
        self.entries.push(message);
    }
}

/// Rebuilds the registry from two row streams: serial ranges and invalid
/// serials.
///
/// Every row is normalized and staged independently; a failing row is
/// recorded and the batch continues. Staged rows are flushed to the store in
/// batches and become visible all at once when the set is committed. The
/// accumulated error log is filed under the `import` status key,
/// newest-first, headed by the summary line.
///
/// `run` takes `&mut self`: one import at a time per pipeline. Callers that
/// share a pipeline across tasks must serialize access (an async mutex).
pub struct ImportPipeline<S, L> {
    store: S,
    status: L,
    width: usize,
    batch_size: usize,
    max_errors: usize,
}

impl<S, L> ImportPipeline<S, L>
where
    S: RegistryStore,
    L: StatusLog,
{
    pub fn new(store: S, status: L, width: usize) -> Self {
        ImportPipeline {
            store,
            status,
            width,
            batch_size: DEFAULT_BATCH_SIZE,
            max_errors: DEFAULT_MAX_ERRORS,
        }
    }

    pub fn with_limits(mut self, batch_size: usize, max_errors: usize) -> Self {
        self.batch_size = batch_size;
        self.max_errors = max_errors;
        self
    }

    /// Runs one full import. The only fatal condition is a store that cannot
    /// be reached at the start; every later failure is folded into the
    /// report and the run continues to completion.
    pub async fn run<R, I>(&mut self, range_rows: R, invalid_rows: I) -> Result<ImportReport>
    where
        R: IntoIterator<Item = RawRangeRow>,
        I: IntoIterator<Item = RawInvalidRow>,
    {
        self.store.begin_import().await?;

        let mut log = ErrorLog::new(self.max_errors);
        let mut ranges_inserted = 0usize;
        let mut staged_ranges: Vec<SerialRange> = Vec::new();
        // Line numbers match the spreadsheet, where line 1 is the header.
        let mut line_number = 1i64;

        for row in range_rows {
            line_number += 1;
            match self.prepare_range(row) {
                Ok(range) => staged_ranges.push(range),
                Err(e) => log.push(format!(
                    "Error inserting line {line_number} from the serials sheet; {e}"
                )),
            }
            if staged_ranges.len() >= self.batch_size {
                self.flush_ranges(&mut staged_ranges, &mut ranges_inserted, &mut log, line_number)
                    .await;
            }
        }
        self.flush_ranges(&mut staged_ranges, &mut ranges_inserted, &mut log, line_number)
            .await;
        match self.store.commit_ranges().await {
            Ok(active) => tracing::info!("committed {active} serial ranges"),
            Err(e) => log.note(format!("Problem committing serials into the store; {e}")),
        }

        let mut invalids_inserted = 0usize;
        let mut staged_invalids: Vec<InvalidSerial> = Vec::new();
        line_number = 1;

        for row in invalid_rows {
            line_number += 1;
            match self.prepare_invalid(row) {
                Ok(invalid) => staged_invalids.push(invalid),
                Err(e) => log.push(format!(
                    "Error inserting line {line_number} from the invalids sheet; {e}"
                )),
            }
            if staged_invalids.len() >= self.batch_size {
                self.flush_invalids(
                    &mut staged_invalids,
                    &mut invalids_inserted,
                    &mut log,
                    line_number,
                )
                .await;
            }
        }
        self.flush_invalids(
            &mut staged_invalids,
            &mut invalids_inserted,
            &mut log,
            line_number,
        )
        .await;
        match self.store.commit_invalids().await {
            Ok(active) => tracing::info!("committed {active} invalid serials"),
            Err(e) => log.note(format!(
                "Problem committing invalid serials into the store; {e}"
            )),
        }

        let summary = format!("Inserted {ranges_inserted} serials and {invalids_inserted} invalids");
        tracing::info!("{summary}");

        let mut artifact = log.entries.clone();
        artifact.push(summary);
        artifact.reverse();
        if let Err(e) = self.status.set("import", &artifact.join("\n")).await {
            tracing::warn!("could not persist the import log: {e}");
        }

        let mut errors = log.entries;
        errors.reverse();
        Ok(ImportReport {
            ranges_inserted,
            invalids_inserted,
            errors,
            total_errors: log.total,
        })
    }

    fn prepare_range(&self, row: RawRangeRow) -> Result<SerialRange> {
        if row.start_serial.trim().is_empty() || row.end_serial.trim().is_empty() {
            return Err(RegistryError::EmptySerial);
        }
        let reference = row.reference.unwrap_or_default();
        let description = row.description.unwrap_or_default();
        let effective_date = parse_effective_date(row.date.as_deref())?;
        let start = normalize(&row.start_serial, self.width)?;
        let end = normalize(&row.end_serial, self.width)?;
        Ok(SerialRange {
            id: row.row,
            reference,
            description,
            start,
            end,
            effective_date,
        })
    }

    fn prepare_invalid(&self, row: RawInvalidRow) -> Result<InvalidSerial> {
        if row.failed_serial.trim().is_empty() {
            return Err(RegistryError::EmptySerial);
        }
        let serial = normalize(&row.failed_serial, self.width)?;
        Ok(InvalidSerial { serial })
    }

    async fn flush_ranges(
        &self,
        staged: &mut Vec<SerialRange>,
        inserted: &mut usize,
        log: &mut ErrorLog,
        line_number: i64,
    ) {
        if staged.is_empty() {
            return;
        }
        let batch = std::mem::take(staged);
        let size = batch.len();
        match self.store.stage_ranges(batch).await {
            Ok(count) => *inserted += count,
            Err(e) => log.note(format!(
                "Problem staging serials into the store around record {line_number} (or the previous {size} ones); {e}"
            )),
        }
    }

    async fn flush_invalids(
        &self,
        staged: &mut Vec<InvalidSerial>,
        inserted: &mut usize,
        log: &mut ErrorLog,
        line_number: i64,
    ) {
        if staged.is_empty() {
            return;
        }
        let batch = std::mem::take(staged);
        let size = batch.len();
        match self.store.stage_invalids(batch).await {
            Ok(count) => *inserted += count,
            Err(e) => log.note(format!(
                "Problem staging invalid serials into the store around record {line_number} (or the previous {size} ones); {e}"
            )),
        }
    }
}

/// A blank date cell falls back to the legacy placeholder; an unparseable
/// one is a row error.
fn parse_effective_date(raw: Option<&str>) -> Result<NaiveDate> {
    let raw = match raw {
        None => return Ok(sentinel_date()),
        Some(s) if s.trim().is_empty() => return Ok(sentinel_date()),
        Some(s) => s.trim(),
    };
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Ok(date);
        }
    }
    Err(RegistryError::InvalidDate {
        value: raw.to_string(),
    })
}
