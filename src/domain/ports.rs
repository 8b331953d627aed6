use crate::domain::model::{
    AuditEntry, CanonicalSerial, InvalidSerial, SerialRange, StatusCounts,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// The registry the validation engine queries and the import pipeline
/// rebuilds.
///
/// Writes go through a shadow set: `stage_*` appends batches that are not
/// yet visible to queries, `commit_*` atomically swaps the shadow set in.
/// During the swap window queries observe either the fully-old or the
/// fully-new set, never a mixture. Ranges and invalids are independent sets
/// with independent commits.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Verifies the store is reachable and discards any staged leftovers
    /// from an earlier, aborted import. Failure here is fatal for the
    /// import; nothing has been mutated yet.
    async fn begin_import(&self) -> Result<()>;

    async fn stage_ranges(&self, batch: Vec<SerialRange>) -> Result<usize>;
    async fn commit_ranges(&self) -> Result<usize>;

    async fn stage_invalids(&self, batch: Vec<InvalidSerial>) -> Result<usize>;
    async fn commit_invalids(&self) -> Result<usize>;

    async fn is_invalid(&self, serial: &CanonicalSerial) -> Result<bool>;

    /// All active ranges with `start <= serial <= end` under canonical
    /// lexicographic order, inclusive on both ends.
    async fn find_ranges(&self, serial: &CanonicalSerial) -> Result<Vec<SerialRange>>;

    async fn all_ranges(&self) -> Result<Vec<SerialRange>>;

    /// Active (ranges, invalids) sizes.
    async fn counts(&self) -> Result<(usize, usize)>;
}

/// Append-only record of handled inbound messages.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> Result<()>;
    async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>>;
    async fn status_counts(&self) -> Result<StatusCounts>;
}

/// Keyed operator-facing log records (import report, collision report, last
/// imported batch name).
#[async_trait]
pub trait StatusLog: Send + Sync {
    async fn set(&self, name: &str, value: &str) -> Result<()>;
    async fn get(&self, name: &str) -> Result<Option<String>>;
}

/// Outbound SMS transport.
#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send(&self, receptor: &str, message: &str) -> Result<()>;
}
