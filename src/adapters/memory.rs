use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::model::{
    AuditEntry, CanonicalSerial, InvalidSerial, SerialRange, StatusCounts, ValidationStatus,
};
use crate::domain::ports::{AuditLog, RegistryStore, StatusLog};
use crate::utils::error::Result;

/// The active registry state, immutable once published. Readers grab the
/// current snapshot and never observe a half-replaced set.
#[derive(Debug, Default)]
struct RegistrySnapshot {
    ranges: Vec<SerialRange>,
    invalids: HashSet<CanonicalSerial>,
}

#[derive(Debug, Default)]
struct Staging {
    ranges: Vec<SerialRange>,
    invalids: Vec<InvalidSerial>,
}

/// In-memory [`RegistryStore`]: staged writes accumulate behind a mutex,
/// commits publish a fresh snapshot through an atomic pointer swap. Ranges
/// and invalids commit independently; each commit carries the other set
/// forward unchanged.
#[derive(Clone)]
pub struct MemoryRegistry {
    inner: Arc<MemoryRegistryInner>,
}

struct MemoryRegistryInner {
    snap: ArcSwap<RegistrySnapshot>,
    staging: Mutex<Staging>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        MemoryRegistry {
            inner: Arc::new(MemoryRegistryInner {
                snap: ArcSwap::from_pointee(RegistrySnapshot::default()),
                staging: Mutex::new(Staging::default()),
            }),
        }
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistryStore for MemoryRegistry {
    async fn begin_import(&self) -> Result<()> {
        let mut staging = self.inner.staging.lock().await;
        staging.ranges.clear();
        staging.invalids.clear();
        Ok(())
    }

    async fn stage_ranges(&self, batch: Vec<SerialRange>) -> Result<usize> {
        let staged = batch.len();
        let mut staging = self.inner.staging.lock().await;
        staging.ranges.extend(batch);
        Ok(staged)
    }

    async fn commit_ranges(&self) -> Result<usize> {
        let mut staging = self.inner.staging.lock().await;
        let mut ranges = std::mem::take(&mut staging.ranges);
        ranges.sort_by(|a, b| a.start.cmp(&b.start));
        let active = ranges.len();
        let current = self.inner.snap.load();
        self.inner.snap.store(Arc::new(RegistrySnapshot {
            ranges,
            invalids: current.invalids.clone(),
        }));
        Ok(active)
    }

    async fn stage_invalids(&self, batch: Vec<InvalidSerial>) -> Result<usize> {
        let staged = batch.len();
        let mut staging = self.inner.staging.lock().await;
        staging.invalids.extend(batch);
        Ok(staged)
    }

    async fn commit_invalids(&self) -> Result<usize> {
        let mut staging = self.inner.staging.lock().await;
        let invalids: HashSet<CanonicalSerial> = std::mem::take(&mut staging.invalids)
            .into_iter()
            .map(|invalid| invalid.serial)
            .collect();
        let active = invalids.len();
        let current = self.inner.snap.load();
        self.inner.snap.store(Arc::new(RegistrySnapshot {
            ranges: current.ranges.clone(),
            invalids,
        }));
        Ok(active)
    }

    async fn is_invalid(&self, serial: &CanonicalSerial) -> Result<bool> {
        Ok(self.inner.snap.load().invalids.contains(serial))
    }

    async fn find_ranges(&self, serial: &CanonicalSerial) -> Result<Vec<SerialRange>> {
        let snap = self.inner.snap.load();
        Ok(snap
            .ranges
            .iter()
            .filter(|range| range.contains(serial))
            .cloned()
            .collect())
    }

    async fn all_ranges(&self) -> Result<Vec<SerialRange>> {
        Ok(self.inner.snap.load().ranges.clone())
    }

    async fn counts(&self) -> Result<(usize, usize)> {
        let snap = self.inner.snap.load();
        Ok((snap.ranges.len(), snap.invalids.len()))
    }
}

/// In-memory [`AuditLog`].
#[derive(Clone)]
pub struct MemoryAuditLog {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        MemoryAuditLog {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Default for MemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn record(&self, entry: AuditEntry) -> Result<()> {
        self.entries.lock().await.push(entry);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        let entries = self.entries.lock().await;
        Ok(entries.iter().rev().take(limit).cloned().collect())
    }

    async fn status_counts(&self) -> Result<StatusCounts> {
        let entries = self.entries.lock().await;
        let mut counts = StatusCounts::default();
        for entry in entries.iter() {
            match entry.status {
                ValidationStatus::Ok => counts.ok += 1,
                ValidationStatus::Failure => counts.failure += 1,
                ValidationStatus::Double => counts.double += 1,
                ValidationStatus::NotFound => counts.not_found += 1,
            }
        }
        Ok(counts)
    }
}

/// In-memory [`StatusLog`].
#[derive(Clone)]
pub struct MemoryStatusLog {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStatusLog {
    pub fn new() -> Self {
        MemoryStatusLog {
            values: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for MemoryStatusLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatusLog for MemoryStatusLog {
    async fn set(&self, name: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .await
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(self.values.lock().await.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalize::normalize;
    use crate::domain::model::SERIAL_WIDTH;
    use chrono::NaiveDate;

    fn range(id: i64, start: &str, end: &str) -> SerialRange {
        SerialRange {
            id,
            reference: String::new(),
            description: String::new(),
            start: normalize(start, SERIAL_WIDTH).unwrap(),
            end: normalize(end, SERIAL_WIDTH).unwrap(),
            effective_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    fn serial(raw: &str) -> CanonicalSerial {
        normalize(raw, SERIAL_WIDTH).unwrap()
    }

    #[tokio::test]
    async fn test_staged_rows_are_invisible_until_commit() {
        let store = MemoryRegistry::new();
        store.begin_import().await.unwrap();
        store
            .stage_ranges(vec![range(1, "AA100", "AA200")])
            .await
            .unwrap();

        assert!(store.find_ranges(&serial("AA150")).await.unwrap().is_empty());

        store.commit_ranges().await.unwrap();
        assert_eq!(store.find_ranges(&serial("AA150")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_commit_replaces_the_whole_set() {
        let store = MemoryRegistry::new();
        store.begin_import().await.unwrap();
        store
            .stage_ranges(vec![range(1, "AA100", "AA200")])
            .await
            .unwrap();
        store.commit_ranges().await.unwrap();

        store.begin_import().await.unwrap();
        store
            .stage_ranges(vec![range(2, "BB100", "BB200")])
            .await
            .unwrap();
        // Old data stays queryable while the new set is still staged.
        assert_eq!(store.find_ranges(&serial("AA150")).await.unwrap().len(), 1);

        store.commit_ranges().await.unwrap();
        assert!(store.find_ranges(&serial("AA150")).await.unwrap().is_empty());
        assert_eq!(store.find_ranges(&serial("BB150")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_range_commit_preserves_invalids() {
        let store = MemoryRegistry::new();
        store.begin_import().await.unwrap();
        store
            .stage_invalids(vec![InvalidSerial {
                serial: serial("XX1"),
            }])
            .await
            .unwrap();
        store.commit_invalids().await.unwrap();

        store
            .stage_ranges(vec![range(1, "AA100", "AA200")])
            .await
            .unwrap();
        store.commit_ranges().await.unwrap();

        assert!(store.is_invalid(&serial("XX1")).await.unwrap());
        assert_eq!(store.counts().await.unwrap(), (1, 1));
    }

    #[tokio::test]
    async fn test_begin_import_discards_stale_staging() {
        let store = MemoryRegistry::new();
        store.begin_import().await.unwrap();
        store
            .stage_ranges(vec![range(1, "AA100", "AA200")])
            .await
            .unwrap();

        // A new import starts before the old one committed.
        store.begin_import().await.unwrap();
        store.commit_ranges().await.unwrap();
        assert_eq!(store.counts().await.unwrap(), (0, 0));
    }

    #[tokio::test]
    async fn test_find_ranges_bounds_are_inclusive() {
        let store = MemoryRegistry::new();
        store.begin_import().await.unwrap();
        store
            .stage_ranges(vec![range(1, "AA100", "AA200")])
            .await
            .unwrap();
        store.commit_ranges().await.unwrap();

        assert_eq!(store.find_ranges(&serial("AA100")).await.unwrap().len(), 1);
        assert_eq!(store.find_ranges(&serial("AA200")).await.unwrap().len(), 1);
        assert!(store.find_ranges(&serial("AA99")).await.unwrap().is_empty());
        assert!(store.find_ranges(&serial("AA201")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_ranges_all_match() {
        let store = MemoryRegistry::new();
        store.begin_import().await.unwrap();
        store
            .stage_ranges(vec![
                range(1, "AA100", "AA200"),
                range(2, "AA150", "AA300"),
            ])
            .await
            .unwrap();
        store.commit_ranges().await.unwrap();

        assert_eq!(store.find_ranges(&serial("AA175")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_status_log_overwrites_by_key() {
        let status = MemoryStatusLog::new();
        status.set("import", "first").await.unwrap();
        status.set("import", "second").await.unwrap();
        assert_eq!(
            status.get("import").await.unwrap().as_deref(),
            Some("second")
        );
        assert!(status.get("db_check").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_audit_recent_is_newest_first() {
        let audit = MemoryAuditLog::new();
        for (i, status) in [
            ValidationStatus::Ok,
            ValidationStatus::NotFound,
            ValidationStatus::Double,
        ]
        .into_iter()
        .enumerate()
        {
            audit
                .record(AuditEntry {
                    status,
                    sender: format!("sender-{i}"),
                    message: format!("message-{i}"),
                    answer: String::new(),
                    date: NaiveDate::from_ymd_opt(2024, 1, 1)
                        .unwrap()
                        .and_hms_opt(12, 0, i as u32)
                        .unwrap(),
                })
                .await
                .unwrap();
        }

        let recent = audit.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].sender, "sender-2");
        assert_eq!(recent[1].sender, "sender-1");
    }
}
