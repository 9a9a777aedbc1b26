//! In-memory status store.

use crate::core::error::{StoreError, StoreResult};
use crate::store::record::{HistoryRecord, PolicyResultRecord, StatusFilter, StatusRecord};
use crate::store::traits::StatusStore;

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

/// A status store kept in process memory.
///
/// Useful for tests, demos and single-process deployments. It can be made
/// to fail on demand to exercise error paths.
#[derive(Debug, Default)]
pub struct InMemoryStatusStore {
    status: RwLock<Vec<StatusRecord>>,
    history: RwLock<Vec<HistoryRecord>>,
    policy_results: RwLock<Vec<PolicyResultRecord>>,
    unavailable: AtomicBool,
    write_count: AtomicU64,
}

impl InMemoryStatusStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with `rows`.
    pub fn with_rows(rows: Vec<StatusRecord>) -> Self {
        let store = Self::new();
        {
            let mut history = store
                .history
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            history.extend(rows.iter().cloned().map(HistoryRecord::new));
        }
        *store
            .status
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = rows;
        store
    }

    /// Makes every operation fail until [`Self::set_available`] is called.
    pub fn set_unavailable(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }

    /// Makes operations succeed again.
    pub fn set_available(&self) {
        self.unavailable.store(false, Ordering::SeqCst);
    }

    /// Returns the number of successful writes.
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    /// Returns every current status row.
    pub fn rows(&self) -> Vec<StatusRecord> {
        self.status
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                reason: "store marked unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn select_status(&self, filter: &StatusFilter) -> StoreResult<Vec<StatusRecord>> {
        self.check_available()?;
        let status = self
            .status
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(status
            .iter()
            .filter(|record| filter.matches(record))
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn add_or_modify_status(&self, mut record: StatusRecord) -> StoreResult<()> {
        self.check_available()?;
        let mut status = self
            .status
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let changed = match status.iter_mut().find(|row| row.same_key(&record)) {
            Some(existing) => {
                let changed = existing.status != record.status;
                if !changed {
                    record.date_effective = existing.date_effective;
                }
                *existing = record.clone();
                changed
            }
            None => {
                status.push(record.clone());
                true
            }
        };
        drop(status);

        if changed {
            self.history
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(HistoryRecord::new(record));
        }
        self.write_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn delete_status(&self, filter: &StatusFilter) -> StoreResult<usize> {
        self.check_available()?;
        let mut status = self
            .status
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = status.len();
        status.retain(|record| !filter.matches(record));
        Ok(before - status.len())
    }

    async fn select_history(&self, filter: &StatusFilter) -> StoreResult<Vec<HistoryRecord>> {
        self.check_available()?;
        let history = self
            .history
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(history
            .iter()
            .rev()
            .filter(|entry| filter.matches(&entry.record))
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn insert_policy_result(&self, record: PolicyResultRecord) -> StoreResult<()> {
        self.check_available()?;
        self.policy_results
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record);
        self.write_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn select_policy_results(
        &self,
        filter: &StatusFilter,
    ) -> StoreResult<Vec<PolicyResultRecord>> {
        self.check_available()?;
        let results = self
            .policy_results
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(results
            .iter()
            .filter(|record| filter.matches_policy_result(record))
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}
