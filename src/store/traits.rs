//! Persistence collaborator trait.

use crate::core::error::StoreResult;
use crate::store::record::{HistoryRecord, PolicyResultRecord, StatusFilter, StatusRecord};

use async_trait::async_trait;
use std::fmt::Debug;

/// Access to the status, status history and policy result tables.
///
/// The wire format and transport are the implementation's business; this
/// crate only needs filtered reads, upserts and deletes.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use gridstatus::store::{StatusStore, StatusRecord, StatusFilter, HistoryRecord, PolicyResultRecord};
/// use gridstatus::StoreResult;
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct SqlStatusStore { /* pool */ }
///
/// #[async_trait]
/// impl StatusStore for SqlStatusStore {
///     async fn select_status(&self, filter: &StatusFilter) -> StoreResult<Vec<StatusRecord>> {
///         todo!()
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait StatusStore: Send + Sync + Debug {
    /// Returns the current status rows matching `filter`.
    async fn select_status(&self, filter: &StatusFilter) -> StoreResult<Vec<StatusRecord>>;

    /// Inserts the row, or updates the row with the same element, name,
    /// status type and VO.
    ///
    /// `date_effective` is kept when the status does not change. Every
    /// status change is archived in the history table.
    async fn add_or_modify_status(&self, record: StatusRecord) -> StoreResult<()>;

    /// Deletes the current status rows matching `filter`, returning how many.
    async fn delete_status(&self, filter: &StatusFilter) -> StoreResult<usize>;

    /// Returns archived rows matching `filter`, newest first.
    async fn select_history(&self, filter: &StatusFilter) -> StoreResult<Vec<HistoryRecord>>;

    /// Appends a policy result row.
    async fn insert_policy_result(&self, record: PolicyResultRecord) -> StoreResult<()>;

    /// Returns policy result rows matching `filter`, oldest first.
    async fn select_policy_results(
        &self,
        filter: &StatusFilter,
    ) -> StoreResult<Vec<PolicyResultRecord>>;

    /// Returns the current row for one element axis, if any.
    async fn current_status(
        &self,
        filter: &StatusFilter,
    ) -> StoreResult<Option<StatusRecord>> {
        let mut rows = self.select_status(filter).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    /// Returns the status an element had before its current one, if any.
    async fn previous_status(
        &self,
        filter: &StatusFilter,
    ) -> StoreResult<Option<HistoryRecord>> {
        let history = self.select_history(filter).await?;
        Ok(history.into_iter().nth(1))
    }
}
