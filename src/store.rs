//! Storage boundary for lead records.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::filter::LeadFilter;
use crate::models::{Lead, LeadPatch, NewLead};

/// Persistent lead collection.
///
/// `find` always orders by `created_at` descending (newest first).
/// Implementations add no locking beyond their own; concurrent writes to the
/// same record resolve last-write-wins.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Inserts a record, assigning its identity and timestamps.
    async fn insert(&self, lead: NewLead) -> Result<Lead, AppError>;

    /// Returns at most `limit` matches after skipping `skip` of them.
    async fn find(&self, filter: &LeadFilter, skip: u64, limit: u64)
        -> Result<Vec<Lead>, AppError>;

    /// Counts every match, ignoring pagination.
    async fn count(&self, filter: &LeadFilter) -> Result<u64, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lead>, AppError>;

    /// Applies the patch, returning `None` if no record has this identity.
    async fn update_by_id(&self, id: Uuid, patch: &LeadPatch) -> Result<Option<Lead>, AppError>;

    /// Returns whether a record was removed.
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError>;

    /// Empties the collection, returning how many records were removed.
    async fn delete_all(&self) -> Result<u64, AppError>;
}
