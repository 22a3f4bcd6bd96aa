use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::filter::LeadFilter;
use crate::models::{Lead, LeadPatch, NewLead};
use crate::store::LeadStore;

/// Lead store kept in process memory. Used by tests and local demos.
///
/// Records are kept in insertion order; leads sharing a `created_at` come
/// back newest-inserted first.
#[derive(Debug, Default)]
pub struct InMemoryLeadStore {
    leads: RwLock<Vec<Lead>>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from existing records, keeping their identities and timestamps.
    pub fn with_leads(leads: Vec<Lead>) -> Self {
        Self {
            leads: RwLock::new(leads),
        }
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn insert(&self, lead: NewLead) -> Result<Lead, AppError> {
        let lead = lead.into_lead(Uuid::new_v4(), Utc::now());
        self.leads.write().await.push(lead.clone());
        Ok(lead)
    }

    async fn find(
        &self,
        filter: &LeadFilter,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Lead>, AppError> {
        let leads = self.leads.read().await;
        let mut matched: Vec<&Lead> = leads.iter().rev().filter(|l| filter.matches(l)).collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(matched.into_iter().skip(skip).take(limit).cloned().collect())
    }

    async fn count(&self, filter: &LeadFilter) -> Result<u64, AppError> {
        let leads = self.leads.read().await;
        Ok(leads.iter().filter(|l| filter.matches(l)).count() as u64)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lead>, AppError> {
        let leads = self.leads.read().await;
        Ok(leads.iter().find(|l| l.id == id).cloned())
    }

    async fn update_by_id(&self, id: Uuid, patch: &LeadPatch) -> Result<Option<Lead>, AppError> {
        let mut leads = self.leads.write().await;
        Ok(leads.iter_mut().find(|l| l.id == id).map(|lead| {
            patch.apply(lead, Utc::now());
            lead.clone()
        }))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError> {
        let mut leads = self.leads.write().await;
        match leads.iter().position(|l| l.id == id) {
            Some(index) => {
                leads.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_all(&self) -> Result<u64, AppError> {
        let mut leads = self.leads.write().await;
        let removed = leads.len() as u64;
        leads.clear();
        Ok(removed)
    }
}
