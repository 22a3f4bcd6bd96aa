use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::filter::LeadQuery;
use crate::models::{Lead, LeadPage, LeadPatch, MessageResponse, NewLead};
use crate::store::LeadStore;

/// Lead operations on top of a [`LeadStore`].
#[derive(Clone)]
pub struct LeadService {
    store: Arc<dyn LeadStore>,
}

impl LeadService {
    pub fn new(store: Arc<dyn LeadStore>) -> Self {
        Self { store }
    }

    /// Lists leads matching the query-string filters.
    ///
    /// # Arguments
    ///
    /// * `params` - Raw query parameters, including `page` and `limit`.
    ///
    /// # Returns
    ///
    /// * `Result<LeadPage, AppError>` - The requested page with the total match count.
    pub async fn list(&self, params: &HashMap<String, String>) -> Result<LeadPage, AppError> {
        let query = LeadQuery::from_params(params)?;
        tracing::debug!(
            "Listing leads: {} predicate(s), page {}, limit {}",
            query.filter.predicates().len(),
            query.page.page,
            query.page.limit
        );

        let total = self.store.count(&query.filter).await?;
        let data = self
            .store
            .find(&query.filter, query.page.skip(), query.page.limit)
            .await?;

        Ok(LeadPage::new(data, query.page, total))
    }

    pub async fn create(&self, payload: NewLead) -> Result<Lead, AppError> {
        payload.validate()?;
        let lead = self.store.insert(payload).await?;
        tracing::info!("Created lead {}", lead.id);
        Ok(lead)
    }

    pub async fn get(&self, id: Uuid) -> Result<Lead, AppError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Lead not found".to_string()))
    }

    pub async fn update(&self, id: Uuid, patch: LeadPatch) -> Result<Lead, AppError> {
        patch.validate()?;
        let lead = self
            .store
            .update_by_id(id, &patch)
            .await?
            .ok_or_else(|| AppError::NotFound("Lead not found".to_string()))?;
        tracing::info!("Updated lead {}", id);
        Ok(lead)
    }

    pub async fn delete(&self, id: Uuid) -> Result<MessageResponse, AppError> {
        if !self.store.delete_by_id(id).await? {
            return Err(AppError::NotFound("Lead not found".to_string()));
        }
        tracing::info!("Deleted lead {}", id);
        Ok(MessageResponse::new("Lead deleted successfully"))
    }

    /// Removes every lead. Not coordinated with concurrent creates.
    pub async fn delete_all(&self) -> Result<MessageResponse, AppError> {
        let deleted = self.store.delete_all().await?;
        Ok(MessageResponse {
            message: "All leads deleted successfully.".to_string(),
            deleted: Some(deleted),
        })
    }
}
