use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::pagination::PageRequest;

// ============ Enumerations ============

/// Marketing channel a lead came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    Website,
    FacebookAds,
    GoogleAds,
    Referral,
    Events,
    #[default]
    Other,
}

impl LeadSource {
    pub const ALL: [LeadSource; 6] = [
        LeadSource::Website,
        LeadSource::FacebookAds,
        LeadSource::GoogleAds,
        LeadSource::Referral,
        LeadSource::Events,
        LeadSource::Other,
    ];

    /// Wire and storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            LeadSource::Website => "website",
            LeadSource::FacebookAds => "facebook_ads",
            LeadSource::GoogleAds => "google_ads",
            LeadSource::Referral => "referral",
            LeadSource::Events => "events",
            LeadSource::Other => "other",
        }
    }
}

impl fmt::Display for LeadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeadSource::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| format!("unknown lead source '{}'", s))
    }
}

/// Position of a lead in the sales pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Lost,
    Won,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 5] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Qualified,
        LeadStatus::Lost,
        LeadStatus::Won,
    ];

    /// Wire and storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Lost => "lost",
            LeadStatus::Won => "won",
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeadStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown lead status '{}'", s))
    }
}

// ============ Lead Records ============

/// A sales prospect tracked by the system.
///
/// `id` and `created_at` are assigned by the store on insert and never change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Lead {
    /// Store-assigned identity. Serialized as `_id` for the browser client.
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub city: String,
    pub state: String,
    pub source: LeadSource,
    pub status: LeadStatus,
    /// Lead score, 0 to 100.
    pub score: i32,
    /// Estimated deal value.
    pub lead_value: f64,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub is_qualified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload accepted by `POST /api/leads`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate, ToSchema)]
pub struct NewLead {
    #[validate(length(min = 1, message = "first_name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last_name is required"))]
    pub last_name: String,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub source: LeadSource,
    #[serde(default)]
    pub status: LeadStatus,
    #[serde(default)]
    #[validate(range(min = 0, max = 100, message = "score must be between 0 and 100"))]
    pub score: i32,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "lead_value must not be negative"))]
    pub lead_value: f64,
    #[serde(default)]
    pub last_activity_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_qualified: bool,
}

impl NewLead {
    /// Minimal payload with every optional field left at its default.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: String::new(),
            company: String::new(),
            city: String::new(),
            state: String::new(),
            source: LeadSource::default(),
            status: LeadStatus::default(),
            score: 0,
            lead_value: 0.0,
            last_activity_at: None,
            is_qualified: false,
        }
    }

    /// Materializes the record once the store has picked an identity and timestamp.
    pub fn into_lead(self, id: Uuid, now: DateTime<Utc>) -> Lead {
        Lead {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            company: self.company,
            city: self.city,
            state: self.state,
            source: self.source,
            status: self.status,
            score: self.score,
            lead_value: self.lead_value,
            last_activity_at: self.last_activity_at,
            is_qualified: self.is_qualified,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update accepted by `PUT /api/leads/:id`.
///
/// Absent fields are left untouched. Identity and timestamps in the body are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, Validate, ToSchema)]
pub struct LeadPatch {
    #[validate(length(min = 1, message = "first_name cannot be empty"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, message = "last_name cannot be empty"))]
    pub last_name: Option<String>,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub source: Option<LeadSource>,
    pub status: Option<LeadStatus>,
    #[validate(range(min = 0, max = 100, message = "score must be between 0 and 100"))]
    pub score: Option<i32>,
    #[validate(range(min = 0.0, message = "lead_value must not be negative"))]
    pub lead_value: Option<f64>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub is_qualified: Option<bool>,
}

impl LeadPatch {
    /// Applies every supplied field to `lead` and bumps `updated_at`.
    pub fn apply(&self, lead: &mut Lead, now: DateTime<Utc>) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }

        set(&mut lead.first_name, &self.first_name);
        set(&mut lead.last_name, &self.last_name);
        set(&mut lead.email, &self.email);
        set(&mut lead.phone, &self.phone);
        set(&mut lead.company, &self.company);
        set(&mut lead.city, &self.city);
        set(&mut lead.state, &self.state);
        set(&mut lead.source, &self.source);
        set(&mut lead.status, &self.status);
        set(&mut lead.score, &self.score);
        set(&mut lead.lead_value, &self.lead_value);
        if self.last_activity_at.is_some() {
            lead.last_activity_at = self.last_activity_at;
        }
        set(&mut lead.is_qualified, &self.is_qualified);
        lead.updated_at = now;
    }
}

// ============ API Responses ============

/// Result envelope returned by `GET /api/leads`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeadPage {
    pub data: Vec<Lead>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
}

impl LeadPage {
    pub fn new(data: Vec<Lead>, request: PageRequest, total: u64) -> Self {
        Self {
            data,
            page: request.page,
            limit: request.limit,
            total,
            total_pages: request.total_pages(total),
        }
    }
}

/// Confirmation body for destructive operations.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<u64>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            deleted: None,
        }
    }
}
