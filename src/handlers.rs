use crate::config::Config;
use crate::errors::AppError;
use crate::models::{Lead, LeadPage, LeadPatch, MessageResponse, NewLead};
use crate::services::LeadService;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Lead operations over the configured store.
    pub leads: LeadService,
    /// Application configuration.
    pub config: Config,
}

/// Health check endpoint.
///
/// Returns the service status and version.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "lead-manager",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

fn parse_lead_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid lead id '{}'", raw)))
}

/// Query keys only; values may hold contact data.
fn param_keys(params: &HashMap<String, String>) -> Vec<&str> {
    let mut keys: Vec<&str> = params.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// GET /api/leads
///
/// Lists leads, newest first. Every query key other than `page` and `limit`
/// that names a filterable field becomes a predicate.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `params` - Raw query parameters.
///
/// # Returns
///
/// * `Result<Json<LeadPage>, AppError>` - The result envelope or an error.
#[utoipa::path(
    get,
    path = "/api/leads",
    params(
        ("page" = Option<u64>, Query, description = "1-based page, defaults to 1"),
        ("limit" = Option<u64>, Query, description = "Page size, defaults to 20, capped at 100"),
        ("email" = Option<String>, Query, description = "Exact, or `*` wildcard (case-insensitive)"),
        ("company" = Option<String>, Query, description = "Exact, or `*` wildcard (case-insensitive)"),
        ("city" = Option<String>, Query, description = "Exact, or `*` wildcard (case-insensitive)"),
        ("status" = Option<String>, Query, description = "Exact, or comma-separated list"),
        ("source" = Option<String>, Query, description = "Exact, or comma-separated list"),
        ("score" = Option<String>, Query, description = "`min-max`, `>n`, `<n` or `n`"),
        ("lead_value" = Option<String>, Query, description = "`min-max`, `>n`, `<n` or `n`"),
        ("created_at" = Option<String>, Query, description = "`from,to`, `>date`, `<date` or `date`"),
        ("last_activity_at" = Option<String>, Query, description = "`from,to`, `>date`, `<date` or `date`"),
        ("is_qualified" = Option<String>, Query, description = "`true`; anything else means false")
    ),
    responses(
        (status = 200, description = "Page of leads", body = LeadPage),
        (status = 400, description = "Malformed filter operand"),
        (status = 401, description = "Not authorized")
    ),
    security(("api_jwt" = [])),
    tag = "Leads"
)]
pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<LeadPage>, AppError> {
    tracing::info!("GET /api/leads - filters on: {:?}", param_keys(&params));
    tracing::debug!("GET /api/leads - params: {:?}", params);

    let page = state.leads.list(&params).await?;

    tracing::debug!(
        "Returning {} of {} lead(s), page {}/{}",
        page.data.len(),
        page.total,
        page.page,
        page.total_pages
    );

    Ok(Json(page))
}

/// GET /api/leads/:id
///
/// # Arguments
///
/// * `state` - The application state.
/// * `id` - The lead identity.
///
/// # Returns
///
/// * `Result<Json<Lead>, AppError>` - The lead, 404 if absent, 400 if the id is malformed.
#[utoipa::path(
    get,
    path = "/api/leads/{id}",
    params(("id" = Uuid, Path, description = "Lead identity")),
    responses(
        (status = 200, description = "Lead found", body = Lead),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Lead not found")
    ),
    security(("api_jwt" = [])),
    tag = "Leads"
)]
pub async fn get_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Lead>, AppError> {
    let id = parse_lead_id(&id)?;
    tracing::info!("GET /api/leads/{}", id);

    Ok(Json(state.leads.get(id).await?))
}

/// POST /api/leads
///
/// # Arguments
///
/// * `state` - The application state.
/// * `payload` - The new lead. Optional fields take their defaults.
///
/// # Returns
///
/// * `Result<(StatusCode, Json<Lead>), AppError>` - 201 with the stored lead, or 400.
#[utoipa::path(
    post,
    path = "/api/leads",
    request_body = NewLead,
    responses(
        (status = 201, description = "Lead created", body = Lead),
        (status = 400, description = "Invalid payload")
    ),
    security(("api_jwt" = [])),
    tag = "Leads"
)]
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewLead>, JsonRejection>,
) -> Result<(StatusCode, Json<Lead>), AppError> {
    let payload = json_body(payload)?;
    tracing::info!("POST /api/leads - email: {}", payload.email);

    let lead = state.leads.create(payload).await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

/// PUT /api/leads/:id
///
/// Applies a partial update; fields absent from the body are left alone.
#[utoipa::path(
    put,
    path = "/api/leads/{id}",
    params(("id" = Uuid, Path, description = "Lead identity")),
    request_body = LeadPatch,
    responses(
        (status = 200, description = "Lead updated", body = Lead),
        (status = 400, description = "Invalid payload or id"),
        (status = 404, description = "Lead not found")
    ),
    security(("api_jwt" = [])),
    tag = "Leads"
)]
pub async fn update_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<LeadPatch>, JsonRejection>,
) -> Result<Json<Lead>, AppError> {
    let id = parse_lead_id(&id)?;
    let patch = json_body(payload)?;
    tracing::info!("PUT /api/leads/{}", id);

    Ok(Json(state.leads.update(id, patch).await?))
}

/// DELETE /api/leads/:id
#[utoipa::path(
    delete,
    path = "/api/leads/{id}",
    params(("id" = Uuid, Path, description = "Lead identity")),
    responses(
        (status = 200, description = "Lead deleted", body = MessageResponse),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Lead not found")
    ),
    security(("api_jwt" = [])),
    tag = "Leads"
)]
pub async fn delete_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_lead_id(&id)?;
    tracing::info!("DELETE /api/leads/{}", id);

    Ok(Json(state.leads.delete(id).await?))
}

/// DELETE /api/leads
///
/// Wipes the whole collection.
#[utoipa::path(
    delete,
    path = "/api/leads",
    responses((status = 200, description = "All leads deleted", body = MessageResponse)),
    security(("api_jwt" = [])),
    tag = "Leads"
)]
pub async fn delete_all_leads(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessageResponse>, AppError> {
    tracing::warn!("DELETE /api/leads - deleting every lead");

    Ok(Json(state.leads.delete_all().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lead_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_lead_id(&id.to_string()).unwrap(), id);
        assert!(matches!(
            parse_lead_id("not-a-uuid"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_param_keys_omit_values() {
        let params: HashMap<String, String> = [
            ("page".to_string(), "2".to_string()),
            ("email".to_string(), "ada@example.com".to_string()),
        ]
        .into_iter()
        .collect();

        let keys = param_keys(&params);
        assert_eq!(keys, vec!["email", "page"]);
        assert!(!format!("{:?}", keys).contains("ada@example.com"));
    }
}
