use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{auth, handlers, models};

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Leads ---
        handlers::list_leads,
        handlers::get_lead,
        handlers::create_lead,
        handlers::update_lead,
        handlers::delete_lead,
        handlers::delete_all_leads,

        // --- Auth ---
        auth::me,
        auth::logout,
    ),
    components(
        schemas(
            models::LeadSource,
            models::LeadStatus,
            models::Lead,
            models::NewLead,
            models::LeadPatch,
            models::LeadPage,
            models::MessageResponse,
            auth::MeResponse,
        )
    ),
    tags(
        (name = "Leads", description = "Lead records"),
        (name = "Auth", description = "Session")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// Swagger UI at `/docs`, backed by `/api-docs/openapi.json`.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_lead_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/leads"));
        assert!(doc.paths.paths.contains_key("/api/leads/{id}"));
        assert!(doc.paths.paths.contains_key("/api/auth/me"));
    }
}
