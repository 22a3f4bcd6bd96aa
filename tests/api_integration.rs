/// Router integration tests
/// Drives the full HTTP stack (auth gate, handlers, error mapping) over the in-memory store
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use lead_manager::auth::{issue_token, TOKEN_COOKIE};
use lead_manager::build_router;
use lead_manager::config::Config;
use lead_manager::handlers::AppState;
use lead_manager::memory_store::InMemoryLeadStore;
use lead_manager::services::LeadService;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test-secret";

/// Helper function to create a router backed by an empty in-memory store
fn create_test_app() -> Router {
    let state = Arc::new(AppState {
        leads: LeadService::new(Arc::new(InMemoryLeadStore::new())),
        config: Config::for_tests(SECRET),
    });
    build_router(state)
}

fn bearer() -> String {
    let token = issue_token(SECRET, Uuid::new_v4(), Duration::hours(1)).unwrap();
    format!("Bearer {}", token)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, bearer());
    let body = match body {
        Some(value) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(app: &Router, body: Value) -> Value {
    let (status, lead) = send(app, Method::POST, "/api/leads", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", lead);
    lead
}

fn emails(page: &Value) -> Vec<String> {
    page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["email"].as_str().unwrap().to_string())
        .collect()
}

#[cfg(test)]
mod auth_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_token_is_rejected() {
        let app = create_test_app();
        let response = app
            .oneshot(Request::get("/api/leads").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "error": "Not authorized" }));
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_is_rejected() {
        let app = create_test_app();
        let token = issue_token("other-secret", Uuid::new_v4(), Duration::hours(1)).unwrap();
        let response = app
            .oneshot(
                Request::get("/api/leads")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_cookie_session_is_accepted() {
        let app = create_test_app();
        let user = Uuid::new_v4();
        let token = issue_token(SECRET, user, Duration::hours(1)).unwrap();
        let response = app
            .oneshot(
                Request::get("/api/auth/me")
                    .header(header::COOKIE, format!("{}={}", TOKEN_COOKIE, token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["id"], json!(user));
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let app = create_test_app();
        let body = vec![b' '; lead_manager::MAX_BODY_BYTES + 1];
        let response = app
            .oneshot(
                Request::post("/api/leads")
                    .header(header::AUTHORIZATION, bearer())
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::CONTENT_LENGTH, body.len())
                    .header(header::ORIGIN, "http://localhost:5173")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin_with_credentials() {
        let app = create_test_app();
        let response = app
            .oneshot(
                Request::get("/health")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn test_health_and_logout_are_public() {
        let app = create_test_app();

        let health = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);

        let logout = app
            .oneshot(
                Request::post("/api/auth/logout")
                    .header(header::COOKIE, format!("{}=stale", TOKEN_COOKIE))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(logout.status(), StatusCode::OK);
        let cookie = logout
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(cookie.starts_with("token="));
    }
}

#[cfg(test)]
mod lead_crud_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_fetch_round_trip() {
        let app = create_test_app();
        let created = create(
            &app,
            json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": "ada@example.com",
                "company": "Analytical Engines",
                "source": "referral",
                "status": "qualified",
                "score": 88,
                "lead_value": 12500.5,
                "is_qualified": true
            }),
        )
        .await;

        let id = created["_id"].as_str().unwrap().to_string();
        assert!(created["created_at"].is_string());
        assert_eq!(created["phone"], "");

        let (status, fetched) = send(&app, Method::GET, &format!("/api/leads/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_validation_failures_are_bad_requests() {
        let app = create_test_app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/leads",
            Some(json!({ "first_name": "", "last_name": "X", "email": "x@example.com", "score": 101 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Validation failed");
        assert!(body["details"]["first_name"].is_array());
        assert!(body["details"]["score"].is_array());

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/leads",
            Some(json!({ "first_name": "A", "last_name": "B", "email": "a@b.com", "status": "cold" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_applies_partial_patch() {
        let app = create_test_app();
        let created = create(
            &app,
            json!({ "first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.com" }),
        )
        .await;
        let uri = format!("/api/leads/{}", created["_id"].as_str().unwrap());

        let (status, updated) = send(
            &app,
            Method::PUT,
            &uri,
            Some(json!({ "status": "won", "score": 95, "_id": Uuid::new_v4() })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "won");
        assert_eq!(updated["score"], 95);
        assert_eq!(updated["first_name"], "Ada");
        assert_eq!(updated["_id"], created["_id"]);
        assert_eq!(updated["created_at"], created["created_at"]);
    }

    #[tokio::test]
    async fn test_missing_and_malformed_ids() {
        let app = create_test_app();
        let missing = format!("/api/leads/{}", Uuid::new_v4());

        let (status, body) = send(&app, Method::GET, &missing, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Lead not found" }));

        let (status, _) = send(&app, Method::DELETE, &missing, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::PUT, &missing, Some(json!({ "score": 1 }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::GET, "/api/leads/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_single_then_all() {
        let app = create_test_app();
        let first = create(
            &app,
            json!({ "first_name": "A", "last_name": "One", "email": "a@example.com" }),
        )
        .await;
        create(
            &app,
            json!({ "first_name": "B", "last_name": "Two", "email": "b@example.com" }),
        )
        .await;
        create(
            &app,
            json!({ "first_name": "C", "last_name": "Three", "email": "c@example.com" }),
        )
        .await;

        let uri = format!("/api/leads/{}", first["_id"].as_str().unwrap());
        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Lead deleted successfully" }));

        let (status, body) = send(&app, Method::DELETE, "/api/leads", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "message": "All leads deleted successfully.", "deleted": 2 })
        );

        let (status, page) = send(&app, Method::GET, "/api/leads", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], 0);
        assert_eq!(page["totalPages"], 0);
        assert_eq!(page["data"], json!([]));
    }
}

#[cfg(test)]
mod lead_listing_tests {
    use super::*;

    async fn seed(app: &Router) {
        let leads = [
            ("a@example.com", "won", 55, 7000.0, true),
            ("bob@example.com", "lost", 80, 4000.0, false),
            ("a@test.com", "new", 30, 5000.0, false),
            ("carol@example.com", "contacted", 90, 5000.5, true),
        ];
        for (email, status, score, value, qualified) in leads {
            create(
                app,
                json!({
                    "first_name": "Lead",
                    "last_name": "Sample",
                    "email": email,
                    "status": status,
                    "score": score,
                    "lead_value": value,
                    "is_qualified": qualified
                }),
            )
            .await;
        }
    }

    async fn list(app: &Router, query: &str) -> Value {
        let (status, page) = send(app, Method::GET, &format!("/api/leads{}", query), None).await;
        assert_eq!(status, StatusCode::OK, "list failed: {}", page);
        page
    }

    fn sorted(mut values: Vec<String>) -> Vec<String> {
        values.sort();
        values
    }

    #[tokio::test]
    async fn test_default_envelope() {
        let app = create_test_app();
        seed(&app).await;

        let page = list(&app, "").await;
        assert_eq!(page["page"], 1);
        assert_eq!(page["limit"], 20);
        assert_eq!(page["total"], 4);
        assert_eq!(page["totalPages"], 1);
        assert_eq!(emails(&page).len(), 4);
    }

    #[tokio::test]
    async fn test_filters() {
        let app = create_test_app();
        seed(&app).await;

        let page = list(&app, "?email=*@example.com").await;
        assert_eq!(
            sorted(emails(&page)),
            vec!["a@example.com", "bob@example.com", "carol@example.com"]
        );

        let page = list(&app, "?status=won,lost").await;
        assert_eq!(sorted(emails(&page)), vec!["a@example.com", "bob@example.com"]);

        let page = list(&app, "?score=50-80").await;
        assert_eq!(sorted(emails(&page)), vec!["a@example.com", "bob@example.com"]);

        let page = list(&app, "?lead_value=%3E5000").await;
        assert_eq!(sorted(emails(&page)), vec!["a@example.com", "carol@example.com"]);

        let page = list(&app, "?is_qualified=true").await;
        assert_eq!(sorted(emails(&page)), vec!["a@example.com", "carol@example.com"]);

        let page = list(&app, "?is_qualified=nope").await;
        assert_eq!(sorted(emails(&page)), vec!["a@test.com", "bob@example.com"]);
    }

    #[tokio::test]
    async fn test_pagination_clamps_and_counts() {
        let app = create_test_app();
        seed(&app).await;

        let page = list(&app, "?limit=500").await;
        assert_eq!(page["limit"], 100);

        let page = list(&app, "?page=2&limit=3").await;
        assert_eq!(page["total"], 4);
        assert_eq!(page["totalPages"], 2);
        assert_eq!(emails(&page).len(), 1);

        let page = list(&app, "?page=-5&limit=abc").await;
        assert_eq!(page["page"], 1);
        assert_eq!(page["limit"], 20);

        let page = list(&app, "?page=9").await;
        assert_eq!(page["page"], 9);
        assert_eq!(page["data"], json!([]));
        assert_eq!(page["total"], 4);
    }

    #[tokio::test]
    async fn test_malformed_operand_is_bad_request() {
        let app = create_test_app();
        let (status, body) = send(&app, Method::GET, "/api/leads?score=%3Ehigh", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("score"));
        assert!(message.contains(">high"));
    }
}
