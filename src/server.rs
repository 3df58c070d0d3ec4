use axum::{
    extract::{Path, Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use hyper::Server;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::app::{AdminUpdate, AdminUseCase, SubmitUseCase};
use crate::domain::RegistrationFilter;
use crate::error::RegistrationError;
use crate::normalize::RawSubmission;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub submit: Arc<SubmitUseCase>,
    pub admin: Arc<AdminUseCase>,
    pub metrics_enabled: bool,
}

/// Handler error, rendered as a JSON body with a matching status
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Registration(RegistrationError),
}

impl From<RegistrationError> for ApiError {
    fn from(e: RegistrationError) -> Self {
        ApiError::Registration(e.into_submission_error())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": message })),
            )
                .into_response(),
            ApiError::Registration(RegistrationError::Invalid(errors)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "success": false, "errors": errors })),
            )
                .into_response(),
            ApiError::Registration(RegistrationError::NotFound(id)) => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "success": false,
                    "error": format!("Registration not found: {}", id)
                })),
            )
                .into_response(),
            ApiError::Registration(e) => {
                error!("Request failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "error": "Internal error",
                        "message": e.to_string()
                    })),
                )
                    .into_response()
            }
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "spardha-registration",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn catalog(State(state): State<AppState>) -> impl IntoResponse {
    let catalog = state.submit.catalog();
    Json(json!({
        "categories": catalog.categories(),
        "sports": catalog.sports_in_form_order(),
        "allSports": catalog.all_sports(),
        "partnerSports": catalog.partner_sports(),
    }))
}

async fn submit_form(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let raw = RawSubmission::from_value(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid submission: {}", e)))?;
    let registration = state.submit.submit(&raw).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Registration successful",
            "id": registration.id,
        })),
    ))
}

async fn list_registrations(
    State(state): State<AppState>,
    Query(filter): Query<RegistrationFilter>,
) -> ApiResult<impl IntoResponse> {
    let registrations = state.admin.list(&filter).await?;
    Ok(Json(registrations))
}

async fn update_registration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let update: AdminUpdate = serde_json::from_value(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid update: {}", e)))?;
    let registration = state.admin.update(id, &update).await?;
    Ok(Json(json!({ "success": true, "registration": registration })))
}

async fn delete_registration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.admin.delete(id).await?;
    Ok(Json(json!({ "success": true })))
}

async fn export_roster(
    State(state): State<AppState>,
    Query(filter): Query<RegistrationFilter>,
) -> ApiResult<impl IntoResponse> {
    let roster = state.admin.export_roster(&filter).await?;
    let disposition = format!(
        "attachment; filename=sports-registrations-{}.txt",
        Utc::now().timestamp_millis()
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        roster.render_text(),
    ))
}

async fn metrics(State(state): State<AppState>) -> Response {
    match crate::metrics::render().filter(|_| state.metrics_enabled) {
        Some(body) => body.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/catalog", get(catalog))
        .route("/metrics", get(metrics))
        .route("/form", post(submit_form))
        .route("/admin/data", get(list_registrations))
        .route("/admin/export", get(export_roster))
        .route(
            "/admin/:id",
            put(update_registration).delete(delete_registration),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Start the HTTP server and run until Ctrl-C
pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_router(state);

    info!("HTTP server running on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SportCatalog;
    use crate::storage::{InMemoryStore, RegistrationStore};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn router() -> Router {
        router_with_metrics(false)
    }

    fn router_with_metrics(metrics_enabled: bool) -> Router {
        let store: Arc<dyn RegistrationStore> = Arc::new(InMemoryStore::new());
        let catalog = Arc::new(SportCatalog::standard());
        create_router(AppState {
            submit: Arc::new(SubmitUseCase::new(store.clone(), catalog.clone())),
            admin: Arc::new(AdminUseCase::new(store, catalog)),
            metrics_enabled,
        })
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, bytes.to_vec())
    }

    fn json_of(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    fn form() -> Value {
        json!({
            "name": "Ravi",
            "email": "ravi@example.com",
            "course": "BA",
            "year": 2,
            "gender": "boy",
            "sports": ["badminton-doubles", "cricket"],
            "partners": [{"sport": "badminton-doubles", "name": "Kabir"}]
        })
    }

    #[tokio::test]
    async fn test_health_and_catalog() {
        let app = router();
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_of(&body)["status"], "healthy");

        let (status, body) = send(&app, Method::GET, "/catalog", None).await;
        assert_eq!(status, StatusCode::OK);
        let catalog = json_of(&body);
        assert_eq!(catalog["partnerSports"].as_array().unwrap().len(), 5);
        assert!(catalog["categories"]["funActivities"].is_array());
        let sports = catalog["sports"].as_array().unwrap();
        assert_eq!(sports.len(), 31);
        assert_eq!(sports[0], "cricket");
    }

    #[tokio::test]
    async fn test_submit_then_duplicate() {
        let app = router();
        let (status, body) = send(&app, Method::POST, "/form", Some(form())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json_of(&body)["success"], true);

        let (status, body) = send(&app, Method::POST, "/form", Some(form())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_of(&body);
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"]["email"]["kind"], "DuplicateEmail");
    }

    #[tokio::test]
    async fn test_partner_mismatch_is_unprocessable() {
        let app = router();
        let mut bad = form();
        bad["partners"] = json!({"cricket": "Zed"});
        let (status, body) = send(&app, Method::POST, "/form", Some(bad)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_of(&body)["errors"]["partners"]["kind"], "PartnerMismatch");
    }

    #[tokio::test]
    async fn test_admin_routes() {
        let app = router();
        let (_, body) = send(&app, Method::POST, "/form", Some(form())).await;
        let id = json_of(&body)["id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, Method::GET, "/admin/data?sport=cricket&year=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_of(&body).as_array().unwrap().len(), 1);

        let (_, body) = send(&app, Method::GET, "/admin/data?partner=badminton-doubles", None).await;
        assert_eq!(json_of(&body).as_array().unwrap().len(), 1);
        let (_, body) = send(&app, Method::GET, "/admin/data?partner=carrom-doubles", None).await;
        assert!(json_of(&body).as_array().unwrap().is_empty());

        let mut edited = form();
        edited["status"] = json!("approved");
        let (status, body) = send(&app, Method::PUT, &format!("/admin/{}", id), Some(edited)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_of(&body)["registration"]["status"], "approved");

        let (status, body) = send(&app, Method::GET, "/admin/export?sport=badminton-doubles", None).await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("Filters: Sport: badminton doubles"));
        assert!(text.contains("1. Ravi (BA, boy) - Partner: Kabir"));

        let (status, _) = send(&app, Method::DELETE, &format!("/admin/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, Method::DELETE, &format!("/admin/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_metrics_disabled_is_not_found() {
        let (status, _) = send(&router(), Method::GET, "/metrics", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_metrics_endpoint_reports_submissions() {
        crate::metrics::init_metrics();
        let app = router_with_metrics(true);

        let mut submission = form();
        submission["email"] = json!("metrics@example.com");
        let (status, _) = send(&app, Method::POST, "/form", Some(submission)).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, Method::GET, "/metrics", None).await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("spardha_registration_submissions_accepted_total"));
    }
}
