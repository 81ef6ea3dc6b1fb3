//! HTTP API surface.
//!
//! Handlers validate request shape, delegate to the stores, and map domain
//! outcomes to status codes through [`ApiError`]. No business logic lives
//! here.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, Method},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use printdesk_store::{CredentialStore, FileRef, NewOrder, Order, OrderRepository, OrderStatus};

use crate::auth::SessionManager;
use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::uploads::{content_type_for, IncomingFile, UploadStore};

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderRepository>,
    pub credentials: Arc<CredentialStore>,
    pub uploads: Arc<UploadStore>,
    pub sessions: SessionManager,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/upload", post(upload_files))
        .route(
            "/api/orders",
            post(create_order).get(list_orders).delete(clear_orders),
        )
        .route("/api/orders/{order_id}", get(get_order))
        .route("/api/orders/{order_id}/status", put(update_order_status))
        .route("/api/admin/login", post(admin_login))
        .route("/api/files/{filename}", get(download_file))
        .route("/api/files", delete(clear_files))
        .route("/uploads/{filename}", get(serve_upload))
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Deserialize a JSON body into its typed form, reporting failures (missing
/// fields, unknown fields, bad enum values) through the uniform envelope.
fn parse_body<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, ApiError> {
    serde_json::from_value(value)
        .map_err(|e| ApiError::Validation(format!("Invalid request body: {}", e)))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct UploadResponse {
    files: Vec<FileRef>,
}

#[derive(Serialize)]
struct CreateOrderResponse {
    #[serde(rename = "orderId")]
    order_id: String,
    order: Order,
}

#[derive(Serialize)]
struct UpdateStatusResponse {
    success: bool,
    order: Order,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateStatusRequest {
    status: OrderStatus,
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    success: bool,
    token: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn upload_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Multipart error: {}", e)))?
    {
        if field.name() != Some("files") {
            continue;
        }

        let name = field.file_name().unwrap_or("file").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(format!("Failed to read field: {}", e)))?;

        files.push(IncomingFile {
            name,
            content_type,
            data: data.to_vec(),
        });
    }

    let refs = state.uploads.store_batch(files).await?;
    Ok(Json(UploadResponse { files: refs }))
}

async fn create_order(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<CreateOrderResponse>, ApiError> {
    let new_order: NewOrder = parse_body(body)?;
    let order = state.orders.append(new_order).await?;
    Ok(Json(CreateOrderResponse {
        order_id: order.order_id.clone(),
        order,
    }))
}

async fn list_orders(State(state): State<AppState>) -> Json<Vec<Order>> {
    Json(state.orders.list().await)
}

async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order = state.orders.get(&order_id).await?;
    Ok(Json(order))
}

async fn update_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<UpdateStatusResponse>, ApiError> {
    let req: UpdateStatusRequest = parse_body(body)?;
    let order = state.orders.update_status(&order_id, req.status).await?;
    Ok(Json(UpdateStatusResponse {
        success: true,
        order,
    }))
}

async fn admin_login(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<LoginResponse>, ApiError> {
    let req: LoginRequest = parse_body(body)?;

    if !state.credentials.verify(&req.username, &req.password).await {
        return Err(ApiError::Unauthorized);
    }

    let token = state.sessions.issue(&req.username).await;
    Ok(Json(LoginResponse {
        success: true,
        token,
    }))
}

/// Download a stored file as an attachment.
async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let data = state.uploads.read(&filename).await?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&filename).to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        data,
    )
        .into_response())
}

/// Serve a stored file inline, mirroring the public `/uploads/<name>` paths
/// embedded in order records.
async fn serve_upload(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let data = state.uploads.read(&filename).await?;

    Ok((
        [(header::CONTENT_TYPE, content_type_for(&filename).to_string())],
        data,
    )
        .into_response())
}

async fn clear_orders(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.orders.clear().await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn clear_files(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let outcome = state.uploads.clear_all().await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "deleted": outcome.deleted,
        "failures": outcome.failures,
    })))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use printdesk_store::AdminCredential;
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn test_app() -> (Router, TempDir) {
        let dir = TempDir::new().unwrap();
        let config = Arc::new(ServerConfig {
            data_dir: dir.path().join("data"),
            upload_dir: dir.path().join("uploads"),
            ..ServerConfig::default()
        });

        let orders = Arc::new(
            OrderRepository::open(config.data_dir.join("orders.json"))
                .await
                .unwrap(),
        );
        let credentials = Arc::new(
            CredentialStore::open(config.data_dir.join("admin.json"), AdminCredential::default())
                .await
                .unwrap(),
        );
        let uploads = Arc::new(
            UploadStore::new(config.upload_dir.clone(), config.max_file_size)
                .await
                .unwrap(),
        );
        let sessions = SessionManager::new(config.session_ttl_secs);

        let state = AppState {
            orders,
            credentials,
            uploads,
            sessions,
            config,
        };
        (build_router(state), dir)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn sample_order_body() -> serde_json::Value {
        serde_json::json!({
            "fullName": "Jane Doe",
            "phoneNumber": "555-0100",
            "printType": "document",
            "totalCost": 12.5,
            "files": [{
                "name": "a.pdf",
                "size": 1000,
                "type": "application/pdf",
                "path": "/uploads/x-a.pdf"
            }]
        })
    }

    #[tokio::test]
    async fn create_then_fetch_order_round_trip() {
        let (app, _dir) = test_app().await;

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/orders", sample_order_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let created = body_json(response).await;
        let order_id = created["orderId"].as_str().unwrap().to_string();
        assert_eq!(created["order"]["status"], "pending");

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/orders/{}", order_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let fetched = body_json(response).await;
        assert_eq!(fetched["fullName"], "Jane Doe");
        assert_eq!(fetched["phoneNumber"], "555-0100");
        assert_eq!(fetched["totalCost"], 12.5);
        assert_eq!(fetched["status"], "pending");
        assert!(fetched["orderDate"].is_string());
        assert_eq!(fetched["files"][0]["path"], "/uploads/x-a.pdf");
    }

    #[tokio::test]
    async fn create_order_rejects_unknown_fields() {
        let (app, _dir) = test_app().await;

        let mut body = sample_order_body();
        body["status"] = serde_json::json!("completed");

        let response = app
            .oneshot(json_request("POST", "/api/orders", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let envelope = body_json(response).await;
        assert_eq!(envelope["code"], "validation");
        assert!(envelope["error"].is_string());
    }

    #[tokio::test]
    async fn unknown_order_is_404_with_envelope() {
        let (app, _dir) = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/orders/ORD-missing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "not_found");
    }

    #[tokio::test]
    async fn update_status_round_trip_and_missing_id() {
        let (app, _dir) = test_app().await;

        let created = body_json(
            app.clone()
                .oneshot(json_request("POST", "/api/orders", sample_order_body()))
                .await
                .unwrap(),
        )
        .await;
        let order_id = created["orderId"].as_str().unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/orders/{}/status", order_id),
                serde_json::json!({ "status": "processing" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let updated = body_json(response).await;
        assert_eq!(updated["success"], true);
        assert_eq!(updated["order"]["status"], "processing");

        let response = app
            .oneshot(json_request(
                "PUT",
                "/api/orders/ORD-missing/status",
                serde_json::json!({ "status": "completed" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_status_rejects_unknown_status() {
        let (app, _dir) = test_app().await;

        let created = body_json(
            app.clone()
                .oneshot(json_request("POST", "/api/orders", sample_order_body()))
                .await
                .unwrap(),
        )
        .await;
        let order_id = created["orderId"].as_str().unwrap();

        let response = app
            .oneshot(json_request(
                "PUT",
                &format!("/api/orders/{}/status", order_id),
                serde_json::json!({ "status": "shipped-to-mars" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "validation");
    }

    #[tokio::test]
    async fn login_issues_token_and_rejects_mismatch() {
        let (app, _dir) = test_app().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/admin/login",
                serde_json::json!({ "username": "admin", "password": "xerox123" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert!(!body["token"].as_str().unwrap().is_empty());

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/admin/login",
                serde_json::json!({ "username": "admin", "password": "Xerox123" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["code"], "unauthorized");
    }

    #[tokio::test]
    async fn clear_orders_empties_list() {
        let (app, _dir) = test_app().await;

        app.clone()
            .oneshot(json_request("POST", "/api/orders", sample_order_body()))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/orders")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["success"], true);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/orders")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let listed = body_json(response).await;
        assert_eq!(listed.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn missing_download_is_404() {
        let (app, _dir) = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/files/12345-0-missing.pdf")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn clear_files_reports_aggregate_outcome() {
        let (app, _dir) = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/files")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["deleted"], 0);
        assert_eq!(body["failures"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn empty_upload_batch_is_400() {
        let (app, _dir) = test_app().await;

        let boundary = "test-boundary";
        let body = format!("--{}--\r\n", boundary);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/upload")
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={}", boundary),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "validation");
    }

    #[tokio::test]
    async fn multipart_upload_stores_batch() {
        let (app, _dir) = test_app().await;

        let boundary = "test-boundary";
        let body = format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"files\"; filename=\"quote.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n\
             %PDF-1.4 fake\r\n\
             --{b}\r\n\
             Content-Disposition: form-data; name=\"files\"; filename=\"quote.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n\
             %PDF-1.4 other\r\n\
             --{b}--\r\n",
            b = boundary
        );

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/upload")
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={}", boundary),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let uploaded = body_json(response).await;
        let files = uploaded["files"].as_array().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0]["name"], "quote.pdf");
        assert_eq!(files[0]["type"], "application/pdf");
        assert_ne!(files[0]["path"], files[1]["path"]);

        // Both stored files are independently retrievable.
        let stored = files[1]["path"].as_str().unwrap().to_string();
        let response = app
            .oneshot(
                Request::builder()
                    .uri(&stored)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn upload_with_disallowed_type_is_rejected_whole() {
        let (app, dir) = test_app().await;

        let boundary = "test-boundary";
        let body = format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"files\"; filename=\"ok.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n\
             fine\r\n\
             --{b}\r\n\
             Content-Disposition: form-data; name=\"files\"; filename=\"evil.exe\"\r\n\
             Content-Type: application/x-msdownload\r\n\r\n\
             nope\r\n\
             --{b}--\r\n",
            b = boundary
        );

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/upload")
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={}", boundary),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Only the sentinel remains in the upload directory.
        let names: Vec<_> = std::fs::read_dir(dir.path().join("uploads"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![crate::uploads::SENTINEL.to_string()]);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _dir) = test_app().await;

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }
}
