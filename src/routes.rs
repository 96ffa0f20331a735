use std::sync::Arc;

use axum::{
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    error::HttpError,
    handler::{
        admin::admin_handler, auth::auth_handler, properties::properties_handler,
        verification::verification_handler,
    },
    AppState,
};

async fn health_check(Extension(app_state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let db_connected = app_state.db_client.ping().await;

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "PropertyVerify API is running",
            "dbConnected": db_connected
        })),
    )
}

async fn not_found(uri: Uri) -> HttpError {
    HttpError::not_found(format!("Not Found - {}", uri.path()))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .nest("/properties", properties_handler())
        .nest("/verifications", verification_handler())
        .nest("/admin", admin_handler());

    Router::new()
        .route("/", get(health_check))
        .nest("/api", api_route)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state))
}
