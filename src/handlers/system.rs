use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Portfolio API",
            "version": version,
            "description": "Contacts, projects and timeline entries per user",
            "endpoints": {
                "signup": "POST /signup?username=&password= (public)",
                "login": "POST /login form username, password (public)",
                "read": "GET /{contact|project|timeline}/:username (public)",
                "write": "POST|PATCH|DELETE /{contact|project|timeline} (bearer token)",
                "health": "GET /health (public)"
            }
        }
    }))
}

/// GET /health - pings the document store
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "store": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "store unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "store_error": e.to_string()
                    }
                })),
            )
        }
    }
}
