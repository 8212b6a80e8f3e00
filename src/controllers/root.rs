use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

pub struct RootController;

impl RootController {
    pub async fn health_check() -> Response {
        (StatusCode::OK, Json(json!({"status": "OK"}))).into_response()
    }
}
