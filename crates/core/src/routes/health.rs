use axum::http::StatusCode;

pub const HEALTH_ENDPOINT: &str = "/health";

pub async fn health_handler() -> StatusCode {
    StatusCode::OK
}
