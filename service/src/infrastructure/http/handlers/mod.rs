use axum::http::StatusCode;

pub mod documents;
pub mod frameworks;
pub mod notifications;
pub mod templates;
pub mod users;

// health check handler
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}
