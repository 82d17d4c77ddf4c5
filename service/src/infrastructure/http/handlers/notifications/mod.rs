use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use crate::domain::repository::NotificationRepository;
use crate::domain::{AppState, Identity};
use crate::infrastructure::http::api::{ApiError, ApiSuccess};
use crate::infrastructure::http::handlers::notifications::dto::{
    MarkReadRequest, NotificationResponse,
};
use crate::infrastructure::http::querystring::QueryString;

mod dto;

const DEFAULT_LIST_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct NotificationParams {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_notifications<S: AppState>(
    QueryString(params): QueryString<NotificationParams>,
    State(state): State<S>,
    identity: Identity,
) -> Result<ApiSuccess<Vec<NotificationResponse>>, ApiError> {
    let unread_only = match params.status.as_deref() {
        None | Some("unread") => true,
        Some("all") => false,
        Some(other) => {
            return Err(ApiError::BadRequest(format!(
                "status must be \"unread\" or \"all\", got '{}'",
                other
            )));
        }
    };
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);

    let rows = state
        .notifications()
        .list(identity.principal_email(), unread_only, limit)
        .await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        rows.into_iter().map(NotificationResponse::from).collect(),
    ))
}

pub async fn mark_read<S: AppState>(
    State(state): State<S>,
    identity: Identity,
    Json(req): Json<MarkReadRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .notifications()
        .mark_read(identity.principal_email(), &req.ids)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_read<S: AppState>(
    State(state): State<S>,
    identity: Identity,
) -> Result<StatusCode, ApiError> {
    state
        .notifications()
        .mark_all_read(identity.principal_email())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
