use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::domain::repository::{NewUser, UserRepository, UserUpdate};
use crate::domain::{AppState, Identity, Role, users::UserId};
use crate::infrastructure::http::api::{ApiError, ApiSuccess};
use crate::infrastructure::http::handlers::users::dto::{
    CreateUserRequest, UpdateUserRequest, UserResponse,
};

mod dto;

pub async fn list_users<S: AppState>(
    State(state): State<S>,
    _identity: Identity,
) -> Result<ApiSuccess<Vec<UserResponse>>, ApiError> {
    let users = state.users().list().await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        users.into_iter().map(UserResponse::from).collect(),
    ))
}

pub async fn create_user<S: AppState>(
    State(state): State<S>,
    identity: Identity,
    Json(req): Json<CreateUserRequest>,
) -> Result<ApiSuccess<UserResponse>, ApiError> {
    if !identity.role.can_manage_users() {
        return Err(ApiError::Forbidden);
    }

    let email = normalize_email(&req.email)?;
    let role = parse_role(req.role.as_deref())?.unwrap_or(Role::Viewer);

    let user = state
        .users()
        .create(NewUser {
            email,
            name: req.name,
            role,
            org_id: Some(identity.org_id),
        })
        .await?;

    Ok(ApiSuccess::new(StatusCode::CREATED, UserResponse::from(user)))
}

pub async fn update_user<S: AppState>(
    Path(id): Path<i64>,
    State(state): State<S>,
    identity: Identity,
    Json(req): Json<UpdateUserRequest>,
) -> Result<ApiSuccess<UserResponse>, ApiError> {
    if !identity.role.can_manage_users() {
        return Err(ApiError::Forbidden);
    }

    let email = req.email.as_deref().map(normalize_email).transpose()?;
    let role = parse_role(req.role.as_deref())?;

    let user = state
        .users()
        .update(UserId(id), UserUpdate { email, name: req.name, role })
        .await?;

    Ok(ApiSuccess::new(StatusCode::OK, UserResponse::from(user)))
}

pub async fn delete_user<S: AppState>(
    Path(id): Path<i64>,
    State(state): State<S>,
    identity: Identity,
) -> Result<StatusCode, ApiError> {
    if !identity.role.can_manage_users() {
        return Err(ApiError::Forbidden);
    }

    state.users().delete(UserId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn normalize_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest(format!("'{}' is not an email address", raw)));
    }
    Ok(email)
}

fn parse_role(raw: Option<&str>) -> Result<Option<Role>, ApiError> {
    raw.map(|value| {
        Role::parse(value).ok_or_else(|| ApiError::BadRequest(format!("unknown role '{}'", value)))
    })
    .transpose()
}
