use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use policyforge_common::{TemplateKey, render};

use crate::domain::repository::{TemplateRepository, TemplateUpdate};
use crate::domain::{AppState, Identity};
use crate::infrastructure::http::api::{ApiError, ApiSuccess};
use crate::infrastructure::http::handlers::templates::dto::{
    DraftPreviewRequest, DraftPreviewResponse, TemplateDetailResponse, TemplateResponse,
    UpdateTemplateRequest,
};

mod dto;

pub async fn list_templates<S: AppState>(
    State(state): State<S>,
    _identity: Identity,
) -> Result<ApiSuccess<Vec<TemplateResponse>>, ApiError> {
    let templates = state.templates().list().await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        templates.iter().map(TemplateResponse::from).collect(),
    ))
}

pub async fn get_template<S: AppState>(
    Path(key): Path<String>,
    State(state): State<S>,
    _identity: Identity,
) -> Result<ApiSuccess<TemplateDetailResponse>, ApiError> {
    let key = parse_key(&key)?;
    let template = state
        .templates()
        .get(&key)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(ApiSuccess::new(StatusCode::OK, TemplateDetailResponse::from(template)))
}

pub async fn update_template<S: AppState>(
    Path(key): Path<String>,
    State(state): State<S>,
    identity: Identity,
    Json(req): Json<UpdateTemplateRequest>,
) -> Result<ApiSuccess<TemplateDetailResponse>, ApiError> {
    if !identity.role.can_edit_documents() {
        return Err(ApiError::Forbidden);
    }

    let key = parse_key(&key)?;
    let template = state
        .templates()
        .update(
            &key,
            TemplateUpdate {
                title: req.title,
                body: req.body,
                parameters: req.parameters,
            },
        )
        .await?;

    Ok(ApiSuccess::new(StatusCode::OK, TemplateDetailResponse::from(template)))
}

/// Renders a draft without persisting anything; used for live previews.
pub async fn render_draft<S: AppState>(
    Path(key): Path<String>,
    State(state): State<S>,
    _identity: Identity,
    Json(req): Json<DraftPreviewRequest>,
) -> Result<ApiSuccess<DraftPreviewResponse>, ApiError> {
    let key = parse_key(&key)?;
    let template = state
        .templates()
        .get(&key)
        .await?
        .ok_or(ApiError::NotFound)?;

    let draft = render(&template, &req.params)
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;

    Ok(ApiSuccess::new(StatusCode::OK, DraftPreviewResponse::from(draft)))
}

fn parse_key(raw: &str) -> Result<TemplateKey, ApiError> {
    TemplateKey::try_new(raw).map_err(|err| ApiError::BadRequest(err.to_string()))
}
