use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use policyforge_common::{ControlId, Framework, FrameworkKey};
use serde::Deserialize;

use crate::domain::assessments::{
    self, AssessmentStatus, AssessmentUpdate, CategorySummary,
};
use crate::domain::{AppState, Identity};
use crate::infrastructure::http::api::{ApiError, ApiSuccess};
use crate::infrastructure::http::handlers::frameworks::dto::{
    CategoryDetailResponse, ControlAssessmentResponse, FrameworkDetailResponse,
    FrameworkResponse, UpsertAssessmentRequest,
};
use crate::infrastructure::http::querystring::QueryString;

mod dto;

#[derive(Debug, Deserialize)]
pub struct ControlFilterParams {
    pub q: Option<String>,
    pub function: Option<String>,
}

pub async fn list_frameworks<S: AppState>(
    State(state): State<S>,
    _identity: Identity,
) -> Result<ApiSuccess<Vec<FrameworkResponse>>, ApiError> {
    let result = state
        .frameworks()
        .frameworks()
        .map(FrameworkResponse::from)
        .collect::<Vec<_>>();

    Ok(ApiSuccess::new(StatusCode::OK, result))
}

pub async fn get_framework<S: AppState>(
    Path(key): Path<String>,
    QueryString(params): QueryString<ControlFilterParams>,
    State(state): State<S>,
    _identity: Identity,
) -> Result<ApiSuccess<FrameworkDetailResponse>, ApiError> {
    let framework = lookup_framework(&state, &key)?;

    let query = params.q.as_deref().map(str::trim).map(str::to_lowercase);
    let function = params.function.as_deref().map(str::to_lowercase);

    let controls = framework
        .controls
        .iter()
        .filter(|control| {
            function.as_deref().is_none_or(|wanted| {
                control
                    .family
                    .as_deref()
                    .is_some_and(|family| family.to_lowercase() == wanted)
            })
        })
        .filter(|control| {
            query.as_deref().is_none_or(|needle| {
                control.id.as_ref().to_lowercase().contains(needle)
                    || control.title.to_lowercase().contains(needle)
            })
        })
        .collect::<Vec<_>>();

    Ok(ApiSuccess::new(
        StatusCode::OK,
        FrameworkDetailResponse::new(framework, controls),
    ))
}

pub async fn get_assessments<S: AppState>(
    Path(key): Path<String>,
    State(state): State<S>,
    identity: Identity,
) -> Result<ApiSuccess<Vec<ControlAssessmentResponse>>, ApiError> {
    let framework = lookup_framework(&state, &key)?;
    let entries =
        assessments::assessments_for_framework(&state, &identity, &framework.key).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        entries.into_iter().map(ControlAssessmentResponse::from).collect(),
    ))
}

pub async fn upsert_assessment<S: AppState>(
    Path((key, control_id)): Path<(String, String)>,
    State(state): State<S>,
    identity: Identity,
    Json(req): Json<UpsertAssessmentRequest>,
) -> Result<ApiSuccess<ControlAssessmentResponse>, ApiError> {
    if !identity.role.can_edit_documents() {
        return Err(ApiError::Forbidden);
    }

    let framework = lookup_framework(&state, &key)?;
    let control_id = ControlId::try_new(control_id)
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;

    let status = req
        .status
        .as_deref()
        .map(|raw| {
            AssessmentStatus::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown status '{}'", raw)))
        })
        .transpose()?;

    let assessment = assessments::upsert_assessment(
        &state,
        &identity,
        &framework.key,
        &control_id,
        AssessmentUpdate {
            status,
            owner_user_id: req.owner_user_id,
            notes: req.notes,
            evidence_links: req.evidence_links,
            last_reviewed_at: req.last_reviewed_at,
        },
    )
    .await?;

    let control = framework
        .get_control(&control_id)
        .ok_or(ApiError::NotFound)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        ControlAssessmentResponse::from(assessments::ControlAssessment {
            control,
            assessment: Some(assessment),
        }),
    ))
}

pub async fn list_categories<S: AppState>(
    Path(key): Path<String>,
    State(state): State<S>,
    identity: Identity,
) -> Result<ApiSuccess<Vec<CategorySummary>>, ApiError> {
    let framework = lookup_framework(&state, &key)?;
    let summaries =
        assessments::category_summaries(&state, &identity, &framework.key).await?;

    Ok(ApiSuccess::new(StatusCode::OK, summaries))
}

pub async fn get_category_detail<S: AppState>(
    Path((key, category_id)): Path<(String, String)>,
    State(state): State<S>,
    identity: Identity,
) -> Result<ApiSuccess<CategoryDetailResponse>, ApiError> {
    let framework = lookup_framework(&state, &key)?;
    let detail =
        assessments::category_detail(&state, &identity, &framework.key, &category_id).await?;

    Ok(ApiSuccess::new(StatusCode::OK, CategoryDetailResponse::from(detail)))
}

/// Streams the framework's control catalog as a CSV attachment.
pub async fn export_csv<S: AppState>(
    Path(key): Path<String>,
    State(state): State<S>,
    _identity: Identity,
) -> Result<Response, ApiError> {
    let framework = lookup_framework(&state, &key)?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["id", "title", "family", "category"])
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;
    for control in &framework.controls {
        writer
            .write_record([
                control.id.as_ref(),
                control.title.as_str(),
                control.family.as_deref().unwrap_or(""),
                control.category.as_deref().unwrap_or(""),
            ])
            .map_err(|e| ApiError::InternalServerError(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;

    let filename = format!("{}_controls.csv", framework.key);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}

fn lookup_framework<S: AppState>(
    state: &S,
    raw_key: &str,
) -> Result<&'static Framework, ApiError> {
    let key = FrameworkKey::try_new(raw_key)
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;
    state.frameworks().get(&key).ok_or(ApiError::NotFound)
}
