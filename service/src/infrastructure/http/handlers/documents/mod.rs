use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use policyforge_common::TemplateKey;
use serde::Deserialize;

use crate::domain::repository::{
    ApprovalRepository, CommentRepository, DocumentRepository, NewComment,
};
use crate::domain::{
    AppState, Identity, approvals,
    approvals::{ApprovalId, ApprovalSummary},
    documents,
    documents::{DocumentId, DocumentStatus, VersionSelector},
};
use crate::infrastructure::http::api::{ApiError, ApiSuccess};
use crate::infrastructure::http::handlers::documents::dto::{
    ApprovalResponse, CommentResponse, CreateCommentRequest, DecideApprovalRequest,
    DocumentDetailResponse, DocumentResponse, DraftRequest, RequestApprovalRequest,
    UpdateDocumentRequest, VersionDetailResponse, VersionSummaryResponse,
};
use crate::infrastructure::http::querystring::QueryString;

mod dto;

const DEFAULT_LIST_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    pub latest_only: Option<bool>,
}

pub async fn list_documents<S: AppState>(
    QueryString(params): QueryString<ListParams>,
    State(state): State<S>,
    _identity: Identity,
) -> Result<ApiSuccess<Vec<DocumentResponse>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    let documents = state.documents().list(limit).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        documents.into_iter().map(DocumentResponse::from).collect(),
    ))
}

pub async fn create_document<S: AppState>(
    State(state): State<S>,
    identity: Identity,
    Json(req): Json<DraftRequest>,
) -> Result<ApiSuccess<DocumentResponse>, ApiError> {
    if !identity.role.can_edit_documents() {
        return Err(ApiError::Forbidden);
    }

    let template_key = parse_template_key(&req.template_key)?;
    let document =
        documents::create_document(&state, &identity, template_key, req.params).await?;

    Ok(ApiSuccess::new(StatusCode::CREATED, DocumentResponse::from(document)))
}

pub async fn get_document<S: AppState>(
    Path(id): Path<i64>,
    State(state): State<S>,
    _identity: Identity,
) -> Result<ApiSuccess<DocumentDetailResponse>, ApiError> {
    let id = DocumentId(id);
    let document = state.documents().get(id).await?;
    let versions = state.documents().versions(id).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        DocumentDetailResponse::new(document, versions),
    ))
}

pub async fn update_document<S: AppState>(
    Path(id): Path<i64>,
    State(state): State<S>,
    identity: Identity,
    Json(req): Json<UpdateDocumentRequest>,
) -> Result<ApiSuccess<DocumentResponse>, ApiError> {
    if !identity.role.can_edit_documents() {
        return Err(ApiError::Forbidden);
    }

    let status = req
        .status
        .as_deref()
        .map(|raw| {
            DocumentStatus::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown status '{}'", raw)))
        })
        .transpose()?;

    let document = state
        .documents()
        .update_metadata(DocumentId(id), req.title, status)
        .await?;

    Ok(ApiSuccess::new(StatusCode::OK, DocumentResponse::from(document)))
}

pub async fn delete_document<S: AppState>(
    Path(id): Path<i64>,
    State(state): State<S>,
    identity: Identity,
) -> Result<StatusCode, ApiError> {
    if !identity.role.can_edit_documents() {
        return Err(ApiError::Forbidden);
    }

    state.documents().delete(DocumentId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Versions

pub async fn list_versions<S: AppState>(
    Path(id): Path<i64>,
    State(state): State<S>,
    _identity: Identity,
) -> Result<ApiSuccess<Vec<VersionSummaryResponse>>, ApiError> {
    let versions = state.documents().versions(DocumentId(id)).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        versions.into_iter().map(VersionSummaryResponse::from).collect(),
    ))
}

pub async fn create_version<S: AppState>(
    Path(id): Path<i64>,
    State(state): State<S>,
    identity: Identity,
    Json(req): Json<DraftRequest>,
) -> Result<ApiSuccess<VersionDetailResponse>, ApiError> {
    if !identity.role.can_edit_documents() {
        return Err(ApiError::Forbidden);
    }

    let template_key = parse_template_key(&req.template_key)?;
    let version =
        documents::add_version(&state, DocumentId(id), template_key, req.params).await?;

    Ok(ApiSuccess::new(StatusCode::CREATED, VersionDetailResponse::from(version)))
}

pub async fn get_version<S: AppState>(
    Path((id, version)): Path<(i64, String)>,
    State(state): State<S>,
    _identity: Identity,
) -> Result<ApiSuccess<VersionDetailResponse>, ApiError> {
    let selector = parse_version_selector(&version)?;
    let version = state.documents().get_version(DocumentId(id), selector).await?;

    Ok(ApiSuccess::new(StatusCode::OK, VersionDetailResponse::from(version)))
}

pub async fn delete_version<S: AppState>(
    Path((id, version)): Path<(i64, String)>,
    State(state): State<S>,
    identity: Identity,
) -> Result<StatusCode, ApiError> {
    if !identity.role.can_edit_documents() {
        return Err(ApiError::Forbidden);
    }

    let number = parse_version_number(&version)?;
    state.documents().delete_version(DocumentId(id), number).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn rollback_version<S: AppState>(
    Path((id, version)): Path<(i64, String)>,
    State(state): State<S>,
    identity: Identity,
) -> Result<ApiSuccess<VersionDetailResponse>, ApiError> {
    if !identity.role.can_edit_documents() {
        return Err(ApiError::Forbidden);
    }

    let number = parse_version_number(&version)?;
    let version = documents::rollback(&state, DocumentId(id), number).await?;

    Ok(ApiSuccess::new(StatusCode::CREATED, VersionDetailResponse::from(version)))
}

// Approvals

pub async fn list_approvals<S: AppState>(
    Path(id): Path<i64>,
    State(state): State<S>,
    _identity: Identity,
) -> Result<ApiSuccess<Vec<ApprovalResponse>>, ApiError> {
    let id = DocumentId(id);
    state.documents().get(id).await?;
    let approvals = state.approvals().list(id).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        approvals.into_iter().map(ApprovalResponse::from).collect(),
    ))
}

pub async fn request_approval<S: AppState>(
    Path(id): Path<i64>,
    State(state): State<S>,
    identity: Identity,
    Json(req): Json<RequestApprovalRequest>,
) -> Result<ApiSuccess<ApprovalResponse>, ApiError> {
    if !identity.role.can_edit_documents() {
        return Err(ApiError::Forbidden);
    }

    let approval = approvals::request_approval(
        &state,
        DocumentId(id),
        req.reviewer,
        req.version,
        req.note,
    )
    .await?;

    Ok(ApiSuccess::new(StatusCode::CREATED, ApprovalResponse::from(approval)))
}

pub async fn approval_summary<S: AppState>(
    Path(id): Path<i64>,
    QueryString(params): QueryString<SummaryParams>,
    State(state): State<S>,
    _identity: Identity,
) -> Result<ApiSuccess<ApprovalSummary>, ApiError> {
    let latest_only = params.latest_only.unwrap_or(false);
    let summary = approvals::summary_by_document(&state, DocumentId(id), latest_only).await?;

    Ok(ApiSuccess::new(StatusCode::OK, summary))
}

pub async fn decide_approval<S: AppState>(
    Path((id, approval_id)): Path<(i64, i64)>,
    State(state): State<S>,
    identity: Identity,
    Json(req): Json<DecideApprovalRequest>,
) -> Result<ApiSuccess<ApprovalResponse>, ApiError> {
    if !identity.role.can_decide_approvals() {
        return Err(ApiError::Forbidden);
    }

    let approval = approvals::decide_approval(
        &state,
        &identity,
        DocumentId(id),
        ApprovalId(approval_id),
        req.status,
        req.note,
    )
    .await?;

    Ok(ApiSuccess::new(StatusCode::OK, ApprovalResponse::from(approval)))
}

// Comments

pub async fn list_comments<S: AppState>(
    Path(id): Path<i64>,
    State(state): State<S>,
    _identity: Identity,
) -> Result<ApiSuccess<Vec<CommentResponse>>, ApiError> {
    let id = DocumentId(id);
    state.documents().get(id).await?;
    let comments = state.comments().list(id).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        comments.into_iter().map(CommentResponse::from).collect(),
    ))
}

pub async fn create_comment<S: AppState>(
    Path(id): Path<i64>,
    State(state): State<S>,
    identity: Identity,
    Json(req): Json<CreateCommentRequest>,
) -> Result<ApiSuccess<CommentResponse>, ApiError> {
    let id = DocumentId(id);
    state.documents().get(id).await?;

    let comment = state
        .comments()
        .create(NewComment {
            document_id: id,
            version: req.version,
            author: identity.display_name().to_string(),
            body: req.body,
        })
        .await?;

    Ok(ApiSuccess::new(StatusCode::CREATED, CommentResponse::from(comment)))
}

fn parse_template_key(raw: &str) -> Result<TemplateKey, ApiError> {
    TemplateKey::try_new(raw).map_err(|err| ApiError::BadRequest(err.to_string()))
}

fn parse_version_selector(raw: &str) -> Result<VersionSelector, ApiError> {
    VersionSelector::parse(raw).ok_or_else(|| {
        ApiError::BadRequest(format!("'{}' is not a version number or \"latest\"", raw))
    })
}

fn parse_version_number(raw: &str) -> Result<i64, ApiError> {
    match parse_version_selector(raw)? {
        VersionSelector::Number(number) => Ok(number),
        VersionSelector::Latest => {
            Err(ApiError::BadRequest("a concrete version number is required".to_string()))
        }
    }
}
