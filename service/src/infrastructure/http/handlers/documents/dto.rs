use chrono::{DateTime, Utc};
use policyforge_common::ParameterSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{
    approvals::{Approval, ApprovalStatus, Decision},
    comments::Comment,
    documents::{Document, DocumentStatus, Version, VersionSummary},
};

// Requests

/// Parameters for rendering a draft: which template plus its field values.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftRequest {
    pub template_key: String,
    #[serde(default)]
    pub params: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDocumentRequest {
    pub title: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestApprovalRequest {
    pub reviewer: String,
    pub version: Option<i64>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecideApprovalRequest {
    pub status: Decision,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
    pub version: Option<i64>,
}

// Responses

/// Response for list/create document routes
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    id: i64,
    title: String,
    template_key: String,
    status: DocumentStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    latest_version: Option<i64>,
}

impl From<Document> for DocumentResponse {
    fn from(value: Document) -> Self {
        Self {
            id: value.id.0,
            title: value.title,
            template_key: value.template_key.to_string(),
            status: value.status,
            created_at: value.created_at,
            updated_at: value.updated_at,
            latest_version: value.latest_version,
        }
    }
}

/// Response for one document route, versions included
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDetailResponse {
    #[serde(flatten)]
    document: DocumentResponse,
    versions: Vec<VersionSummaryResponse>,
}

impl DocumentDetailResponse {
    pub fn new(document: Document, versions: Vec<VersionSummary>) -> Self {
        Self {
            document: document.into(),
            versions: versions.into_iter().map(VersionSummaryResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummaryResponse {
    id: i64,
    version: i64,
    created_at: DateTime<Utc>,
}

impl From<VersionSummary> for VersionSummaryResponse {
    fn from(value: VersionSummary) -> Self {
        Self {
            id: value.id,
            version: value.version,
            created_at: value.created_at,
        }
    }
}

/// Full version payload: rendered html plus the frozen parameter set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDetailResponse {
    id: i64,
    version: i64,
    created_at: DateTime<Utc>,
    html: String,
    params: ParameterSet,
}

impl From<Version> for VersionDetailResponse {
    fn from(value: Version) -> Self {
        Self {
            id: value.id,
            version: value.version,
            created_at: value.created_at,
            html: value.html,
            params: value.params,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalResponse {
    id: i64,
    document_id: i64,
    version: Option<i64>,
    reviewer: String,
    status: ApprovalStatus,
    note: Option<String>,
    requested_at: DateTime<Utc>,
    decided_at: Option<DateTime<Utc>>,
}

impl From<Approval> for ApprovalResponse {
    fn from(value: Approval) -> Self {
        Self {
            id: value.id.0,
            document_id: value.document_id.0,
            version: value.version,
            reviewer: value.reviewer,
            status: value.status,
            note: value.note,
            requested_at: value.requested_at,
            decided_at: value.decided_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    id: i64,
    document_id: i64,
    version: Option<i64>,
    author: String,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(value: Comment) -> Self {
        Self {
            id: value.id,
            document_id: value.document_id.0,
            version: value.version,
            author: value.author,
            body: value.body,
            created_at: value.created_at,
        }
    }
}
