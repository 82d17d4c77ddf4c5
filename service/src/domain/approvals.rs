use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AppState, Identity,
    documents::{DocumentId, VersionSelector},
    notifications::NotificationKind,
    repository::{
        ApprovalRepository, DocumentRepository, NewApproval, NewNotification,
        NotificationRepository, RepositoryError,
    },
};

/// Wrapper to prevent ID confusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApprovalId(pub i64);

impl From<i64> for ApprovalId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ApprovalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(ApprovalStatus::Pending),
            "approved" => Some(ApprovalStatus::Approved),
            "rejected" => Some(ApprovalStatus::Rejected),
            _ => None,
        }
    }
}

/// The two terminal outcomes a pending approval can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn as_status(self) -> ApprovalStatus {
        match self {
            Decision::Approved => ApprovalStatus::Approved,
            Decision::Rejected => ApprovalStatus::Rejected,
        }
    }
}

/// One reviewer's decision record on a document or a specific version.
#[derive(Debug, Clone)]
pub struct Approval {
    pub id: ApprovalId,
    pub document_id: DocumentId,
    /// None means the approval applies to all versions.
    pub version: Option<i64>,
    pub reviewer: String,
    pub status: ApprovalStatus,
    pub note: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApprovalSummary {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

/// Opens a pending approval and notifies the reviewer. A version, if given,
/// must exist on the document.
pub async fn request_approval<S: AppState>(
    state: &S,
    document_id: DocumentId,
    reviewer: String,
    version: Option<i64>,
    note: Option<String>,
) -> Result<Approval, RepositoryError> {
    let document = state.documents().get(document_id).await?;

    if let Some(number) = version {
        state
            .documents()
            .get_version(document_id, VersionSelector::Number(number))
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => RepositoryError::ValidationFailed(format!(
                    "version {} does not exist for document {}",
                    number, document_id
                )),
                other => other,
            })?;
    }

    let approval = state
        .approvals()
        .create(NewApproval {
            document_id,
            version,
            reviewer: reviewer.clone(),
            note,
        })
        .await?;

    state
        .notifications()
        .create(NewNotification {
            target_email: reviewer,
            kind: NotificationKind::ApprovalRequested,
            message: format!("Approval requested for \"{}\"", document.title),
            document_id: Some(document_id),
            version,
            approval_id: Some(approval.id),
        })
        .await?;

    Ok(approval)
}

/// Moves a pending approval to its terminal state and notifies the document's
/// owners. A second decision on the same approval fails with `Conflict`.
///
/// The document's own status field is deliberately not touched here; callers
/// mirror the outcome through a metadata update.
pub async fn decide_approval<S: AppState>(
    state: &S,
    identity: &Identity,
    document_id: DocumentId,
    approval_id: ApprovalId,
    decision: Decision,
    note: Option<String>,
) -> Result<Approval, RepositoryError> {
    let document = state.documents().get(document_id).await?;

    let approval = state
        .approvals()
        .decide(document_id, approval_id, decision, note)
        .await?;

    let message = format!(
        "{} {} \"{}\"",
        identity.display_name(),
        match decision {
            Decision::Approved => "approved",
            Decision::Rejected => "rejected",
        },
        document.title
    );

    for target_email in state.documents().owner_emails(document_id).await? {
        state
            .notifications()
            .create(NewNotification {
                target_email,
                kind: NotificationKind::ApprovalDecided,
                message: message.clone(),
                document_id: Some(document_id),
                version: approval.version,
                approval_id: Some(approval.id),
            })
            .await?;
    }

    Ok(approval)
}

/// Pending/approved/rejected counts, optionally narrowed to approvals that
/// apply to the current latest version.
pub async fn summary_by_document<S: AppState>(
    state: &S,
    document_id: DocumentId,
    latest_only: bool,
) -> Result<ApprovalSummary, RepositoryError> {
    state.documents().get(document_id).await?;
    state.approvals().summary(document_id, latest_only).await
}
