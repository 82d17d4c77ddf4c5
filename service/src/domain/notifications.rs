use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{approvals::ApprovalId, documents::DocumentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ApprovalRequested,
    ApprovalDecided,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::ApprovalRequested => "approval_requested",
            NotificationKind::ApprovalDecided => "approval_decided",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "approval_requested" => Some(NotificationKind::ApprovalRequested),
            "approval_decided" => Some(NotificationKind::ApprovalDecided),
            _ => None,
        }
    }
}

/// In-app notification row; read_at doubles as the unread flag.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: i64,
    pub target_email: String,
    pub kind: NotificationKind,
    pub message: String,
    pub document_id: Option<DocumentId>,
    pub version: Option<i64>,
    pub approval_id: Option<ApprovalId>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn is_unread(&self) -> bool {
        self.read_at.is_none()
    }
}
