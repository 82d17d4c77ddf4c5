use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::notifications::{Notification, NotificationKind};

// Requests

#[derive(Debug, Clone, Deserialize)]
pub struct MarkReadRequest {
    pub ids: Vec<i64>,
}

// Responses

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    id: i64,
    #[serde(rename = "type")]
    kind: NotificationKind,
    message: String,
    document_id: Option<i64>,
    version: Option<i64>,
    approval_id: Option<i64>,
    created_at: DateTime<Utc>,
    read_at: Option<DateTime<Utc>>,
}

impl From<Notification> for NotificationResponse {
    fn from(value: Notification) -> Self {
        Self {
            id: value.id,
            kind: value.kind,
            message: value.message,
            document_id: value.document_id.map(|id| id.0),
            version: value.version,
            approval_id: value.approval_id.map(|id| id.0),
            created_at: value.created_at,
            read_at: value.read_at,
        }
    }
}
