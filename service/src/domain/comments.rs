use chrono::{DateTime, Utc};

use crate::domain::documents::DocumentId;

/// Append-only discussion entry on a document or a specific version.
#[derive(Debug, Clone)]
pub struct Comment {
    pub id: i64,
    pub document_id: DocumentId,
    pub version: Option<i64>,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
