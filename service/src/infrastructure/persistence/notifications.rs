use policyforge_common::database::Database;
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::domain::{
    approvals::ApprovalId,
    documents::DocumentId,
    notifications::{Notification, NotificationKind},
    repository::{NewNotification, NotificationRepository, RepositoryError},
};
use crate::infrastructure::persistence::{corrupt_column, map_sqlx_error};

const NOTIFICATION_COLUMNS: &str =
    "id, target_email, type, message, document_id, version, approval_id, created_at, read_at";

#[derive(Clone)]
pub struct PostgresNotificationRepository {
    database: &'static Database,
}

impl PostgresNotificationRepository {
    pub fn new(database: &'static Database) -> Self {
        Self { database }
    }
}

impl NotificationRepository for PostgresNotificationRepository {
    async fn create(&self, new: NewNotification) -> Result<Notification, RepositoryError> {
        let sql = format!(
            "INSERT INTO policy_notifications
                 (target_email, type, message, document_id, version, approval_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            NOTIFICATION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(&new.target_email)
            .bind(new.kind.as_str())
            .bind(&new.message)
            .bind(new.document_id.map(|id| id.0))
            .bind(new.version)
            .bind(new.approval_id.map(|id| id.0))
            .fetch_one(self.database.database_pool())
            .await
            .map_err(map_sqlx_error)?;

        row_to_notification(&row)
    }

    async fn list(
        &self,
        target_email: &str,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM policy_notifications
             WHERE target_email = $1 {}
             ORDER BY created_at DESC, id DESC
             LIMIT $2",
            NOTIFICATION_COLUMNS,
            if unread_only { "AND read_at IS NULL" } else { "" }
        );
        let rows = sqlx::query(&sql)
            .bind(target_email)
            .bind(limit)
            .fetch_all(self.database.database_pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(row_to_notification).collect()
    }

    async fn mark_read(&self, target_email: &str, ids: &[i64]) -> Result<u64, RepositoryError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            "UPDATE policy_notifications
             SET read_at = now()
             WHERE target_email = $1 AND id = ANY($2) AND read_at IS NULL",
        )
        .bind(target_email)
        .bind(ids)
        .execute(self.database.database_pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn mark_all_read(&self, target_email: &str) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE policy_notifications
             SET read_at = now()
             WHERE target_email = $1 AND read_at IS NULL",
        )
        .bind(target_email)
        .execute(self.database.database_pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}

fn row_to_notification(row: &PgRow) -> Result<Notification, RepositoryError> {
    let kind: String = row.try_get("type").map_err(map_sqlx_error)?;
    let kind = NotificationKind::parse(&kind)
        .ok_or_else(|| corrupt_column("type", format!("unexpected value '{}'", kind)))?;

    let document_id: Option<i64> = row.try_get("document_id").map_err(map_sqlx_error)?;
    let approval_id: Option<i64> = row.try_get("approval_id").map_err(map_sqlx_error)?;

    Ok(Notification {
        id: row.try_get("id").map_err(map_sqlx_error)?,
        target_email: row.try_get("target_email").map_err(map_sqlx_error)?,
        kind,
        message: row.try_get("message").map_err(map_sqlx_error)?,
        document_id: document_id.map(DocumentId),
        version: row.try_get("version").map_err(map_sqlx_error)?,
        approval_id: approval_id.map(ApprovalId),
        created_at: row.try_get("created_at").map_err(map_sqlx_error)?,
        read_at: row.try_get("read_at").map_err(map_sqlx_error)?,
    })
}
