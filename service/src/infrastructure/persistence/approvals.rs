use policyforge_common::database::Database;
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::domain::{
    approvals::{Approval, ApprovalId, ApprovalStatus, ApprovalSummary, Decision},
    documents::DocumentId,
    repository::{ApprovalRepository, NewApproval, RepositoryError},
};
use crate::infrastructure::persistence::{corrupt_column, map_sqlx_error};

const APPROVAL_COLUMNS: &str =
    "id, document_id, version, reviewer, status, note, requested_at, decided_at";

#[derive(Clone)]
pub struct PostgresApprovalRepository {
    database: &'static Database,
}

impl PostgresApprovalRepository {
    pub fn new(database: &'static Database) -> Self {
        Self { database }
    }
}

impl ApprovalRepository for PostgresApprovalRepository {
    async fn create(&self, new: NewApproval) -> Result<Approval, RepositoryError> {
        let sql = format!(
            "INSERT INTO policy_approvals (document_id, version, reviewer, note)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            APPROVAL_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(new.document_id.0)
            .bind(new.version)
            .bind(&new.reviewer)
            .bind(&new.note)
            .fetch_one(self.database.database_pool())
            .await
            .map_err(map_sqlx_error)?;

        row_to_approval(&row)
    }

    async fn list(&self, document_id: DocumentId) -> Result<Vec<Approval>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM policy_approvals
             WHERE document_id = $1
             ORDER BY requested_at DESC, id DESC",
            APPROVAL_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(document_id.0)
            .fetch_all(self.database.database_pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(row_to_approval).collect()
    }

    async fn decide(
        &self,
        document_id: DocumentId,
        approval_id: ApprovalId,
        decision: Decision,
        note: Option<String>,
    ) -> Result<Approval, RepositoryError> {
        // conditional update keeps the pending -> terminal transition atomic
        let sql = format!(
            "UPDATE policy_approvals
             SET status = $3, note = COALESCE($4, note), decided_at = now()
             WHERE id = $1 AND document_id = $2 AND status = 'pending'
             RETURNING {}",
            APPROVAL_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(approval_id.0)
            .bind(document_id.0)
            .bind(decision.as_status().as_str())
            .bind(&note)
            .fetch_optional(self.database.database_pool())
            .await
            .map_err(map_sqlx_error)?;

        if let Some(row) = row {
            return row_to_approval(&row);
        }

        // nothing updated: either the approval is unknown or already decided
        let current: Option<String> = sqlx::query_scalar(
            "SELECT status FROM policy_approvals WHERE id = $1 AND document_id = $2",
        )
        .bind(approval_id.0)
        .bind(document_id.0)
        .fetch_optional(self.database.database_pool())
        .await
        .map_err(map_sqlx_error)?;

        match current {
            Some(status) => Err(RepositoryError::Conflict(format!("approval already {}", status))),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn summary(
        &self,
        document_id: DocumentId,
        latest_only: bool,
    ) -> Result<ApprovalSummary, RepositoryError> {
        let sql = if latest_only {
            "SELECT
                COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                COUNT(*) FILTER (WHERE status = 'approved') AS approved,
                COUNT(*) FILTER (WHERE status = 'rejected') AS rejected
             FROM policy_approvals
             WHERE document_id = $1
               AND (version IS NULL OR version =
                    (SELECT MAX(version) FROM policy_versions WHERE document_id = $1))"
        } else {
            "SELECT
                COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                COUNT(*) FILTER (WHERE status = 'approved') AS approved,
                COUNT(*) FILTER (WHERE status = 'rejected') AS rejected
             FROM policy_approvals
             WHERE document_id = $1"
        };

        let row = sqlx::query(sql)
            .bind(document_id.0)
            .fetch_one(self.database.database_pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(ApprovalSummary {
            pending: row.try_get("pending").map_err(map_sqlx_error)?,
            approved: row.try_get("approved").map_err(map_sqlx_error)?,
            rejected: row.try_get("rejected").map_err(map_sqlx_error)?,
        })
    }
}

fn row_to_approval(row: &PgRow) -> Result<Approval, RepositoryError> {
    let status: String = row.try_get("status").map_err(map_sqlx_error)?;
    let status = ApprovalStatus::parse(&status)
        .ok_or_else(|| corrupt_column("status", format!("unexpected value '{}'", status)))?;

    Ok(Approval {
        id: ApprovalId(row.try_get("id").map_err(map_sqlx_error)?),
        document_id: DocumentId(row.try_get("document_id").map_err(map_sqlx_error)?),
        version: row.try_get("version").map_err(map_sqlx_error)?,
        reviewer: row.try_get("reviewer").map_err(map_sqlx_error)?,
        status,
        note: row.try_get("note").map_err(map_sqlx_error)?,
        requested_at: row.try_get("requested_at").map_err(map_sqlx_error)?,
        decided_at: row.try_get("decided_at").map_err(map_sqlx_error)?,
    })
}
