use policyforge_common::{ControlId, FrameworkKey, database::Database};
use sqlx::Row;
use sqlx::postgres::PgRow;
use sqlx::types::Json;

use crate::domain::{
    assessments::{Assessment, AssessmentStatus, AssessmentUpdate},
    repository::{AssessmentRepository, RepositoryError},
    users::UserId,
};
use crate::infrastructure::persistence::{corrupt_column, map_sqlx_error};

const ASSESSMENT_COLUMNS: &str = "id, org_id, framework_key, control_id, status, \
     owner_user_id, notes, evidence_links, last_reviewed_at, created_at, updated_at";

#[derive(Clone)]
pub struct PostgresAssessmentRepository {
    database: &'static Database,
}

impl PostgresAssessmentRepository {
    pub fn new(database: &'static Database) -> Self {
        Self { database }
    }
}

impl AssessmentRepository for PostgresAssessmentRepository {
    async fn list_for_framework(
        &self,
        org_id: i64,
        framework_key: &FrameworkKey,
    ) -> Result<Vec<Assessment>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM org_control_assessments
             WHERE org_id = $1 AND framework_key = $2",
            ASSESSMENT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(org_id)
            .bind(framework_key.as_ref())
            .fetch_all(self.database.database_pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(row_to_assessment).collect()
    }

    async fn upsert(
        &self,
        org_id: i64,
        framework_key: &FrameworkKey,
        control_id: &ControlId,
        update: AssessmentUpdate,
    ) -> Result<Assessment, RepositoryError> {
        // absent fields fall back to the stored value through COALESCE
        let sql = format!(
            "INSERT INTO org_control_assessments
                 (org_id, framework_key, control_id, status, owner_user_id,
                  notes, evidence_links, last_reviewed_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (org_id, framework_key, control_id) DO UPDATE SET
                 status = COALESCE(EXCLUDED.status, org_control_assessments.status),
                 owner_user_id = COALESCE(EXCLUDED.owner_user_id, org_control_assessments.owner_user_id),
                 notes = COALESCE(EXCLUDED.notes, org_control_assessments.notes),
                 evidence_links = COALESCE(EXCLUDED.evidence_links, org_control_assessments.evidence_links),
                 last_reviewed_at = COALESCE(EXCLUDED.last_reviewed_at, org_control_assessments.last_reviewed_at),
                 updated_at = now()
             RETURNING {}",
            ASSESSMENT_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(org_id)
            .bind(framework_key.as_ref())
            .bind(control_id.as_ref())
            .bind(update.status.map(AssessmentStatus::as_str))
            .bind(update.owner_user_id)
            .bind(update.notes)
            .bind(update.evidence_links.map(Json))
            .bind(update.last_reviewed_at)
            .fetch_one(self.database.database_pool())
            .await
            .map_err(map_sqlx_error)?;

        row_to_assessment(&row)
    }
}

fn row_to_assessment(row: &PgRow) -> Result<Assessment, RepositoryError> {
    let framework_key: String = row.try_get("framework_key").map_err(map_sqlx_error)?;
    let framework_key = FrameworkKey::try_new(framework_key)
        .map_err(|e| corrupt_column("framework_key", e))?;

    let control_id: String = row.try_get("control_id").map_err(map_sqlx_error)?;
    let control_id =
        ControlId::try_new(control_id).map_err(|e| corrupt_column("control_id", e))?;

    let status: Option<String> = row.try_get("status").map_err(map_sqlx_error)?;
    let status = status
        .map(|raw| {
            AssessmentStatus::parse(&raw)
                .ok_or_else(|| corrupt_column("status", format!("unexpected value '{}'", raw)))
        })
        .transpose()?;

    let evidence_links: Option<Json<Vec<String>>> =
        row.try_get("evidence_links").map_err(map_sqlx_error)?;

    let owner_user_id: Option<i64> = row.try_get("owner_user_id").map_err(map_sqlx_error)?;

    Ok(Assessment {
        id: row.try_get("id").map_err(map_sqlx_error)?,
        org_id: row.try_get("org_id").map_err(map_sqlx_error)?,
        framework_key,
        control_id,
        status,
        owner_user_id: owner_user_id.map(UserId),
        notes: row.try_get("notes").map_err(map_sqlx_error)?,
        evidence_links: evidence_links.map(|links| links.0).unwrap_or_default(),
        last_reviewed_at: row.try_get("last_reviewed_at").map_err(map_sqlx_error)?,
        created_at: row.try_get("created_at").map_err(map_sqlx_error)?,
        updated_at: row.try_get("updated_at").map_err(map_sqlx_error)?,
    })
}
