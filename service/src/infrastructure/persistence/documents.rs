use chrono::{DateTime, Utc};
use policyforge_common::{ParameterSet, TemplateKey, database::Database};
use sqlx::Row;
use sqlx::postgres::PgRow;
use sqlx::types::Json;

use crate::domain::{
    documents::{Document, DocumentId, DocumentStatus, Version, VersionSelector, VersionSummary},
    repository::{DocumentRepository, NewDocument, RepositoryError},
};
use crate::infrastructure::persistence::{corrupt_column, map_sqlx_error};

const DOCUMENT_COLUMNS: &str = "d.id, d.org_id, d.template_key, d.title, d.status, \
     d.created_at, d.updated_at, \
     (SELECT MAX(v.version) FROM policy_versions v WHERE v.document_id = d.id) AS latest_version";

#[derive(Clone)]
pub struct PostgresDocumentRepository {
    database: &'static Database,
}

impl PostgresDocumentRepository {
    pub fn new(database: &'static Database) -> Self {
        Self { database }
    }
}

impl DocumentRepository for PostgresDocumentRepository {
    async fn create(&self, new: NewDocument) -> Result<Document, RepositoryError> {
        let mut tx = self
            .database
            .database_pool()
            .begin()
            .await
            .map_err(map_sqlx_error)?;

        // the creator becomes the document's owner; provision the user row on
        // first contact so decision notifications always have a target
        let owner_id: i64 = sqlx::query_scalar(
            "INSERT INTO policy_users (email, name, role)
             VALUES ($1, $2, $3)
             ON CONFLICT (email) DO UPDATE SET name = COALESCE(EXCLUDED.name, policy_users.name)
             RETURNING id",
        )
        .bind(&new.owner_email)
        .bind(&new.owner_name)
        .bind(new.owner_role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let row = sqlx::query(
            "INSERT INTO policy_documents (org_id, template_key, title, status, last_version)
             VALUES ($1, $2, $3, 'draft', 1)
             RETURNING id, org_id, template_key, title, status, created_at, updated_at",
        )
        .bind(new.org_id)
        .bind(new.template_key.as_ref())
        .bind(&new.title)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let document_id: i64 = row.try_get("id").map_err(map_sqlx_error)?;

        sqlx::query(
            "INSERT INTO policy_versions (document_id, version, html, params)
             VALUES ($1, 1, $2, $3)",
        )
        .bind(document_id)
        .bind(&new.html)
        .bind(Json(&new.params))
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        sqlx::query(
            "INSERT INTO policy_document_owners (document_id, user_id)
             VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(document_id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        let mut document = row_to_document_without_latest(&row)?;
        document.latest_version = Some(1);
        Ok(document)
    }

    async fn list(&self, limit: i64) -> Result<Vec<Document>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM policy_documents d ORDER BY d.updated_at DESC LIMIT $1",
            DOCUMENT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .fetch_all(self.database.database_pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(row_to_document).collect()
    }

    async fn get(&self, id: DocumentId) -> Result<Document, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM policy_documents d WHERE d.id = $1",
            DOCUMENT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id.0)
            .fetch_optional(self.database.database_pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_document(&row)
    }

    async fn versions(&self, id: DocumentId) -> Result<Vec<VersionSummary>, RepositoryError> {
        // distinguish "no versions" from "no document"
        self.get(id).await?;

        let rows = sqlx::query(
            "SELECT id, version, created_at FROM policy_versions
             WHERE document_id = $1
             ORDER BY version ASC",
        )
        .bind(id.0)
        .fetch_all(self.database.database_pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| {
                Ok(VersionSummary {
                    id: row.try_get("id").map_err(map_sqlx_error)?,
                    version: row.try_get("version").map_err(map_sqlx_error)?,
                    created_at: row.try_get("created_at").map_err(map_sqlx_error)?,
                })
            })
            .collect()
    }

    async fn add_version(
        &self,
        id: DocumentId,
        html: String,
        params: ParameterSet,
    ) -> Result<Version, RepositoryError> {
        let mut tx = self
            .database
            .database_pool()
            .begin()
            .await
            .map_err(map_sqlx_error)?;

        // the high-water mark assigns the number; deleted numbers are never
        // handed out again
        let number: i64 = sqlx::query_scalar(
            "UPDATE policy_documents
             SET last_version = last_version + 1, updated_at = now()
             WHERE id = $1
             RETURNING last_version",
        )
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepositoryError::NotFound)?;

        let row = sqlx::query(
            "INSERT INTO policy_versions (document_id, version, html, params)
             VALUES ($1, $2, $3, $4)
             RETURNING id, created_at",
        )
        .bind(id.0)
        .bind(number)
        .bind(&html)
        .bind(Json(&params))
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(Version {
            id: row.try_get("id").map_err(map_sqlx_error)?,
            document_id: id,
            version: number,
            html,
            params,
            created_at: row.try_get("created_at").map_err(map_sqlx_error)?,
        })
    }

    async fn get_version(
        &self,
        id: DocumentId,
        selector: VersionSelector,
    ) -> Result<Version, RepositoryError> {
        let query = match selector {
            VersionSelector::Number(number) => sqlx::query(
                "SELECT id, document_id, version, html, params, created_at
                 FROM policy_versions
                 WHERE document_id = $1 AND version = $2",
            )
            .bind(id.0)
            .bind(number),
            VersionSelector::Latest => sqlx::query(
                "SELECT id, document_id, version, html, params, created_at
                 FROM policy_versions
                 WHERE document_id = $1
                 ORDER BY version DESC
                 LIMIT 1",
            )
            .bind(id.0),
        };

        let row = query
            .fetch_optional(self.database.database_pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_version(&row)
    }

    async fn delete_version(&self, id: DocumentId, version: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM policy_versions WHERE document_id = $1 AND version = $2",
        )
        .bind(id.0)
        .bind(version)
        .execute(self.database.database_pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn update_metadata(
        &self,
        id: DocumentId,
        title: Option<String>,
        status: Option<DocumentStatus>,
    ) -> Result<Document, RepositoryError> {
        let result = sqlx::query(
            "UPDATE policy_documents
             SET title = COALESCE($2, title),
                 status = COALESCE($3, status),
                 updated_at = now()
             WHERE id = $1",
        )
        .bind(id.0)
        .bind(title)
        .bind(status.map(DocumentStatus::as_str))
        .execute(self.database.database_pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(id).await
    }

    async fn delete(&self, id: DocumentId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM policy_documents WHERE id = $1")
            .bind(id.0)
            .execute(self.database.database_pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn owner_emails(&self, id: DocumentId) -> Result<Vec<String>, RepositoryError> {
        sqlx::query_scalar(
            "SELECT u.email FROM policy_document_owners o
             JOIN policy_users u ON u.id = o.user_id
             WHERE o.document_id = $1",
        )
        .bind(id.0)
        .fetch_all(self.database.database_pool())
        .await
        .map_err(map_sqlx_error)
    }
}

fn row_to_document(row: &PgRow) -> Result<Document, RepositoryError> {
    let mut document = row_to_document_without_latest(row)?;
    document.latest_version = row.try_get("latest_version").map_err(map_sqlx_error)?;
    Ok(document)
}

fn row_to_document_without_latest(row: &PgRow) -> Result<Document, RepositoryError> {
    let template_key: String = row.try_get("template_key").map_err(map_sqlx_error)?;
    let template_key = TemplateKey::try_new(template_key)
        .map_err(|e| corrupt_column("template_key", e))?;

    let status: String = row.try_get("status").map_err(map_sqlx_error)?;
    let status = DocumentStatus::parse(&status)
        .ok_or_else(|| corrupt_column("status", format!("unexpected value '{}'", status)))?;

    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(map_sqlx_error)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(map_sqlx_error)?;

    Ok(Document {
        id: DocumentId(row.try_get("id").map_err(map_sqlx_error)?),
        org_id: row.try_get("org_id").map_err(map_sqlx_error)?,
        template_key,
        title: row.try_get("title").map_err(map_sqlx_error)?,
        status,
        created_at,
        updated_at,
        latest_version: None,
    })
}

fn row_to_version(row: &PgRow) -> Result<Version, RepositoryError> {
    let params: Json<ParameterSet> = row.try_get("params").map_err(map_sqlx_error)?;

    Ok(Version {
        id: row.try_get("id").map_err(map_sqlx_error)?,
        document_id: DocumentId(row.try_get("document_id").map_err(map_sqlx_error)?),
        version: row.try_get("version").map_err(map_sqlx_error)?,
        html: row.try_get("html").map_err(map_sqlx_error)?,
        params: params.0,
        created_at: row.try_get("created_at").map_err(map_sqlx_error)?,
    })
}
