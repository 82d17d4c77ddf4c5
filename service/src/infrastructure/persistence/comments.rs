use policyforge_common::database::Database;
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::domain::{
    comments::Comment,
    documents::DocumentId,
    repository::{CommentRepository, NewComment, RepositoryError},
};
use crate::infrastructure::persistence::map_sqlx_error;

#[derive(Clone)]
pub struct PostgresCommentRepository {
    database: &'static Database,
}

impl PostgresCommentRepository {
    pub fn new(database: &'static Database) -> Self {
        Self { database }
    }
}

impl CommentRepository for PostgresCommentRepository {
    async fn list(&self, document_id: DocumentId) -> Result<Vec<Comment>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, document_id, version, author, body, created_at
             FROM policy_comments
             WHERE document_id = $1
             ORDER BY created_at ASC, id ASC",
        )
        .bind(document_id.0)
        .fetch_all(self.database.database_pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(row_to_comment).collect()
    }

    async fn create(&self, new: NewComment) -> Result<Comment, RepositoryError> {
        let row = sqlx::query(
            "INSERT INTO policy_comments (document_id, version, author, body)
             VALUES ($1, $2, $3, $4)
             RETURNING id, document_id, version, author, body, created_at",
        )
        .bind(new.document_id.0)
        .bind(new.version)
        .bind(&new.author)
        .bind(&new.body)
        .fetch_one(self.database.database_pool())
        .await
        .map_err(map_sqlx_error)?;

        row_to_comment(&row)
    }
}

fn row_to_comment(row: &PgRow) -> Result<Comment, RepositoryError> {
    Ok(Comment {
        id: row.try_get("id").map_err(map_sqlx_error)?,
        document_id: DocumentId(row.try_get("document_id").map_err(map_sqlx_error)?),
        version: row.try_get("version").map_err(map_sqlx_error)?,
        author: row.try_get("author").map_err(map_sqlx_error)?,
        body: row.try_get("body").map_err(map_sqlx_error)?,
        created_at: row.try_get("created_at").map_err(map_sqlx_error)?,
    })
}
