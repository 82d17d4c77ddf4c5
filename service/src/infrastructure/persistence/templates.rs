use policyforge_common::{ParameterSpec, Template, TemplateKey, database::Database};
use sqlx::Row;
use sqlx::postgres::PgRow;
use sqlx::types::Json;

use crate::domain::repository::{RepositoryError, TemplateRepository, TemplateUpdate};
use crate::infrastructure::persistence::{corrupt_column, map_sqlx_error};

#[derive(Clone)]
pub struct PostgresTemplateRepository {
    database: &'static Database,
}

impl PostgresTemplateRepository {
    pub fn new(database: &'static Database) -> Self {
        Self { database }
    }
}

impl TemplateRepository for PostgresTemplateRepository {
    async fn seed(&self, templates: Vec<Template>) -> Result<(), RepositoryError> {
        let mut tx = self
            .database
            .database_pool()
            .begin()
            .await
            .map_err(map_sqlx_error)?;

        // defaults only fill gaps; stored edits win
        for template in templates {
            sqlx::query(
                "INSERT INTO policy_templates (key, title, body, parameters)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (key) DO NOTHING",
            )
            .bind(template.key.as_ref())
            .bind(&template.title)
            .bind(&template.body)
            .bind(Json(&template.parameters))
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn list(&self) -> Result<Vec<Template>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT key, title, body, parameters FROM policy_templates ORDER BY key ASC",
        )
        .fetch_all(self.database.database_pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(row_to_template).collect()
    }

    async fn get(&self, key: &TemplateKey) -> Result<Option<Template>, RepositoryError> {
        let row = sqlx::query(
            "SELECT key, title, body, parameters FROM policy_templates WHERE key = $1",
        )
        .bind(key.as_ref())
        .fetch_optional(self.database.database_pool())
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_template).transpose()
    }

    async fn update(
        &self,
        key: &TemplateKey,
        update: TemplateUpdate,
    ) -> Result<Template, RepositoryError> {
        let row = sqlx::query(
            "UPDATE policy_templates
             SET title = COALESCE($2, title),
                 body = COALESCE($3, body),
                 parameters = COALESCE($4, parameters),
                 updated_at = now()
             WHERE key = $1
             RETURNING key, title, body, parameters",
        )
        .bind(key.as_ref())
        .bind(update.title)
        .bind(update.body)
        .bind(update.parameters.map(Json))
        .fetch_optional(self.database.database_pool())
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_template(&row)
    }
}

fn row_to_template(row: &PgRow) -> Result<Template, RepositoryError> {
    let key: String = row.try_get("key").map_err(map_sqlx_error)?;
    let key = TemplateKey::try_new(key).map_err(|e| corrupt_column("key", e))?;

    let parameters: Json<Vec<ParameterSpec>> =
        row.try_get("parameters").map_err(map_sqlx_error)?;

    Ok(Template {
        key,
        title: row.try_get("title").map_err(map_sqlx_error)?,
        body: row.try_get("body").map_err(map_sqlx_error)?,
        parameters: parameters.0,
    })
}
