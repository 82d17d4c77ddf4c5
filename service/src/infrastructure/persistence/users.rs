use policyforge_common::database::Database;
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::domain::{
    Role,
    repository::{NewUser, RepositoryError, UserRepository, UserUpdate},
    users::{User, UserId},
};
use crate::infrastructure::persistence::{corrupt_column, map_sqlx_error};

const USER_COLUMNS: &str = "id, email, name, org_id, role, created_at";

#[derive(Clone)]
pub struct PostgresUserRepository {
    database: &'static Database,
}

impl PostgresUserRepository {
    pub fn new(database: &'static Database) -> Self {
        Self { database }
    }
}

impl UserRepository for PostgresUserRepository {
    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let sql = format!("SELECT {} FROM policy_users ORDER BY email ASC", USER_COLUMNS);
        let rows = sqlx::query(&sql)
            .fetch_all(self.database.database_pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(row_to_user).collect()
    }

    async fn create(&self, new: NewUser) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO policy_users (email, name, org_id, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(&new.email)
            .bind(&new.name)
            .bind(new.org_id)
            .bind(new.role.as_str())
            .fetch_one(self.database.database_pool())
            .await
            .map_err(map_sqlx_error)?;

        row_to_user(&row)
    }

    async fn update(&self, id: UserId, update: UserUpdate) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE policy_users
             SET email = COALESCE($2, email),
                 name = COALESCE($3, name),
                 role = COALESCE($4, role)
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id.0)
            .bind(update.email)
            .bind(update.name)
            .bind(update.role.map(Role::as_str))
            .fetch_optional(self.database.database_pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_user(&row)
    }

    async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM policy_users WHERE id = $1")
            .bind(id.0)
            .execute(self.database.database_pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

fn row_to_user(row: &PgRow) -> Result<User, RepositoryError> {
    let role: String = row.try_get("role").map_err(map_sqlx_error)?;
    let role = Role::parse(&role)
        .ok_or_else(|| corrupt_column("role", format!("unexpected value '{}'", role)))?;

    Ok(User {
        id: UserId(row.try_get("id").map_err(map_sqlx_error)?),
        email: row.try_get("email").map_err(map_sqlx_error)?,
        name: row.try_get("name").map_err(map_sqlx_error)?,
        org_id: row.try_get("org_id").map_err(map_sqlx_error)?,
        role,
        created_at: row.try_get("created_at").map_err(map_sqlx_error)?,
    })
}
