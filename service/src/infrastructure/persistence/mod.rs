use crate::domain::repository::RepositoryError;

pub mod approvals;
pub mod assessments;
pub mod comments;
pub mod documents;
pub mod notifications;
pub mod templates;
pub mod users;

pub use approvals::PostgresApprovalRepository;
pub use assessments::PostgresAssessmentRepository;
pub use comments::PostgresCommentRepository;
pub use documents::PostgresDocumentRepository;
pub use notifications::PostgresNotificationRepository;
pub use templates::PostgresTemplateRepository;
pub use users::PostgresUserRepository;

const UNIQUE_VIOLATION: &str = "23505";

pub(crate) fn map_sqlx_error(e: sqlx::Error) -> RepositoryError {
    match &e {
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            RepositoryError::UniqueViolation(db.message().to_string())
        }
        _ => RepositoryError::DatabaseError(e.to_string()),
    }
}

pub(crate) fn corrupt_column(column: &str, detail: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::DatabaseError(format!("failed to decode column {}: {}", column, detail))
}
