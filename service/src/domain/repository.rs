use std::future::Future;

use policyforge_common::{ControlId, FrameworkKey, ParameterSet, ParameterSpec, Template, TemplateKey};

use crate::domain::{
    Role,
    approvals::{Approval, ApprovalId, ApprovalSummary, Decision},
    assessments::{Assessment, AssessmentUpdate},
    comments::Comment,
    documents::{Document, DocumentId, DocumentStatus, Version, VersionSelector, VersionSummary},
    notifications::{Notification, NotificationKind},
    users::{User, UserId},
};

#[derive(Debug)]
pub enum RepositoryError {
    NotFound,
    ValidationFailed(String),
    Conflict(String),
    UniqueViolation(String),
    DatabaseError(String),
}

/// Stores documents together with their versions and owner links.
pub trait DocumentRepository: Send + Sync + 'static {
    /// Insert the document, its version 1, and the owner link in one
    /// transaction.
    fn create(
        &self,
        new: NewDocument,
    ) -> impl Future<Output = Result<Document, RepositoryError>> + Send;

    fn list(
        &self,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<Document>, RepositoryError>> + Send;

    fn get(
        &self,
        id: DocumentId,
    ) -> impl Future<Output = Result<Document, RepositoryError>> + Send;

    fn versions(
        &self,
        id: DocumentId,
    ) -> impl Future<Output = Result<Vec<VersionSummary>, RepositoryError>> + Send;

    /// Assigns version `max(version) + 1` inside the same transaction as the
    /// insert, so concurrent callers cannot collide.
    fn add_version(
        &self,
        id: DocumentId,
        html: String,
        params: ParameterSet,
    ) -> impl Future<Output = Result<Version, RepositoryError>> + Send;

    fn get_version(
        &self,
        id: DocumentId,
        selector: VersionSelector,
    ) -> impl Future<Output = Result<Version, RepositoryError>> + Send;

    /// Removes one version without renumbering the others.
    fn delete_version(
        &self,
        id: DocumentId,
        version: i64,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn update_metadata(
        &self,
        id: DocumentId,
        title: Option<String>,
        status: Option<DocumentStatus>,
    ) -> impl Future<Output = Result<Document, RepositoryError>> + Send;

    fn delete(
        &self,
        id: DocumentId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn owner_emails(
        &self,
        id: DocumentId,
    ) -> impl Future<Output = Result<Vec<String>, RepositoryError>> + Send;
}

pub struct NewDocument {
    pub template_key: TemplateKey,
    pub title: String,
    pub html: String,
    pub params: ParameterSet,
    pub org_id: Option<i64>,
    pub owner_email: String,
    pub owner_name: Option<String>,
    pub owner_role: Role,
}

pub trait ApprovalRepository: Send + Sync + 'static {
    fn create(
        &self,
        new: NewApproval,
    ) -> impl Future<Output = Result<Approval, RepositoryError>> + Send;

    fn list(
        &self,
        document_id: DocumentId,
    ) -> impl Future<Output = Result<Vec<Approval>, RepositoryError>> + Send;

    /// Transitions a pending approval to its terminal state. Fails with
    /// `Conflict` when the approval was already decided.
    fn decide(
        &self,
        document_id: DocumentId,
        approval_id: ApprovalId,
        decision: Decision,
        note: Option<String>,
    ) -> impl Future<Output = Result<Approval, RepositoryError>> + Send;

    fn summary(
        &self,
        document_id: DocumentId,
        latest_only: bool,
    ) -> impl Future<Output = Result<ApprovalSummary, RepositoryError>> + Send;
}

pub struct NewApproval {
    pub document_id: DocumentId,
    pub version: Option<i64>,
    pub reviewer: String,
    pub note: Option<String>,
}

pub trait CommentRepository: Send + Sync + 'static {
    fn list(
        &self,
        document_id: DocumentId,
    ) -> impl Future<Output = Result<Vec<Comment>, RepositoryError>> + Send;

    fn create(
        &self,
        new: NewComment,
    ) -> impl Future<Output = Result<Comment, RepositoryError>> + Send;
}

pub struct NewComment {
    pub document_id: DocumentId,
    pub version: Option<i64>,
    pub author: String,
    pub body: String,
}

/// Templates live in the store: seeded from the builtin defaults, editable
/// afterwards.
pub trait TemplateRepository: Send + Sync + 'static {
    fn seed(
        &self,
        templates: Vec<Template>,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn list(&self) -> impl Future<Output = Result<Vec<Template>, RepositoryError>> + Send;

    fn get(
        &self,
        key: &TemplateKey,
    ) -> impl Future<Output = Result<Option<Template>, RepositoryError>> + Send;

    fn update(
        &self,
        key: &TemplateKey,
        update: TemplateUpdate,
    ) -> impl Future<Output = Result<Template, RepositoryError>> + Send;
}

#[derive(Debug, Default)]
pub struct TemplateUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub parameters: Option<Vec<ParameterSpec>>,
}

pub trait AssessmentRepository: Send + Sync + 'static {
    fn list_for_framework(
        &self,
        org_id: i64,
        framework_key: &FrameworkKey,
    ) -> impl Future<Output = Result<Vec<Assessment>, RepositoryError>> + Send;

    /// Partial update; creates the row when absent.
    fn upsert(
        &self,
        org_id: i64,
        framework_key: &FrameworkKey,
        control_id: &ControlId,
        update: AssessmentUpdate,
    ) -> impl Future<Output = Result<Assessment, RepositoryError>> + Send;
}

pub trait NotificationRepository: Send + Sync + 'static {
    fn create(
        &self,
        new: NewNotification,
    ) -> impl Future<Output = Result<Notification, RepositoryError>> + Send;

    fn list(
        &self,
        target_email: &str,
        unread_only: bool,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<Notification>, RepositoryError>> + Send;

    fn mark_read(
        &self,
        target_email: &str,
        ids: &[i64],
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;

    fn mark_all_read(
        &self,
        target_email: &str,
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;
}

pub struct NewNotification {
    pub target_email: String,
    pub kind: NotificationKind,
    pub message: String,
    pub document_id: Option<DocumentId>,
    pub version: Option<i64>,
    pub approval_id: Option<ApprovalId>,
}

pub trait UserRepository: Send + Sync + 'static {
    fn list(&self) -> impl Future<Output = Result<Vec<User>, RepositoryError>> + Send;

    /// Fails with `UniqueViolation` on a duplicate email.
    fn create(
        &self,
        new: NewUser,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    fn update(
        &self,
        id: UserId,
        update: UserUpdate,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    /// Idempotent; deleting an absent user is not an error.
    fn delete(&self, id: UserId) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub org_id: Option<i64>,
}

#[derive(Debug, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
}
