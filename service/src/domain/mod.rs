use policyforge_common::Frameworks;
use serde::{Deserialize, Serialize};

use crate::domain::repository::{
    ApprovalRepository, AssessmentRepository, CommentRepository, DocumentRepository,
    NotificationRepository, TemplateRepository, UserRepository,
};

pub mod approvals;
pub mod assessments;
pub mod comments;
pub mod documents;
pub mod notifications;
pub mod repository;
pub mod users;

#[cfg(test)]
pub mod testing;

/// Request-scoped identity decoded from the bearer token. Core operations
/// receive it explicitly; there is no ambient current-user state.
#[derive(Debug, Clone)]
pub struct Identity {
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Role,
    pub org_id: i64,
}

impl Identity {
    /// Address used for ownership and notification targeting.
    pub fn principal_email(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.subject)
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .unwrap_or_else(|| self.principal_email())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Editor,
    Viewer,
    Approver,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
            Role::Approver => "approver",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "owner" => Some(Role::Owner),
            "admin" => Some(Role::Admin),
            "editor" => Some(Role::Editor),
            "viewer" => Some(Role::Viewer),
            "approver" => Some(Role::Approver),
            _ => None,
        }
    }

    pub fn can_edit_documents(self) -> bool {
        matches!(self, Role::Owner | Role::Admin | Role::Editor)
    }

    pub fn can_decide_approvals(self) -> bool {
        matches!(self, Role::Owner | Role::Admin | Role::Approver)
    }

    pub fn can_manage_users(self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }
}

/// The global application state shared between all request handlers.
pub trait AppState: Clone + Send + Sync + 'static {
    type D: DocumentRepository;
    type A: ApprovalRepository;
    type C: CommentRepository;
    type T: TemplateRepository;
    type S: AssessmentRepository;
    type N: NotificationRepository;
    type U: UserRepository;

    fn documents(&self) -> &Self::D;
    fn approvals(&self) -> &Self::A;
    fn comments(&self) -> &Self::C;
    fn templates(&self) -> &Self::T;
    fn assessments(&self) -> &Self::S;
    fn notifications(&self) -> &Self::N;
    fn users(&self) -> &Self::U;
    fn frameworks(&self) -> &'static dyn Frameworks;
}
