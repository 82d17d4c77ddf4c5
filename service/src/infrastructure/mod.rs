use policyforge_common::Frameworks;
use policyforge_common::database::Database;

use crate::domain::AppState;
use crate::infrastructure::persistence::{
    PostgresApprovalRepository, PostgresAssessmentRepository, PostgresCommentRepository,
    PostgresDocumentRepository, PostgresNotificationRepository, PostgresTemplateRepository,
    PostgresUserRepository,
};

pub mod auth;
pub mod http;
pub mod persistence;
pub mod settings;

#[derive(Clone)]
pub struct AppStateImpl {
    documents: PostgresDocumentRepository,
    approvals: PostgresApprovalRepository,
    comments: PostgresCommentRepository,
    templates: PostgresTemplateRepository,
    assessments: PostgresAssessmentRepository,
    notifications: PostgresNotificationRepository,
    users: PostgresUserRepository,
    frameworks: &'static dyn Frameworks,
}

impl AppStateImpl {
    pub fn new(database: &'static Database, frameworks: &'static dyn Frameworks) -> Self {
        Self {
            documents: PostgresDocumentRepository::new(database),
            approvals: PostgresApprovalRepository::new(database),
            comments: PostgresCommentRepository::new(database),
            templates: PostgresTemplateRepository::new(database),
            assessments: PostgresAssessmentRepository::new(database),
            notifications: PostgresNotificationRepository::new(database),
            users: PostgresUserRepository::new(database),
            frameworks,
        }
    }
}

impl AppState for AppStateImpl {
    type D = PostgresDocumentRepository;
    type A = PostgresApprovalRepository;
    type C = PostgresCommentRepository;
    type T = PostgresTemplateRepository;
    type S = PostgresAssessmentRepository;
    type N = PostgresNotificationRepository;
    type U = PostgresUserRepository;

    fn documents(&self) -> &Self::D {
        &self.documents
    }

    fn approvals(&self) -> &Self::A {
        &self.approvals
    }

    fn comments(&self) -> &Self::C {
        &self.comments
    }

    fn templates(&self) -> &Self::T {
        &self.templates
    }

    fn assessments(&self) -> &Self::S {
        &self.assessments
    }

    fn notifications(&self) -> &Self::N {
        &self.notifications
    }

    fn users(&self) -> &Self::U {
        &self.users
    }

    fn frameworks(&self) -> &'static dyn Frameworks {
        self.frameworks
    }
}
