//! In-memory repositories backing the domain tests.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use policyforge_common::{
    Control, ControlId, Framework, FrameworkKey, Frameworks, ParameterSet, Template, TemplateKey,
    builtin_templates, test_utils::make_framework,
};
use serde_json::json;

use crate::domain::{
    AppState, Identity, Role,
    approvals::{Approval, ApprovalId, ApprovalStatus, ApprovalSummary, Decision},
    assessments::{Assessment, AssessmentUpdate},
    comments::Comment,
    documents::{Document, DocumentId, DocumentStatus, Version, VersionSelector, VersionSummary},
    notifications::Notification,
    repository::{
        ApprovalRepository, AssessmentRepository, CommentRepository, DocumentRepository,
        NewApproval, NewComment, NewDocument, NewNotification, NewUser, NotificationRepository,
        RepositoryError, TemplateRepository, TemplateUpdate, UserRepository, UserUpdate,
    },
    users::{User, UserId},
};

pub fn alice() -> Identity {
    Identity {
        subject: "alice".to_string(),
        email: Some("alice@acme.test".to_string()),
        name: Some("Alice".to_string()),
        role: Role::Owner,
        org_id: 1,
    }
}

/// Access-control parameter set shared by the lifecycle tests, with a
/// configurable password length so successive versions differ.
pub fn access_params(password_min_length: i64) -> serde_json::Map<String, serde_json::Value> {
    json!({
        "org_name": "Acme",
        "password_min_length": password_min_length,
        "mfa_required_roles": ["Admin"],
        "log_retention_days": 90,
    })
    .as_object()
    .unwrap()
    .clone()
}

#[derive(Default)]
struct Store {
    next_id: i64,
    templates: Vec<Template>,
    documents: Vec<DocumentRow>,
    versions: Vec<Version>,
    approvals: Vec<Approval>,
    comments: Vec<Comment>,
    notifications: Vec<Notification>,
    users: Vec<User>,
    owners: Vec<(DocumentId, UserId)>,
    assessments: Vec<Assessment>,
}

struct DocumentRow {
    document: Document,
    last_version: i64,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn latest_version(&self, id: DocumentId) -> Option<i64> {
        self.versions
            .iter()
            .filter(|v| v.document_id == id)
            .map(|v| v.version)
            .max()
    }

    fn document(&self, id: DocumentId) -> Result<Document, RepositoryError> {
        let row = self
            .documents
            .iter()
            .find(|row| row.document.id == id)
            .ok_or(RepositoryError::NotFound)?;
        let mut document = row.document.clone();
        document.latest_version = self.latest_version(id);
        Ok(document)
    }

    fn upsert_user(&mut self, email: &str, name: Option<String>, role: Role) -> UserId {
        if let Some(user) = self.users.iter().find(|u| u.email == email) {
            return user.id;
        }
        let id = UserId(self.next_id());
        self.users.push(User {
            id,
            email: email.to_string(),
            name,
            org_id: Some(1),
            role,
            created_at: Utc::now(),
        });
        id
    }
}

#[derive(Clone)]
pub struct TestState {
    repos: TestRepos,
    frameworks: &'static dyn Frameworks,
}

impl TestState {
    pub fn new() -> Self {
        let mut store = Store::default();
        store.templates = builtin_templates();

        Self {
            repos: TestRepos { store: Arc::new(Mutex::new(store)) },
            frameworks: test_frameworks(),
        }
    }
}

fn test_frameworks() -> &'static dyn Frameworks {
    let cis = make_framework(
        "cis_v8",
        "CIS Critical Security Controls v8",
        &[
            ("CIS-01", "Inventory and Control of Enterprise Assets"),
            ("CIS-02", "Inventory and Control of Software Assets"),
        ],
    );

    let nist = Framework::new(
        FrameworkKey::try_new("nist_csf_2_0").unwrap(),
        "NIST Cybersecurity Framework (CSF)".to_string(),
        Some("2.0".to_string()),
        Some("NIST".to_string()),
        None,
        vec![
            csf_control("GV.OC-01", "GOVERN", "Organizational Context"),
            csf_control("GV.OC-02", "GOVERN", "Organizational Context"),
            csf_control("GV.RM-01", "GOVERN", "Risk Management Strategy"),
        ],
    );
    let nist: &'static Framework = Box::leak(Box::new(nist));

    policyforge_common::test_utils::make_registry(vec![cis, nist])
}

fn csf_control(id: &str, family: &str, category: &str) -> Control {
    Control {
        id: ControlId::try_new(id).unwrap(),
        title: id.to_string(),
        description: None,
        family: Some(family.to_string()),
        category: Some(category.to_string()),
    }
}

impl AppState for TestState {
    type D = TestRepos;
    type A = TestRepos;
    type C = TestRepos;
    type T = TestRepos;
    type S = TestRepos;
    type N = TestRepos;
    type U = TestRepos;

    fn documents(&self) -> &TestRepos {
        &self.repos
    }
    fn approvals(&self) -> &TestRepos {
        &self.repos
    }
    fn comments(&self) -> &TestRepos {
        &self.repos
    }
    fn templates(&self) -> &TestRepos {
        &self.repos
    }
    fn assessments(&self) -> &TestRepos {
        &self.repos
    }
    fn notifications(&self) -> &TestRepos {
        &self.repos
    }
    fn users(&self) -> &TestRepos {
        &self.repos
    }
    fn frameworks(&self) -> &'static dyn Frameworks {
        self.frameworks
    }
}

/// One struct implements every repository trait over the shared store.
#[derive(Clone)]
pub struct TestRepos {
    store: Arc<Mutex<Store>>,
}

impl DocumentRepository for TestRepos {
    async fn create(&self, new: NewDocument) -> Result<Document, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let now = Utc::now();

        let owner_id = store.upsert_user(&new.owner_email, new.owner_name.clone(), new.owner_role);

        let id = DocumentId(store.next_id());
        store.documents.push(DocumentRow {
            document: Document {
                id,
                org_id: new.org_id,
                template_key: new.template_key.clone(),
                title: new.title,
                status: DocumentStatus::Draft,
                created_at: now,
                updated_at: now,
                latest_version: None,
            },
            last_version: 1,
        });
        store.owners.push((id, owner_id));

        let version_id = store.next_id();
        store.versions.push(Version {
            id: version_id,
            document_id: id,
            version: 1,
            html: new.html,
            params: new.params,
            created_at: now,
        });

        store.document(id)
    }

    async fn list(&self, limit: i64) -> Result<Vec<Document>, RepositoryError> {
        let store = self.store.lock().unwrap();
        let mut documents: Vec<Document> = store
            .documents
            .iter()
            .map(|row| {
                let mut document = row.document.clone();
                document.latest_version = store.latest_version(document.id);
                document
            })
            .collect();
        documents.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        documents.truncate(limit as usize);
        Ok(documents)
    }

    async fn get(&self, id: DocumentId) -> Result<Document, RepositoryError> {
        self.store.lock().unwrap().document(id)
    }

    async fn versions(&self, id: DocumentId) -> Result<Vec<VersionSummary>, RepositoryError> {
        let store = self.store.lock().unwrap();
        store.document(id)?;
        let mut summaries: Vec<VersionSummary> = store
            .versions
            .iter()
            .filter(|v| v.document_id == id)
            .map(|v| VersionSummary { id: v.id, version: v.version, created_at: v.created_at })
            .collect();
        summaries.sort_by_key(|v| v.version);
        Ok(summaries)
    }

    async fn add_version(
        &self,
        id: DocumentId,
        html: String,
        params: ParameterSet,
    ) -> Result<Version, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let version_id = store.next_id();
        let now = Utc::now();

        let row = store
            .documents
            .iter_mut()
            .find(|row| row.document.id == id)
            .ok_or(RepositoryError::NotFound)?;
        row.last_version += 1;
        row.document.updated_at = now;
        let number = row.last_version;

        let version = Version {
            id: version_id,
            document_id: id,
            version: number,
            html,
            params,
            created_at: now,
        };
        store.versions.push(version.clone());
        Ok(version)
    }

    async fn get_version(
        &self,
        id: DocumentId,
        selector: VersionSelector,
    ) -> Result<Version, RepositoryError> {
        let store = self.store.lock().unwrap();
        let mut versions: Vec<&Version> =
            store.versions.iter().filter(|v| v.document_id == id).collect();
        versions.sort_by_key(|v| v.version);

        let found = match selector {
            VersionSelector::Latest => versions.last().copied(),
            VersionSelector::Number(number) => {
                versions.iter().find(|v| v.version == number).copied()
            }
        };
        found.cloned().ok_or(RepositoryError::NotFound)
    }

    async fn delete_version(&self, id: DocumentId, version: i64) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let before = store.versions.len();
        store
            .versions
            .retain(|v| !(v.document_id == id && v.version == version));
        if store.versions.len() == before {
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
        let mut store = self.store.lock().unwrap();
        let row = store
            .documents
            .iter_mut()
            .find(|row| row.document.id == id)
            .ok_or(RepositoryError::NotFound)?;
        if let Some(title) = title {
            row.document.title = title;
        }
        if let Some(status) = status {
            row.document.status = status;
        }
        row.document.updated_at = Utc::now();
        store.document(id)
    }

    async fn delete(&self, id: DocumentId) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let before = store.documents.len();
        store.documents.retain(|row| row.document.id != id);
        if store.documents.len() == before {
            return Err(RepositoryError::NotFound);
        }
        store.versions.retain(|v| v.document_id != id);
        store.approvals.retain(|a| a.document_id != id);
        store.comments.retain(|c| c.document_id != id);
        store.owners.retain(|(document_id, _)| *document_id != id);
        Ok(())
    }

    async fn owner_emails(&self, id: DocumentId) -> Result<Vec<String>, RepositoryError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .owners
            .iter()
            .filter(|(document_id, _)| *document_id == id)
            .filter_map(|(_, user_id)| {
                store.users.iter().find(|u| u.id == *user_id).map(|u| u.email.clone())
            })
            .collect())
    }
}

impl ApprovalRepository for TestRepos {
    async fn create(&self, new: NewApproval) -> Result<Approval, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let approval = Approval {
            id: ApprovalId(store.next_id()),
            document_id: new.document_id,
            version: new.version,
            reviewer: new.reviewer,
            status: ApprovalStatus::Pending,
            note: new.note,
            requested_at: Utc::now(),
            decided_at: None,
        };
        store.approvals.push(approval.clone());
        Ok(approval)
    }

    async fn list(&self, document_id: DocumentId) -> Result<Vec<Approval>, RepositoryError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .approvals
            .iter()
            .filter(|a| a.document_id == document_id)
            .cloned()
            .collect())
    }

    async fn decide(
        &self,
        document_id: DocumentId,
        approval_id: ApprovalId,
        decision: Decision,
        note: Option<String>,
    ) -> Result<Approval, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let approval = store
            .approvals
            .iter_mut()
            .find(|a| a.id == approval_id && a.document_id == document_id)
            .ok_or(RepositoryError::NotFound)?;

        if approval.status != ApprovalStatus::Pending {
            return Err(RepositoryError::Conflict(format!(
                "approval already {}",
                approval.status.as_str()
            )));
        }

        approval.status = decision.as_status();
        if note.is_some() {
            approval.note = note;
        }
        approval.decided_at = Some(Utc::now());
        Ok(approval.clone())
    }

    async fn summary(
        &self,
        document_id: DocumentId,
        latest_only: bool,
    ) -> Result<ApprovalSummary, RepositoryError> {
        let store = self.store.lock().unwrap();
        let latest = store.latest_version(document_id);

        let mut summary = ApprovalSummary::default();
        for approval in store.approvals.iter().filter(|a| a.document_id == document_id) {
            if latest_only && !(approval.version.is_none() || approval.version == latest) {
                continue;
            }
            match approval.status {
                ApprovalStatus::Pending => summary.pending += 1,
                ApprovalStatus::Approved => summary.approved += 1,
                ApprovalStatus::Rejected => summary.rejected += 1,
            }
        }
        Ok(summary)
    }
}

impl CommentRepository for TestRepos {
    async fn list(&self, document_id: DocumentId) -> Result<Vec<Comment>, RepositoryError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .comments
            .iter()
            .filter(|c| c.document_id == document_id)
            .cloned()
            .collect())
    }

    async fn create(&self, new: NewComment) -> Result<Comment, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let comment = Comment {
            id: store.next_id(),
            document_id: new.document_id,
            version: new.version,
            author: new.author,
            body: new.body,
            created_at: Utc::now(),
        };
        store.comments.push(comment.clone());
        Ok(comment)
    }
}

impl TemplateRepository for TestRepos {
    async fn seed(&self, templates: Vec<Template>) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().unwrap();
        for template in templates {
            if !store.templates.iter().any(|t| t.key == template.key) {
                store.templates.push(template);
            }
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Template>, RepositoryError> {
        Ok(self.store.lock().unwrap().templates.clone())
    }

    async fn get(&self, key: &TemplateKey) -> Result<Option<Template>, RepositoryError> {
        let store = self.store.lock().unwrap();
        Ok(store.templates.iter().find(|t| &t.key == key).cloned())
    }

    async fn update(
        &self,
        key: &TemplateKey,
        update: TemplateUpdate,
    ) -> Result<Template, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let template = store
            .templates
            .iter_mut()
            .find(|t| &t.key == key)
            .ok_or(RepositoryError::NotFound)?;
        if let Some(title) = update.title {
            template.title = title;
        }
        if let Some(body) = update.body {
            template.body = body;
        }
        if let Some(parameters) = update.parameters {
            template.parameters = parameters;
        }
        Ok(template.clone())
    }
}

impl AssessmentRepository for TestRepos {
    async fn list_for_framework(
        &self,
        org_id: i64,
        framework_key: &FrameworkKey,
    ) -> Result<Vec<Assessment>, RepositoryError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .assessments
            .iter()
            .filter(|a| a.org_id == org_id && &a.framework_key == framework_key)
            .cloned()
            .collect())
    }

    async fn upsert(
        &self,
        org_id: i64,
        framework_key: &FrameworkKey,
        control_id: &ControlId,
        update: AssessmentUpdate,
    ) -> Result<Assessment, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let now = Utc::now();

        let existing = store.assessments.iter_mut().find(|a| {
            a.org_id == org_id && &a.framework_key == framework_key && &a.control_id == control_id
        });

        let assessment = match existing {
            Some(assessment) => {
                if update.status.is_some() {
                    assessment.status = update.status;
                }
                if update.owner_user_id.is_some() {
                    assessment.owner_user_id = update.owner_user_id.map(UserId);
                }
                if update.notes.is_some() {
                    assessment.notes = update.notes;
                }
                if let Some(links) = update.evidence_links {
                    assessment.evidence_links = links;
                }
                if update.last_reviewed_at.is_some() {
                    assessment.last_reviewed_at = update.last_reviewed_at;
                }
                assessment.updated_at = now;
                assessment.clone()
            }
            None => {
                let assessment = Assessment {
                    id: store.next_id(),
                    org_id,
                    framework_key: framework_key.clone(),
                    control_id: control_id.clone(),
                    status: update.status,
                    owner_user_id: update.owner_user_id.map(UserId),
                    notes: update.notes,
                    evidence_links: update.evidence_links.unwrap_or_default(),
                    last_reviewed_at: update.last_reviewed_at,
                    created_at: now,
                    updated_at: now,
                };
                store.assessments.push(assessment.clone());
                assessment
            }
        };
        Ok(assessment)
    }
}

impl NotificationRepository for TestRepos {
    async fn create(&self, new: NewNotification) -> Result<Notification, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let notification = Notification {
            id: store.next_id(),
            target_email: new.target_email,
            kind: new.kind,
            message: new.message,
            document_id: new.document_id,
            version: new.version,
            approval_id: new.approval_id,
            created_at: Utc::now(),
            read_at: None,
        };
        store.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn list(
        &self,
        target_email: &str,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let store = self.store.lock().unwrap();
        let mut rows: Vec<Notification> = store
            .notifications
            .iter()
            .filter(|n| n.target_email == target_email)
            .filter(|n| !unread_only || n.is_unread())
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn mark_read(&self, target_email: &str, ids: &[i64]) -> Result<u64, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let now = Utc::now();
        let mut updated = 0;
        for notification in store.notifications.iter_mut() {
            if notification.target_email == target_email
                && notification.is_unread()
                && ids.contains(&notification.id)
            {
                notification.read_at = Some(now);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn mark_all_read(&self, target_email: &str) -> Result<u64, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let now = Utc::now();
        let mut updated = 0;
        for notification in store.notifications.iter_mut() {
            if notification.target_email == target_email && notification.is_unread() {
                notification.read_at = Some(now);
                updated += 1;
            }
        }
        Ok(updated)
    }
}

impl UserRepository for TestRepos {
    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let store = self.store.lock().unwrap();
        let mut users = store.users.clone();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn create(&self, new: NewUser) -> Result<User, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        if store.users.iter().any(|u| u.email == new.email) {
            return Err(RepositoryError::UniqueViolation(format!(
                "email {} already exists",
                new.email
            )));
        }
        let user = User {
            id: UserId(store.next_id()),
            email: new.email,
            name: new.name,
            org_id: new.org_id,
            role: new.role,
            created_at: Utc::now(),
        };
        store.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: UserId, update: UserUpdate) -> Result<User, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let user = store
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepositoryError::NotFound)?;
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(name) = update.name {
            user.name = Some(name);
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        Ok(user.clone())
    }

    async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().unwrap();
        store.users.retain(|u| u.id != id);
        store.owners.retain(|(_, user_id)| *user_id != id);
        Ok(())
    }
}
