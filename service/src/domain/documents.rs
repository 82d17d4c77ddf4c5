use std::fmt;

use chrono::{DateTime, Utc};
use policyforge_common::{ParameterSet, Template, TemplateKey, render};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{
    AppState, Identity,
    repository::{DocumentRepository, NewDocument, RepositoryError, TemplateRepository},
};

/// Wrapper to prevent ID confusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub i64);

impl From<i64> for DocumentId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Document status is a plain data field: any enum value can be assigned at
/// any time, no transition rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    InReview,
    Approved,
    Published,
    Rejected,
}

impl DocumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::InReview => "in_review",
            DocumentStatus::Approved => "approved",
            DocumentStatus::Published => "published",
            DocumentStatus::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "draft" => Some(DocumentStatus::Draft),
            "in_review" => Some(DocumentStatus::InReview),
            "approved" => Some(DocumentStatus::Approved),
            "published" => Some(DocumentStatus::Published),
            "rejected" => Some(DocumentStatus::Rejected),
            _ => None,
        }
    }
}

/// A policy document with its derived latest version number.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocumentId,
    pub org_id: Option<i64>,
    pub template_key: TemplateKey,
    pub title: String,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Highest surviving version number; None once every version is deleted.
    pub latest_version: Option<i64>,
}

/// An immutable content snapshot plus the parameters that produced it.
#[derive(Debug, Clone)]
pub struct Version {
    pub id: i64,
    pub document_id: DocumentId,
    pub version: i64,
    pub html: String,
    pub params: ParameterSet,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct VersionSummary {
    pub id: i64,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

/// Version path segment: a concrete number or the literal "latest".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSelector {
    Latest,
    Number(i64),
}

impl VersionSelector {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == "latest" {
            return Some(VersionSelector::Latest);
        }
        raw.parse::<i64>().ok().map(VersionSelector::Number)
    }
}

/// Creates a document and its version 1 from a template and parameter set.
/// The creator is recorded as the document's owner.
pub async fn create_document<S: AppState>(
    state: &S,
    identity: &Identity,
    template_key: TemplateKey,
    values: serde_json::Map<String, Value>,
) -> Result<Document, RepositoryError> {
    let template = require_template(state, &template_key).await?;
    let draft = render(&template, &values)
        .map_err(|e| RepositoryError::ValidationFailed(e.to_string()))?;

    state
        .documents()
        .create(NewDocument {
            template_key: template_key.clone(),
            title: draft.title,
            html: draft.html,
            params: ParameterSet { template_key, values },
            org_id: Some(identity.org_id),
            owner_email: identity.principal_email().to_lowercase(),
            owner_name: identity.name.clone(),
            owner_role: identity.role,
        })
        .await
}

/// Renders a new trailing version for an existing document.
pub async fn add_version<S: AppState>(
    state: &S,
    document_id: DocumentId,
    template_key: TemplateKey,
    values: serde_json::Map<String, Value>,
) -> Result<Version, RepositoryError> {
    let document = state.documents().get(document_id).await?;
    if document.template_key != template_key {
        return Err(RepositoryError::ValidationFailed(
            "template_key must match the document's template".to_string(),
        ));
    }

    let template = require_template(state, &template_key).await?;
    let draft = render(&template, &values)
        .map_err(|e| RepositoryError::ValidationFailed(e.to_string()))?;

    state
        .documents()
        .add_version(document_id, draft.html, ParameterSet { template_key, values })
        .await
}

/// Duplicates `from_version`'s parameters and content as a new trailing
/// version. The source version stays untouched.
pub async fn rollback<S: AppState>(
    state: &S,
    document_id: DocumentId,
    from_version: i64,
) -> Result<Version, RepositoryError> {
    let source = state
        .documents()
        .get_version(document_id, VersionSelector::Number(from_version))
        .await?;

    state
        .documents()
        .add_version(document_id, source.html, source.params)
        .await
}

async fn require_template<S: AppState>(
    state: &S,
    key: &TemplateKey,
) -> Result<Template, RepositoryError> {
    state
        .templates()
        .get(key)
        .await?
        .ok_or_else(|| RepositoryError::ValidationFailed(format!("unknown template_key '{}'", key)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::testing::{TestState, access_params, alice};

    #[tokio::test]
    async fn create_document_starts_at_version_one() {
        let state = TestState::new();
        let identity = alice();

        let document = create_document(
            &state,
            &identity,
            TemplateKey::try_new("access_control_policy").unwrap(),
            access_params(14),
        )
        .await
        .unwrap();

        assert_eq!(document.latest_version, Some(1));
        assert_eq!(document.status, DocumentStatus::Draft);
        assert_eq!(document.title, "Access Control Policy");

        let version = state
            .documents()
            .get_version(document.id, VersionSelector::Latest)
            .await
            .unwrap();
        assert_eq!(version.version, 1);
        assert!(version.html.contains("Acme"));
    }

    #[tokio::test]
    async fn unknown_template_key_is_rejected() {
        let state = TestState::new();

        let err = create_document(
            &state,
            &alice(),
            TemplateKey::try_new("no_such_template").unwrap(),
            access_params(14),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RepositoryError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn new_versions_are_contiguous_and_leave_old_content_alone() {
        let state = TestState::new();
        let identity = alice();
        let key = TemplateKey::try_new("access_control_policy").unwrap();

        let document = create_document(&state, &identity, key.clone(), access_params(14))
            .await
            .unwrap();

        let second = add_version(&state, document.id, key.clone(), access_params(16))
            .await
            .unwrap();
        assert_eq!(second.version, 2);

        let refreshed = DocumentRepository::get(state.documents(), document.id)
            .await
            .unwrap();
        assert_eq!(refreshed.latest_version, Some(2));

        let first = state
            .documents()
            .get_version(document.id, VersionSelector::Number(1))
            .await
            .unwrap();
        assert!(first.html.contains("14 characters"));
        assert_eq!(first.params.values["password_min_length"], json!(14));

        let numbers: Vec<i64> = state
            .documents()
            .versions(document.id)
            .await
            .unwrap()
            .iter()
            .map(|v| v.version)
            .collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[tokio::test]
    async fn mismatched_template_key_is_rejected() {
        let state = TestState::new();
        let identity = alice();

        let document = create_document(
            &state,
            &identity,
            TemplateKey::try_new("access_control_policy").unwrap(),
            access_params(14),
        )
        .await
        .unwrap();

        let err = add_version(
            &state,
            document.id,
            TemplateKey::try_new("data_retention_policy").unwrap(),
            access_params(14),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn rollback_copies_params_and_html() {
        let state = TestState::new();
        let identity = alice();
        let key = TemplateKey::try_new("access_control_policy").unwrap();

        let document = create_document(&state, &identity, key.clone(), access_params(14))
            .await
            .unwrap();
        add_version(&state, document.id, key.clone(), access_params(16))
            .await
            .unwrap();

        let restored = rollback(&state, document.id, 1).await.unwrap();
        assert_eq!(restored.version, 3);

        let first = state
            .documents()
            .get_version(document.id, VersionSelector::Number(1))
            .await
            .unwrap();
        assert_eq!(restored.html, first.html);
        assert_eq!(restored.params.values, first.params.values);

        let refreshed = DocumentRepository::get(state.documents(), document.id)
            .await
            .unwrap();
        assert_eq!(refreshed.latest_version, Some(3));
    }

    #[tokio::test]
    async fn rollback_from_missing_version_is_not_found() {
        let state = TestState::new();
        let identity = alice();
        let key = TemplateKey::try_new("access_control_policy").unwrap();

        let document = create_document(&state, &identity, key, access_params(14))
            .await
            .unwrap();

        let err = rollback(&state, document.id, 7).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn deleting_latest_version_recomputes_latest() {
        let state = TestState::new();
        let identity = alice();
        let key = TemplateKey::try_new("access_control_policy").unwrap();

        let document = create_document(&state, &identity, key.clone(), access_params(14))
            .await
            .unwrap();
        add_version(&state, document.id, key.clone(), access_params(16))
            .await
            .unwrap();
        add_version(&state, document.id, key.clone(), access_params(18))
            .await
            .unwrap();

        state.documents().delete_version(document.id, 3).await.unwrap();
        let refreshed = DocumentRepository::get(state.documents(), document.id)
            .await
            .unwrap();
        assert_eq!(refreshed.latest_version, Some(2));

        // deleting in the middle does not renumber the rest
        state.documents().delete_version(document.id, 1).await.unwrap();
        let numbers: Vec<i64> = state
            .documents()
            .versions(document.id)
            .await
            .unwrap()
            .iter()
            .map(|v| v.version)
            .collect();
        assert_eq!(numbers, vec![2]);

        state.documents().delete_version(document.id, 2).await.unwrap();
        let refreshed = DocumentRepository::get(state.documents(), document.id)
            .await
            .unwrap();
        assert_eq!(refreshed.latest_version, None);

        // numbering never restarts: the next version continues after the
        // highest number ever assigned
        let next = add_version(&state, document.id, key, access_params(20))
            .await
            .unwrap();
        assert_eq!(next.version, 4);
    }

    #[tokio::test]
    async fn metadata_update_accepts_any_status_value() {
        let state = TestState::new();
        let identity = alice();

        let document = create_document(
            &state,
            &identity,
            TemplateKey::try_new("access_control_policy").unwrap(),
            access_params(14),
        )
        .await
        .unwrap();

        let updated = state
            .documents()
            .update_metadata(document.id, Some("Renamed".to_string()), Some(DocumentStatus::Published))
            .await
            .unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.status, DocumentStatus::Published);
    }

    #[test]
    fn version_selector_parses_latest_and_numbers() {
        assert_eq!(VersionSelector::parse("latest"), Some(VersionSelector::Latest));
        assert_eq!(VersionSelector::parse("3"), Some(VersionSelector::Number(3)));
        assert_eq!(VersionSelector::parse("newest"), None);
    }
}
