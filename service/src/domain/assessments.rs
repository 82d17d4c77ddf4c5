use chrono::{DateTime, Utc};
use policyforge_common::{Control, ControlId, Framework, FrameworkKey};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AppState, Identity,
    repository::{AssessmentRepository, RepositoryError},
    users::UserId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    NotApplicable,
    Planned,
    InProgress,
    Implemented,
}

impl AssessmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AssessmentStatus::NotApplicable => "not_applicable",
            AssessmentStatus::Planned => "planned",
            AssessmentStatus::InProgress => "in_progress",
            AssessmentStatus::Implemented => "implemented",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "not_applicable" => Some(AssessmentStatus::NotApplicable),
            "planned" => Some(AssessmentStatus::Planned),
            "in_progress" => Some(AssessmentStatus::InProgress),
            "implemented" => Some(AssessmentStatus::Implemented),
            _ => None,
        }
    }
}

/// The organization's recorded stance on one framework control.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub id: i64,
    pub org_id: i64,
    pub framework_key: FrameworkKey,
    pub control_id: ControlId,
    pub status: Option<AssessmentStatus>,
    pub owner_user_id: Option<UserId>,
    pub notes: Option<String>,
    pub evidence_links: Vec<String>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default)]
pub struct AssessmentUpdate {
    pub status: Option<AssessmentStatus>,
    pub owner_user_id: Option<i64>,
    pub notes: Option<String>,
    pub evidence_links: Option<Vec<String>>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

/// One row of the assessment grid: a static control joined with the
/// organization's record, if any.
#[derive(Debug, Clone)]
pub struct ControlAssessment {
    pub control: &'static Control,
    pub assessment: Option<Assessment>,
}

/// A parent category with its implemented/total coverage counts.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub id: String,
    pub title: String,
    pub function: Option<String>,
    pub implemented: usize,
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct CategoryDetail {
    pub id: String,
    pub title: String,
    pub function: Option<String>,
    pub entries: Vec<ControlAssessment>,
}

fn require_framework<S: AppState>(
    state: &S,
    key: &FrameworkKey,
) -> Result<&'static Framework, RepositoryError> {
    state.frameworks().get(key).ok_or(RepositoryError::NotFound)
}

/// Left join of the framework's static controls with the org's rows.
pub async fn assessments_for_framework<S: AppState>(
    state: &S,
    identity: &Identity,
    key: &FrameworkKey,
) -> Result<Vec<ControlAssessment>, RepositoryError> {
    let framework = require_framework(state, key)?;
    let mut rows = state
        .assessments()
        .list_for_framework(identity.org_id, key)
        .await?;

    Ok(framework
        .controls
        .iter()
        .map(|control| {
            let assessment = rows
                .iter()
                .position(|row| row.control_id == control.id)
                .map(|position| rows.swap_remove(position));
            ControlAssessment { control, assessment }
        })
        .collect())
}

/// Creates or partially updates the org's record for one control. The control
/// must belong to the framework's static set; nothing is written otherwise.
pub async fn upsert_assessment<S: AppState>(
    state: &S,
    identity: &Identity,
    key: &FrameworkKey,
    control_id: &ControlId,
    update: AssessmentUpdate,
) -> Result<Assessment, RepositoryError> {
    let framework = require_framework(state, key)?;
    if !framework.has_control(control_id) {
        return Err(RepositoryError::ValidationFailed(format!(
            "control '{}' is not part of framework '{}'",
            control_id, key
        )));
    }

    state
        .assessments()
        .upsert(identity.org_id, key, control_id, update)
        .await
}

/// Category coverage for frameworks whose controls are subcategories
/// (NIST CSF 2.0). Other frameworks have no categories to offer.
pub async fn category_summaries<S: AppState>(
    state: &S,
    identity: &Identity,
    key: &FrameworkKey,
) -> Result<Vec<CategorySummary>, RepositoryError> {
    let framework = require_framework(state, key)?;
    if !framework.has_category_data() {
        return Err(RepositoryError::NotFound);
    }

    let entries = assessments_for_framework(state, identity, key).await?;

    Ok(framework
        .categories()
        .into_iter()
        .map(|category| {
            let implemented = category
                .controls
                .iter()
                .filter(|control| {
                    entries.iter().any(|entry| {
                        entry.control.id == control.id
                            && entry
                                .assessment
                                .as_ref()
                                .is_some_and(|a| a.status == Some(AssessmentStatus::Implemented))
                    })
                })
                .count();
            CategorySummary {
                id: category.id,
                title: category.title,
                function: category.function,
                implemented,
                total: category.controls.len(),
            }
        })
        .collect())
}

/// The category's controls joined with their assessments.
pub async fn category_detail<S: AppState>(
    state: &S,
    identity: &Identity,
    key: &FrameworkKey,
    category_id: &str,
) -> Result<CategoryDetail, RepositoryError> {
    let framework = require_framework(state, key)?;
    let category = framework
        .category(category_id)
        .ok_or(RepositoryError::NotFound)?;

    let mut entries = assessments_for_framework(state, identity, key).await?;
    entries.retain(|entry| category.controls.iter().any(|c| c.id == entry.control.id));

    Ok(CategoryDetail {
        id: category.id,
        title: category.title,
        function: category.function,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testing::{TestState, alice};

    fn nist_key() -> FrameworkKey {
        FrameworkKey::try_new("nist_csf_2_0").unwrap()
    }

    fn cis_key() -> FrameworkKey {
        FrameworkKey::try_new("cis_v8").unwrap()
    }

    #[tokio::test]
    async fn assessments_left_join_static_controls() {
        let state = TestState::new();
        let identity = alice();
        let key = cis_key();

        let control = ControlId::try_new("CIS-01").unwrap();
        upsert_assessment(
            &state,
            &identity,
            &key,
            &control,
            AssessmentUpdate {
                status: Some(AssessmentStatus::InProgress),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let entries = assessments_for_framework(&state, &identity, &key).await.unwrap();
        assert_eq!(entries.len(), 2);
        let first = entries.iter().find(|e| e.control.id == control).unwrap();
        assert_eq!(
            first.assessment.as_ref().unwrap().status,
            Some(AssessmentStatus::InProgress)
        );
        assert!(entries.iter().any(|e| e.assessment.is_none()));
    }

    #[tokio::test]
    async fn unknown_control_creates_no_row() {
        let state = TestState::new();
        let identity = alice();
        let key = cis_key();

        let err = upsert_assessment(
            &state,
            &identity,
            &key,
            &ControlId::try_new("CIS-99").unwrap(),
            AssessmentUpdate {
                status: Some(AssessmentStatus::Implemented),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationFailed(_)));

        let entries = assessments_for_framework(&state, &identity, &key).await.unwrap();
        assert!(entries.iter().all(|e| e.assessment.is_none()));
    }

    #[tokio::test]
    async fn upsert_is_partial() {
        let state = TestState::new();
        let identity = alice();
        let key = cis_key();
        let control = ControlId::try_new("CIS-01").unwrap();

        upsert_assessment(
            &state,
            &identity,
            &key,
            &control,
            AssessmentUpdate {
                status: Some(AssessmentStatus::Planned),
                notes: Some("kickoff scheduled".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let updated = upsert_assessment(
            &state,
            &identity,
            &key,
            &control,
            AssessmentUpdate {
                status: Some(AssessmentStatus::Implemented),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.status, Some(AssessmentStatus::Implemented));
        assert_eq!(updated.notes.as_deref(), Some("kickoff scheduled"));
    }

    #[tokio::test]
    async fn category_summaries_count_implemented() {
        let state = TestState::new();
        let identity = alice();
        let key = nist_key();

        upsert_assessment(
            &state,
            &identity,
            &key,
            &ControlId::try_new("GV.OC-01").unwrap(),
            AssessmentUpdate {
                status: Some(AssessmentStatus::Implemented),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let summaries = category_summaries(&state, &identity, &key).await.unwrap();
        let gv_oc = summaries.iter().find(|c| c.id == "GV.OC").unwrap();
        assert_eq!(gv_oc.implemented, 1);
        assert_eq!(gv_oc.total, 2);

        let detail = category_detail(&state, &identity, &key, "GV.OC").await.unwrap();
        assert_eq!(detail.entries.len(), 2);

        // the drawer only exists for frameworks with category metadata
        let err = category_summaries(&state, &identity, &cis_key()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }
}
