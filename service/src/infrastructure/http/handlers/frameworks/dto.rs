use chrono::{DateTime, Utc};
use policyforge_common::{Control, Framework};
use serde::{Deserialize, Serialize};

use crate::domain::assessments::{
    Assessment, AssessmentStatus, CategoryDetail, ControlAssessment,
};

// Requests

/// Partial assessment update; absent fields keep their stored value.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertAssessmentRequest {
    pub status: Option<String>,
    pub owner_user_id: Option<i64>,
    pub notes: Option<String>,
    pub evidence_links: Option<Vec<String>>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

// Responses

/// Response for the framework list route
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkResponse {
    key: String,
    name: String,
    version: Option<String>,
    publisher: Option<String>,
    control_count: usize,
}

impl From<&'static Framework> for FrameworkResponse {
    fn from(value: &'static Framework) -> Self {
        Self {
            key: value.key.to_string(),
            name: value.name.clone(),
            version: value.version.clone(),
            publisher: value.publisher.clone(),
            control_count: value.control_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlResponse {
    id: String,
    title: String,
    description: Option<String>,
    family: Option<String>,
    category: Option<String>,
}

impl From<&Control> for ControlResponse {
    fn from(value: &Control) -> Self {
        Self {
            id: value.id.to_string(),
            title: value.title.clone(),
            description: value.description.clone(),
            family: value.family.clone(),
            category: value.category.clone(),
        }
    }
}

/// Response for one framework route, controls included (post-filtering)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkDetailResponse {
    key: String,
    name: String,
    version: Option<String>,
    publisher: Option<String>,
    description: Option<String>,
    controls: Vec<ControlResponse>,
}

impl FrameworkDetailResponse {
    pub fn new(framework: &'static Framework, controls: Vec<&Control>) -> Self {
        Self {
            key: framework.key.to_string(),
            name: framework.name.clone(),
            version: framework.version.clone(),
            publisher: framework.publisher.clone(),
            description: framework.description.clone(),
            controls: controls.into_iter().map(ControlResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResponse {
    id: i64,
    status: Option<AssessmentStatus>,
    owner_user_id: Option<i64>,
    notes: Option<String>,
    evidence_links: Vec<String>,
    last_reviewed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<Assessment> for AssessmentResponse {
    fn from(value: Assessment) -> Self {
        Self {
            id: value.id,
            status: value.status,
            owner_user_id: value.owner_user_id.map(|id| id.0),
            notes: value.notes,
            evidence_links: value.evidence_links,
            last_reviewed_at: value.last_reviewed_at,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// One row of the assessment grid: control plus the org's record, if any.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlAssessmentResponse {
    control: ControlResponse,
    assessment: Option<AssessmentResponse>,
}

impl From<ControlAssessment> for ControlAssessmentResponse {
    fn from(value: ControlAssessment) -> Self {
        Self {
            control: ControlResponse::from(value.control),
            assessment: value.assessment.map(AssessmentResponse::from),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDetailResponse {
    id: String,
    title: String,
    function: Option<String>,
    controls: Vec<ControlAssessmentResponse>,
}

impl From<CategoryDetail> for CategoryDetailResponse {
    fn from(value: CategoryDetail) -> Self {
        Self {
            id: value.id,
            title: value.title,
            function: value.function,
            controls: value
                .entries
                .into_iter()
                .map(ControlAssessmentResponse::from)
                .collect(),
        }
    }
}
