use policyforge_common::{ParameterSpec, RenderedDraft, Template};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Requests

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTemplateRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub parameters: Option<Vec<ParameterSpec>>,
}

/// Values for an unsaved draft preview; the template comes from the path.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftPreviewRequest {
    #[serde(default)]
    pub params: serde_json::Map<String, Value>,
}

// Responses

/// Response for the template list route
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResponse {
    key: String,
    title: String,
}

impl From<&Template> for TemplateResponse {
    fn from(value: &Template) -> Self {
        Self {
            key: value.key.to_string(),
            title: value.title.clone(),
        }
    }
}

/// Response for one template route, body and schema included
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDetailResponse {
    key: String,
    title: String,
    body: String,
    parameters: Vec<ParameterSpec>,
}

impl From<Template> for TemplateDetailResponse {
    fn from(value: Template) -> Self {
        Self {
            key: value.key.to_string(),
            title: value.title,
            body: value.body,
            parameters: value.parameters,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftPreviewResponse {
    title: String,
    html: String,
}

impl From<RenderedDraft> for DraftPreviewResponse {
    fn from(value: RenderedDraft) -> Self {
        Self {
            title: value.title,
            html: value.html,
        }
    }
}
