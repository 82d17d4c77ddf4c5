use std::fmt;

use pulldown_cmark::{Options, Parser, html};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::TemplateKey;

/// A policy template: a Markdown body with `{{name}}` placeholders plus the
/// schema of the parameters that fill them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub key: TemplateKey,
    pub title: String,
    pub body: String,
    pub parameters: Vec<ParameterSpec>,
}

/// One parameter a template accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
    /// Inclusive bounds, integers only.
    #[serde(default)]
    pub min: Option<i64>,
    #[serde(default)]
    pub max: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    Text,
    Integer,
    TextList,
    Boolean,
}

/// The parameter values a version was rendered from, frozen at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSet {
    pub template_key: TemplateKey,
    pub values: serde_json::Map<String, Value>,
}

/// Result of rendering a template with a concrete parameter set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDraft {
    pub title: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    MissingParameter(String),
    InvalidParameter { name: String, expected: ParamType },
    OutOfRange { name: String, min: Option<i64>, max: Option<i64> },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::MissingParameter(name) => {
                write!(f, "missing required parameter '{}'", name)
            }
            RenderError::InvalidParameter { name, expected } => {
                write!(f, "parameter '{}' must be of type {:?}", name, expected)
            }
            RenderError::OutOfRange { name, min, max } => match (min, max) {
                (Some(min), Some(max)) => {
                    write!(f, "parameter '{}' must be between {} and {}", name, min, max)
                }
                (Some(min), None) => write!(f, "parameter '{}' must be at least {}", name, min),
                (None, Some(max)) => write!(f, "parameter '{}' must be at most {}", name, max),
                (None, None) => write!(f, "parameter '{}' is out of range", name),
            },
        }
    }
}

impl std::error::Error for RenderError {}

/// Validates `values` against the template's schema and renders the Markdown
/// body to HTML. Bounds are enforced here, not left to clients.
pub fn render(
    template: &Template,
    values: &serde_json::Map<String, Value>,
) -> Result<RenderedDraft, RenderError> {
    let mut body = template.body.clone();

    for spec in &template.parameters {
        let value = match values.get(&spec.name).or(spec.default.as_ref()) {
            Some(value) if !value.is_null() => value.clone(),
            _ if spec.required => return Err(RenderError::MissingParameter(spec.name.clone())),
            _ => continue,
        };

        let rendered = format_value(spec, &value)?;
        let placeholder = format!("{{{{{}}}}}", spec.name);
        body = body.replace(&placeholder, &rendered);
    }

    Ok(RenderedDraft {
        title: template.title.clone(),
        html: markdown_to_html(&body),
    })
}

fn format_value(spec: &ParameterSpec, value: &Value) -> Result<String, RenderError> {
    let invalid = || RenderError::InvalidParameter {
        name: spec.name.clone(),
        expected: spec.param_type,
    };

    match spec.param_type {
        ParamType::Text => value.as_str().map(str::to_owned).ok_or_else(invalid),
        ParamType::Integer => {
            let number = value.as_i64().ok_or_else(invalid)?;
            let below = spec.min.is_some_and(|min| number < min);
            let above = spec.max.is_some_and(|max| number > max);
            if below || above {
                return Err(RenderError::OutOfRange {
                    name: spec.name.clone(),
                    min: spec.min,
                    max: spec.max,
                });
            }
            Ok(number.to_string())
        }
        ParamType::TextList => {
            let items = value.as_array().ok_or_else(invalid)?;
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                parts.push(item.as_str().ok_or_else(invalid)?.to_owned());
            }
            Ok(parts.join(", "))
        }
        ParamType::Boolean => value.as_bool().map(|b| b.to_string()).ok_or_else(invalid),
    }
}

fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);

    let mut out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_template() -> Template {
        Template {
            key: TemplateKey::try_new("access_control_policy").unwrap(),
            title: "Access Control Policy".to_string(),
            body: "# Access Control\n\n{{org_name}} requires passwords of \
                   {{password_min_length}} characters for {{mfa_required_roles}}."
                .to_string(),
            parameters: vec![
                ParameterSpec {
                    name: "org_name".to_string(),
                    param_type: ParamType::Text,
                    required: true,
                    default: None,
                    min: None,
                    max: None,
                },
                ParameterSpec {
                    name: "password_min_length".to_string(),
                    param_type: ParamType::Integer,
                    required: true,
                    default: None,
                    min: Some(8),
                    max: Some(128),
                },
                ParameterSpec {
                    name: "mfa_required_roles".to_string(),
                    param_type: ParamType::TextList,
                    required: false,
                    default: Some(json!(["Admin"])),
                    min: None,
                    max: None,
                },
            ],
        }
    }

    fn values(pairs: Value) -> serde_json::Map<String, Value> {
        pairs.as_object().unwrap().clone()
    }

    #[test]
    fn renders_placeholders_and_markdown() {
        let draft = render(
            &sample_template(),
            &values(json!({"org_name": "Acme", "password_min_length": 14})),
        )
        .unwrap();

        assert_eq!(draft.title, "Access Control Policy");
        assert!(draft.html.contains("<h1>Access Control</h1>"));
        assert!(draft.html.contains("Acme requires passwords of 14 characters"));
        // default kicks in for the absent list parameter
        assert!(draft.html.contains("for Admin."));
    }

    #[test]
    fn missing_required_parameter_fails() {
        let err = render(
            &sample_template(),
            &values(json!({"password_min_length": 14})),
        )
        .unwrap_err();
        assert_eq!(err, RenderError::MissingParameter("org_name".to_string()));
    }

    #[test]
    fn out_of_range_integer_fails() {
        let err = render(
            &sample_template(),
            &values(json!({"org_name": "Acme", "password_min_length": 4})),
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::OutOfRange { .. }));
    }

    #[test]
    fn wrong_type_fails() {
        let err = render(
            &sample_template(),
            &values(json!({"org_name": "Acme", "password_min_length": "long"})),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RenderError::InvalidParameter { expected: ParamType::Integer, .. }
        ));
    }
}
