use serde_json::json;

use crate::domain::{ParamType, ParameterSpec, Template, TemplateKey};

/// The template defaults seeded into the store at startup. Editing happens in
/// the database afterwards; these are only the initial rows.
pub fn builtin_templates() -> Vec<Template> {
    vec![access_control_policy(), incident_response_plan(), data_retention_policy()]
}

fn access_control_policy() -> Template {
    Template {
        key: key("access_control_policy"),
        title: "Access Control Policy".to_string(),
        body: r#"# Access Control Policy

## Purpose

This policy defines how {{org_name}} grants, reviews, and revokes access to
information systems.

## Password Requirements

All accounts must use passwords of at least {{password_min_length}} characters.
Passwords are rotated on compromise, not on a fixed schedule.

## Multi-Factor Authentication

Multi-factor authentication is mandatory for the following roles: {{mfa_required_roles}}.

## Access Review

Access rights are reviewed quarterly. Authentication and authorization logs are
retained for {{log_retention_days}} days.
"#
        .to_string(),
        parameters: vec![
            text("org_name"),
            integer("password_min_length", 8, 128),
            text_list("mfa_required_roles", json!(["Admin"])),
            integer("log_retention_days", 1, 3650),
        ],
    }
}

fn incident_response_plan() -> Template {
    Template {
        key: key("incident_response_plan"),
        title: "Incident Response Plan".to_string(),
        body: r#"# Incident Response Plan

## Scope

This plan applies to all security incidents affecting {{org_name}} systems,
data, or personnel.

## Severity Levels

Incidents are triaged into the following severity levels: {{severity_levels}}.

## Response Targets

Critical incidents receive an initial response within {{critical_response_hours}}
hours. All incidents are reported to {{security_contact_email}}.

## Post-Incident Review

Every incident of critical severity concludes with a written post-incident
review within ten business days.
"#
        .to_string(),
        parameters: vec![
            text("org_name"),
            text("security_contact_email"),
            integer("critical_response_hours", 1, 72),
            text_list("severity_levels", json!(["Critical", "High", "Medium", "Low"])),
        ],
    }
}

fn data_retention_policy() -> Template {
    Template {
        key: key("data_retention_policy"),
        title: "Data Retention Policy".to_string(),
        body: r#"# Data Retention Policy

## Purpose

This policy defines how long {{org_name}} retains business records and how they
are disposed of.

## Retention Periods

Business records are retained for {{default_retention_years}} years unless a
legal hold applies. Backups are retained for {{backup_retention_days}} days.

## Covered Data

The policy covers the following data categories: {{data_categories}}.

## Disposal

Records past their retention period are deleted or irreversibly anonymized
within thirty days.
"#
        .to_string(),
        parameters: vec![
            text("org_name"),
            integer("default_retention_years", 1, 25),
            integer("backup_retention_days", 7, 3650),
            text_list("data_categories", json!(["Customer", "Financial", "Employee"])),
        ],
    }
}

fn key(raw: &str) -> TemplateKey {
    TemplateKey::try_new(raw).expect("builtin template key must be valid")
}

fn text(name: &str) -> ParameterSpec {
    ParameterSpec {
        name: name.to_string(),
        param_type: ParamType::Text,
        required: true,
        default: None,
        min: None,
        max: None,
    }
}

fn integer(name: &str, min: i64, max: i64) -> ParameterSpec {
    ParameterSpec {
        name: name.to_string(),
        param_type: ParamType::Integer,
        required: true,
        default: None,
        min: Some(min),
        max: Some(max),
    }
}

fn text_list(name: &str, default: serde_json::Value) -> ParameterSpec {
    ParameterSpec {
        name: name.to_string(),
        param_type: ParamType::TextList,
        required: false,
        default: Some(default),
        min: None,
        max: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::render;
    use serde_json::json;

    #[test]
    fn builtin_templates_have_unique_keys() {
        let templates = builtin_templates();
        let mut keys: Vec<_> = templates.iter().map(|t| t.key.clone()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), templates.len());
    }

    #[test]
    fn every_builtin_renders_with_its_defaults() {
        for template in builtin_templates() {
            let mut values = serde_json::Map::new();
            for spec in &template.parameters {
                if spec.default.is_some() {
                    continue;
                }
                let value = match spec.param_type {
                    ParamType::Integer => json!(spec.min.unwrap_or(1)),
                    _ => json!("example"),
                };
                values.insert(spec.name.clone(), value);
            }

            let draft = render(&template, &values)
                .unwrap_or_else(|e| panic!("template {} failed: {}", template.key, e));
            assert!(!draft.html.is_empty());
            // no placeholder survives rendering
            assert!(!draft.html.contains("{{"), "unresolved placeholder in {}", template.key);
        }
    }
}
