use std::path::Path;

use anyhow::{Context, anyhow};
use serde::Deserialize;

use crate::domain::{Control, ControlId, Framework, FrameworkKey, Frameworks};

#[derive(Debug)]
pub(crate) struct FrameworksAdapter {
    frameworks: Vec<&'static Framework>,
}

impl Frameworks for FrameworksAdapter {
    fn frameworks(&self) -> Box<dyn Iterator<Item = &'static Framework> + '_> {
        Box::new(self.frameworks.iter().copied())
    }

    fn get(&self, key: &FrameworkKey) -> Option<&'static Framework> {
        self.frameworks.iter().copied().find(|framework| &framework.key == key)
    }
}

/// Loads every framework data file from `data_path` and leaks the normalized
/// registry for the lifetime of the process.
pub fn load(data_path: &str) -> Result<&'static dyn Frameworks, anyhow::Error> {
    use std::fs;

    let dir_path = Path::new(data_path);

    tracing::debug!("Loading frameworks from {}", dir_path.to_string_lossy());

    let entries = fs::read_dir(dir_path).with_context(|| {
        format!(
            "failed to read framework data directory: {}",
            dir_path.to_string_lossy()
        )
    })?;

    let mut frameworks = Vec::new();
    for entry_res in entries {
        let entry = entry_res.map_err(|e| anyhow!("failed to read a directory entry: {}", e))?;
        let path = entry.path();
        if path.is_file() && is_json(&path) {
            let framework = load_framework(&path)?;
            let static_ref: &'static Framework = Box::leak(Box::new(framework));
            frameworks.push(static_ref);
        }
    }

    frameworks.sort_by(|a, b| a.key.cmp(&b.key));

    Ok(Box::leak(Box::new(FrameworksAdapter { frameworks })))
}

fn load_framework(path: &Path) -> Result<Framework, anyhow::Error> {
    use std::fs;

    let path_str = path.to_string_lossy().into_owned();

    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read framework data file '{}'", path_str))?;

    let record = serde_json::from_str::<FrameworkRecord>(&content)
        .with_context(|| format!("failed to parse JSON framework data '{}'", path_str))?;

    record.try_into().with_context(|| format!("invalid framework data '{}'", path_str))
}

fn is_json(path: &Path) -> bool {
    path.extension().map(|ext| ext == "json").unwrap_or(false)
}

// Internal records for deserializing. There are two known file schemas: the
// normalized export (subcategory controls with family/category) and the plain
// catalog (flat id/title/function rows). Both collapse into `Framework`.

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum FrameworkRecord {
    Normalized(NormalizedRecord),
    Catalog(CatalogRecord),
}

#[derive(Clone, Debug, Deserialize)]
struct NormalizedRecord {
    key: String,
    name: String,
    version: String,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    description: Option<String>,
    controls: Vec<NormalizedControlRecord>,
}

#[derive(Clone, Debug, Deserialize)]
struct NormalizedControlRecord {
    id: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    family: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
struct CatalogRecord {
    key: String,
    name: String,
    #[serde(default)]
    publisher: Option<String>,
    controls: Vec<CatalogControlRecord>,
}

#[derive(Clone, Debug, Deserialize)]
struct CatalogControlRecord {
    id: String,
    title: String,
    #[serde(default)]
    function: Option<String>,
}

impl TryFrom<FrameworkRecord> for Framework {
    type Error = anyhow::Error;

    fn try_from(record: FrameworkRecord) -> Result<Self, Self::Error> {
        match record {
            FrameworkRecord::Normalized(record) => {
                let key = FrameworkKey::try_new(record.key)
                    .map_err(|e| anyhow!("invalid framework key: {}", e))?;
                let controls = record
                    .controls
                    .into_iter()
                    .map(|control| {
                        Ok(Control {
                            id: control_id(&control.id)?,
                            title: control.title,
                            description: control.description,
                            family: control.family,
                            category: control.category,
                        })
                    })
                    .collect::<Result<Vec<_>, anyhow::Error>>()?;

                Ok(Framework::new(
                    key,
                    record.name,
                    Some(record.version),
                    record.publisher,
                    record.description,
                    controls,
                ))
            }
            FrameworkRecord::Catalog(record) => {
                let key = FrameworkKey::try_new(record.key)
                    .map_err(|e| anyhow!("invalid framework key: {}", e))?;
                let controls = record
                    .controls
                    .into_iter()
                    .map(|control| {
                        Ok(Control {
                            id: control_id(&control.id)?,
                            title: control.title,
                            description: None,
                            family: control.function,
                            category: None,
                        })
                    })
                    .collect::<Result<Vec<_>, anyhow::Error>>()?;

                Ok(Framework::new(key, record.name, None, record.publisher, None, controls))
            }
        }
    }
}

fn control_id(raw: &str) -> Result<ControlId, anyhow::Error> {
    ControlId::try_new(raw).map_err(|e| anyhow!("invalid control id '{}': {}", raw, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_normalized_record() {
        let json = r#"{
            "key": "nist_csf_2_0",
            "name": "NIST Cybersecurity Framework (CSF)",
            "version": "2.0",
            "publisher": "NIST",
            "description": "CSF 2.0 Core subcategories.",
            "controls": [
                {
                    "id": "GV.OC-01",
                    "title": "Organizational mission is understood",
                    "description": "The organizational mission informs cybersecurity risk management.",
                    "family": "GOVERN",
                    "category": "Organizational Context"
                }
            ]
        }"#;

        let record: FrameworkRecord = serde_json::from_str(json).unwrap();
        let framework = Framework::try_from(record).unwrap();

        assert_eq!(framework.key.as_ref(), "nist_csf_2_0");
        assert_eq!(framework.version.as_deref(), Some("2.0"));
        assert_eq!(framework.control_count(), 1);
        let control = &framework.controls[0];
        assert_eq!(control.family.as_deref(), Some("GOVERN"));
        assert_eq!(control.category.as_deref(), Some("Organizational Context"));
    }

    #[test]
    fn parses_catalog_record() {
        let json = r#"{
            "key": "cis_v8",
            "name": "CIS Critical Security Controls v8",
            "publisher": "Center for Internet Security (CIS)",
            "controls": [
                {"id": "CIS-01", "title": "Inventory and Control of Enterprise Assets"},
                {"id": "CIS-02", "title": "Inventory and Control of Software Assets"}
            ]
        }"#;

        let record: FrameworkRecord = serde_json::from_str(json).unwrap();
        let framework = Framework::try_from(record).unwrap();

        assert_eq!(framework.key.as_ref(), "cis_v8");
        assert_eq!(framework.version, None);
        assert_eq!(framework.control_count(), 2);
        assert!(framework.controls.iter().all(|c| c.category.is_none()));
    }

    #[test]
    fn rejects_malformed_control_id() {
        let json = r#"{
            "key": "cis_v8",
            "name": "CIS v8",
            "controls": [{"id": "CIS 01", "title": "Bad id"}]
        }"#;

        let record: FrameworkRecord = serde_json::from_str(json).unwrap();
        assert!(Framework::try_from(record).is_err());
    }
}
