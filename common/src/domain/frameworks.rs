use std::collections::HashMap;
use std::fmt::Debug;

use serde::Serialize;

use crate::domain::{ControlId, FrameworkKey};

/// One control of a compliance framework, normalized at load time regardless
/// of which file schema it came from.
#[derive(Debug, Clone, Serialize)]
pub struct Control {
    pub id: ControlId,
    pub title: String,
    pub description: Option<String>,
    /// Top-level function/family ("PROTECT", "PR").
    pub family: Option<String>,
    /// Parent category title ("Organizational Context"), present only for
    /// frameworks whose controls are subcategories.
    pub category: Option<String>,
}

/// A compliance framework with its static control set.
#[derive(Debug)]
pub struct Framework {
    pub key: FrameworkKey,
    pub name: String,
    pub version: Option<String>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub controls: Vec<Control>,
    index: HashMap<ControlId, usize>,
}

/// Subcategory controls grouped under their parent category.
#[derive(Debug, Clone, Serialize)]
pub struct FrameworkCategory<'a> {
    /// Category code derived from the control id prefix ("GV.OC").
    pub id: String,
    pub title: String,
    pub function: Option<String>,
    pub controls: Vec<&'a Control>,
}

impl Framework {
    pub fn new(
        key: FrameworkKey,
        name: String,
        version: Option<String>,
        publisher: Option<String>,
        description: Option<String>,
        controls: Vec<Control>,
    ) -> Self {
        let index = controls
            .iter()
            .enumerate()
            .map(|(position, control)| (control.id.clone(), position))
            .collect();
        Self { key, name, version, publisher, description, controls, index }
    }

    pub fn control_count(&self) -> usize {
        self.controls.len()
    }

    pub fn get_control(&self, id: &ControlId) -> Option<&Control> {
        self.index.get(id).map(|position| &self.controls[*position])
    }

    pub fn has_control(&self, id: &ControlId) -> bool {
        self.index.contains_key(id)
    }

    /// Whether this framework's controls carry category metadata, i.e. the
    /// category drawer applies to it.
    pub fn has_category_data(&self) -> bool {
        !self.controls.is_empty() && self.controls.iter().all(|c| c.category.is_some())
    }

    /// Groups controls by parent category, preserving control-set order.
    /// Empty for frameworks without category metadata.
    pub fn categories(&self) -> Vec<FrameworkCategory<'_>> {
        if !self.has_category_data() {
            return Vec::new();
        }

        let mut categories: Vec<FrameworkCategory<'_>> = Vec::new();
        for control in &self.controls {
            let Some(code) = category_code(&control.id) else { continue };
            match categories.iter_mut().find(|category| category.id == code) {
                Some(category) => category.controls.push(control),
                None => categories.push(FrameworkCategory {
                    id: code.to_string(),
                    title: control.category.clone().unwrap_or_else(|| code.to_string()),
                    function: control.family.clone(),
                    controls: vec![control],
                }),
            }
        }
        categories
    }

    pub fn category(&self, category_id: &str) -> Option<FrameworkCategory<'_>> {
        self.categories().into_iter().find(|category| category.id == category_id)
    }
}

/// Category code is the control-id prefix before the dash: "GV.OC-01" → "GV.OC".
fn category_code(id: &ControlId) -> Option<&str> {
    id.as_ref().split_once('-').map(|(prefix, _)| prefix)
}

/// Registry of all frameworks bundled with the service.
pub trait Frameworks: Send + Sync + Debug + 'static {
    /// iterate all frameworks
    fn frameworks(&self) -> Box<dyn Iterator<Item = &'static Framework> + '_>;
    /// find a framework by its key
    fn get(&self, key: &FrameworkKey) -> Option<&'static Framework>;
}
