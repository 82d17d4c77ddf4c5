use crate::domain::{Control, ControlId, Framework, FrameworkKey, Frameworks};

/// Simple registry over a fixed set of frameworks.
///
/// Public so that other crates can reuse it for their own tests.
#[derive(Debug)]
pub struct StaticFrameworks {
    pub frameworks: Vec<&'static Framework>,
}

impl Frameworks for StaticFrameworks {
    fn frameworks(&self) -> Box<dyn Iterator<Item = &'static Framework> + '_> {
        Box::new(self.frameworks.iter().copied())
    }

    fn get(&self, key: &FrameworkKey) -> Option<&'static Framework> {
        self.frameworks.iter().copied().find(|framework| &framework.key == key)
    }
}

/// Helper for building a leaked `Framework` from (id, title) control pairs.
pub fn make_framework(key: &str, name: &str, controls: &[(&str, &str)]) -> &'static Framework {
    let controls = controls
        .iter()
        .map(|(id, title)| Control {
            id: ControlId::try_new(*id).unwrap(),
            title: title.to_string(),
            description: None,
            family: None,
            category: None,
        })
        .collect();

    let framework = Framework::new(
        FrameworkKey::try_new(key).unwrap(),
        name.to_string(),
        None,
        None,
        None,
        controls,
    );
    Box::leak(Box::new(framework))
}

/// Leaks a registry over the given frameworks.
pub fn make_registry(frameworks: Vec<&'static Framework>) -> &'static dyn Frameworks {
    Box::leak(Box::new(StaticFrameworks { frameworks }))
}
