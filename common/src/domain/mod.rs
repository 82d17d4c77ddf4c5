use std::sync::LazyLock;

use nutype::nutype;
use regex::Regex;

pub mod frameworks;
pub mod templates;

pub use frameworks::{Control, Framework, FrameworkCategory, Frameworks};
pub use templates::{
    ParamType, ParameterSet, ParameterSpec, RenderError, RenderedDraft, Template, render,
};

// Keys may contain only lowercase ASCII letters, digits, and underscore.
// Example: "access_control_policy" or "cis_v8" is valid; "CIS v8" is not.
pub const ELIGIBLE_KEY_REGEX: &str = r"^[a-z0-9_]+$";

static ELIGIBLE_KEY_REGEX_COMPILED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(ELIGIBLE_KEY_REGEX).expect("ELIGIBLE_KEY_REGEX must be a valid regex")
});

pub fn is_eligible_key(key: &str) -> bool {
    ELIGIBLE_KEY_REGEX_COMPILED.is_match(key)
}

/// Identifies a policy template ("access_control_policy").
#[nutype(
    sanitize(trim, lowercase),
    validate(not_empty, len_char_max = 100, predicate = is_eligible_key),
    derive(
        Clone,
        Debug,
        Display,
        FromStr,
        AsRef,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize
    )
)]
pub struct TemplateKey(String);

/// Identifies a compliance framework ("nist_csf_2_0").
#[nutype(
    sanitize(trim, lowercase),
    validate(not_empty, len_char_max = 100, predicate = is_eligible_key),
    derive(
        Clone,
        Debug,
        Display,
        FromStr,
        AsRef,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize
    )
)]
pub struct FrameworkKey(String);

// Control ids keep the publisher's casing and punctuation: "CIS-01", "GV.OC-01".
static CONTROL_ID_REGEX_COMPILED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._-]+$").expect("control id regex must be valid")
});

pub fn is_eligible_control_id(id: &str) -> bool {
    CONTROL_ID_REGEX_COMPILED.is_match(id)
}

/// Identifies one control within a framework's static control set.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 100, predicate = is_eligible_control_id),
    derive(
        Clone,
        Debug,
        Display,
        FromStr,
        AsRef,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize
    )
)]
pub struct ControlId(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_key_is_lowercased_and_trimmed() {
        let key = TemplateKey::try_new("  Access_Control_Policy ").unwrap();
        assert_eq!(key.as_ref(), "access_control_policy");
    }

    #[test]
    fn template_key_rejects_spaces() {
        assert!(TemplateKey::try_new("access control").is_err());
    }

    #[test]
    fn control_id_keeps_casing() {
        let id = ControlId::try_new("GV.OC-01").unwrap();
        assert_eq!(id.as_ref(), "GV.OC-01");
    }

    #[test]
    fn control_id_rejects_whitespace_inside() {
        assert!(ControlId::try_new("GV OC").is_err());
    }
}
