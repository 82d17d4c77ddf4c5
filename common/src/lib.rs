mod domain;
mod infrastructure;

pub mod test_utils;

// expose domain module

pub use domain::*;
pub use infrastructure::frameworks::load as load_frameworks;
pub use infrastructure::templates::builtin_templates;

// expose database module

pub use infrastructure::database;
