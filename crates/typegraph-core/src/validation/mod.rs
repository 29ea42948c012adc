//! Definition validation: supertype graphs, attribute declarations and
//! entity conformance.

mod attribute;
mod entity;
mod supertype;

pub use attribute::{parse_default, referenced_definitions, validate_type_name, AttributeValidator};
pub use entity::EntityValidator;
pub use supertype::{SupertypeChange, SupertypeValidator};
