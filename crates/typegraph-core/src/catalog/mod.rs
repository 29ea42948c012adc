//! Type catalog for TypeGraph.
//!
//! The catalog holds the type definitions (enums, structs, classifications
//! and entities) and the registry snapshot used to resolve them.

mod attribute;
mod registry;
mod typedef;
mod types;
mod types_def;

pub use attribute::AttributeDef;
pub use registry::{ResolvedType, TypeRegistry};
pub use typedef::{
    CategoryDef, ClassificationDef, EntityDef, EnumDef, EnumElementDef, StructDef, TypeDef,
    DEFAULT_TYPE_VERSION,
};
pub use types::{array_type_name, map_type_name, Cardinality, PrimitiveType, TypeCategory, TypeName};
pub use types_def::TypesDef;
