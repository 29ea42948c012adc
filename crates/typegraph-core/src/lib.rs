//! TypeGraph Core - type definition store, validation and value conversion.
//!
//! This crate provides the persistent metadata catalog for TypeGraph:
//! type definitions kept as a sled-backed graph, the validators guarding
//! every write, the entity store and the legacy/current value converters.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod catalog;
pub mod convert;
pub mod error;
pub mod storage;
pub mod store;
pub mod validation;

pub use catalog::{
    AttributeDef, Cardinality, ClassificationDef, EntityDef, EnumDef, EnumElementDef,
    PrimitiveType, StructDef, TypeCategory, TypeDef, TypeRegistry, TypesDef,
};
pub use convert::{ConversionContext, FormatConverter, FormatConverters, TypeKind};
pub use error::{Error, ErrorKind, Result};
pub use storage::{GraphAdapter, SledGraph, StorageConfig, Transaction};
pub use store::{EntityStore, TypeDefStore};

/// Re-export protocol types.
pub use typegraph_proto as proto;
