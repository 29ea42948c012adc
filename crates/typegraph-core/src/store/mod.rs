//! Persistent type definition and entity stores.

mod entity_store;
mod typedef_store;

pub use entity_store::EntityStore;
pub use typedef_store::TypeDefStore;
