//! TypeGraph Protocol - metadata value models shared by the store, the
//! conversion framework and the client.
//!
//! Two value generations live side by side:
//! - [`legacy`]: `Referenceable`/`Struct`/trait values with exact primitive widths.
//! - [`current`]: `Entity`/`Struct`/`Classification` values with object ids.

pub mod current;
pub mod error;
pub mod filter;
pub mod legacy;

pub use current::EntityMutationResponse;
pub use error::Error;
pub use filter::SearchFilter;
