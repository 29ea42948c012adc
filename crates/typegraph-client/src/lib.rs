//! TypeGraph Client - async entity client for TypeGraph services.
//!
//! The client maps entity and classification operations onto the service's
//! REST endpoints and sends them through a pluggable [`Transport`].
//!
//! # Quick Start
//!
//! ```ignore
//! use typegraph_client::{ClientConfig, EntityClient};
//!
//! async fn run(transport: impl typegraph_client::Transport) -> Result<(), typegraph_client::Error> {
//!     let client = EntityClient::new(transport, ClientConfig::localhost())?;
//!
//!     // Attach a classification and list what is attached
//!     client
//!         .add_classifications("g-1", &[typegraph_proto::current::Classification::new("PII")])
//!         .await?;
//!     let attached = client.get_classifications("g-1").await?;
//!
//!     println!("{} classifications", attached.len());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use api::{ApiInfo, Method};
pub use client::EntityClient;
pub use config::ClientConfig;
pub use error::Error;
pub use transport::{Request, Response, Transport};

/// Re-export protocol types.
pub use typegraph_proto as proto;
