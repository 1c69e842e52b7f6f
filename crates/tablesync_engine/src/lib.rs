//! # tablesync engine
//!
//! Write-through synchronization of entity tables with REST resources.
//!
//! This crate provides:
//! - Table engine (cache, single edit session, add buffer)
//! - Edit state machine (idle → editing → idle)
//! - Resource client abstraction with a scripted mock
//! - HTTP resource client over a pluggable HTTP layer (`ureq`, loopback)
//! - Event feed for presentation layers
//!
//! ## Architecture
//!
//! Presentation forwards intents to a [`TableEngine`], which calls its
//! [`ResourceClient`] and reconciles the server's answer into the cache:
//!
//! ```text
//! intent ──▶ TableEngine ──▶ ResourceClient ──▶ server
//!                 ▲                                │
//!                 └──────── confirmed record ◀─────┘
//! ```
//!
//! ## Key Invariants
//!
//! - The cache only changes on confirmed server responses
//! - No two cached records share a key
//! - At most one edit session per table, always on a cached record
//! - A failed request leaves cache, session and add buffer untouched
//! - One request per table in flight at a time
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use tablesync_engine::{MockResource, TableEngine};
//! use tablesync_schema::{Catalog, Record};
//!
//! let catalog = Catalog::standard().unwrap();
//! let schema = catalog.lookup("countries").unwrap().schema.clone();
//!
//! let mock = Arc::new(MockResource::new());
//! mock.set_list_response(Ok(vec![Record::new()
//!     .with("cname", "Italy")
//!     .with("population", 59_000_000i64)]));
//!
//! let table = TableEngine::new(schema, Arc::clone(&mock));
//! assert_eq!(table.load().unwrap(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod events;
mod http;
mod transport;
mod ureq_client;

pub use config::ClientConfig;
pub use engine::{EditSession, EditState, TableEngine, TableSnapshot, TableStats};
pub use error::{TableError, TableResult};
pub use events::{Operation, TableEvent, TableFeed};
pub use http::{HttpClient, HttpRequest, HttpResource, HttpResponse, LoopbackClient, LoopbackServer, Method};
pub use transport::{MockResource, ResourceCall, ResourceClient};
pub use ureq_client::UreqClient;

use tablesync_schema::EntitySchema;

/// Engine talking HTTP through `ureq`.
pub type HttpTableEngine = TableEngine<HttpResource<UreqClient>>;

/// Builds an engine for `schema` against the server in `config`.
pub fn connect(config: &ClientConfig, schema: EntitySchema) -> TableResult<HttpTableEngine> {
    let resource = HttpResource::new(config, &schema, UreqClient::new(config))?;
    Ok(TableEngine::new(schema, resource))
}
