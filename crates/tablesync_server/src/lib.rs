//! # tablesync server
//!
//! In-memory reference REST server for tablesync resources.
//!
//! This crate provides:
//! - `GET`/`POST` collection and `PUT`/`DELETE` item endpoints
//! - Composite keys as percent-encoded path segments
//! - Text trimming and value coercion on write
//! - Fault injection and a request log for tests
//!
//! # Architecture
//!
//! The server has no socket of its own. [`ResourceServer::handle`] takes a
//! method, a path and a body and returns a [`ServerResponse`]; callers
//! plug it behind whatever transport they need (an in-process loopback in
//! the test suites).
//!
//! # Error bodies
//!
//! Every error response carries `{"detail": "<reason>"}`:
//!
//! | status | cause                                              |
//! |--------|----------------------------------------------------|
//! | 400    | body not a JSON object, unknown field, blank key   |
//! | 404    | unknown resource or key                            |
//! | 405    | method not served on the path                      |
//! | 409    | key already taken, or key change refused           |

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod handler;
mod server;
mod store;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{HandlerContext, RequestHandler, Route, ServerResponse};
pub use server::{RequestLogEntry, ResourceServer};
pub use store::ResourceTable;
