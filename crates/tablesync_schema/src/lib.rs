//! # tablesync schema
//!
//! Entity schemas, records and key identity for tablesync.
//!
//! This crate provides:
//! - [`FieldValue`]: the primitive values a record field can hold
//! - [`Record`] and [`KeyTuple`]: entity instances and their identity
//! - [`EntitySchema`]: field list plus ordered key fields of one resource
//! - [`coerce`]: typed-input coercion with defined behavior for bad input
//! - [`Catalog`]: the standard set of eleven tables
//!
//! ## Identity
//!
//! Two records are the same entity iff their key tuples are equal field by
//! field. Non-key fields may differ; that is an update, not a new identity.
//!
//! ```
//! use tablesync_schema::{Catalog, Record};
//!
//! let catalog = Catalog::standard().unwrap();
//! let schema = &catalog.lookup("records").unwrap().schema;
//!
//! let a = Record::new()
//!     .with("email", "a@x.com")
//!     .with("cname", "Italy")
//!     .with("disease_code", "D1")
//!     .with("total_deaths", 10i64);
//! let b = a.clone().with("total_deaths", 12i64);
//!
//! assert!(schema.same_entity(&a, &b));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
pub mod coerce;
mod error;
mod record;
mod schema;
mod value;

pub use catalog::{Catalog, CatalogEntry, DEFAULT_TAB};
pub use error::{SchemaError, SchemaResult};
pub use record::{KeyTuple, Record};
pub use schema::{EntitySchema, FieldSpec, FieldType, SchemaBuilder};
pub use value::FieldValue;
