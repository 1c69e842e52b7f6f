//! # tablesync testkit
//!
//! Test utilities for tablesync.
//!
//! This crate provides:
//! - Loopback wiring between real engines and the reference server
//! - Table fixtures seeded with standard-catalog rows
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```
//! use tablesync_testkit::prelude::*;
//!
//! let table = TestTable::seeded("countries", [country("Italy", 59_000_000)]);
//! table.begin_edit(&country("Italy", 0)).unwrap();
//! table.update_draft_field("population", "60000000").unwrap();
//! table.commit_edit().unwrap();
//!
//! assert_eq!(table.records(), table.server_records());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::records::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
