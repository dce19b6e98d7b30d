//! In-memory record store for mocklayer.
//!
//! This crate provides a single-threaded, in-memory implementation of the
//! `RecordStore` trait. Tables are ordered maps keyed by integer id, so every
//! read returns rows in ascending id order.
//!
//! # Features
//!
//! - **Shared handles** - Clones share one set of tables through `Rc<RefCell<_>>`
//! - **Sequential ids** - Ids are assigned per table, continuing after loaded fixtures
//! - **Filter queries** - Equality, id-list and presence filters over rows
//! - **Fixtures** - Seed tables from JSON through [`InMemoryDbBuilder`]
//!
//! # Quick Start
//!
//! ```ignore
//! use mocklayer::{prelude::*, memory::InMemoryDb};
//! use serde_json::json;
//!
//! let db = InMemoryDb::builder()
//!     .with_fixtures(json!({ "authors": [{ "id": 1, "name": "Link" }] }))
//!     .build()?;
//!
//! let schema = Schema::builder()
//!     .model("author", [])
//!     .build(db)?;
//!
//! assert_eq!(schema.find("author", 1)?.unwrap().attr("name")?, Some(json!("Link")));
//! ```

#[allow(unused_extern_crates)]
extern crate self as mocklayer_memory;

pub mod evaluator;
pub mod store;

pub use store::{InMemoryDb, InMemoryDbBuilder};
