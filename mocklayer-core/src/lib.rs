//! An in-memory relational data layer for mocking REST back ends.
//!
//! This crate is the core of the mocklayer project and provides:
//!
//! - **Record store abstraction** ([`backend`]) - Flat keyed tables the association engine reads and writes through
//! - **Schema** ([`schema`]) - Model registry, association table and record factory
//! - **Associations** ([`association`]) - `belongs_to` / `has_many` declarations and resolved descriptors
//! - **Records and collections** ([`record`], [`collection`]) - Handles with attribute and association accessors
//! - **Filter expressions** ([`query`]) - Equality and id-list filters evaluated by stores
//! - **Shorthand resolution** ([`shorthand`], [`request`]) - Turning mock requests into records or collections
//! - **Serialization** ([`serializer`], [`resource`]) - Sideloaded or embedded JSON documents
//! - **Error handling** ([`error`]) - One error enum and result alias for the whole layer
//!
//! # Example
//!
//! ```ignore
//! use mocklayer::{prelude::*, memory::InMemoryDb};
//! use serde_json::json;
//!
//! let schema = Schema::builder()
//!     .model("author", [has_many("posts")])
//!     .model("post", [belongs_to("author")])
//!     .build(InMemoryDb::new())?;
//!
//! let link = schema.create("author", json!({ "name": "Link" }))?;
//! link.create_related("posts", json!({ "title": "Lorem" }))?;
//!
//! let registry = SerializerRegistry::new(schema.clone())
//!     .with_serializer("author", SerializerConfig::new().relationships(["posts"]))?;
//!
//! let document = registry.serialize(&link)?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as mocklayer_core;

pub mod association;
pub mod backend;
pub mod collection;
pub mod error;
pub mod inflector;
pub mod query;
pub mod record;
pub mod request;
pub mod resource;
pub mod schema;
pub mod serializer;
pub mod shorthand;
