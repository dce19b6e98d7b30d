//! Main mocklayer crate: an in-memory relational data layer for mocking REST back ends.
//!
//! This crate is the primary entry point for users of mocklayer. It re-exports
//! the core types from `mocklayer-core` and the bundled in-memory store.
//!
//! # Features
//!
//! - **Schema and associations** - Declare models with `belongs_to` / `has_many` and read or write related records
//! - **Pending references** - Link records before they are saved; foreign keys fill in on save
//! - **Route shorthands** - Resolve mock requests into records or collections without handlers
//! - **Serializers** - Produce sideloaded or embedded JSON documents, each record once
//!
//! # Quick Start
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
//! link.create_related("posts", json!({ "title": "Ipsum" }))?;
//!
//! let registry = SerializerRegistry::new(schema.clone())
//!     .with_serializer("author", SerializerConfig::new().relationships(["posts"]))?;
//!
//! let request = Request::new("/authors/1").with_id(1);
//! let author = schema.resolve(&RequestTarget::Untyped, &request, &ShorthandOptions::default())?;
//!
//! assert_eq!(
//!     registry.serialize(author)?,
//!     json!({
//!         "author": { "id": 1, "name": "Link", "post_ids": [1, 2] },
//!         "posts": [
//!             { "id": 1, "title": "Lorem", "author_id": 1 },
//!             { "id": 2, "title": "Ipsum", "author_id": 1 }
//!         ]
//!     })
//! );
//! ```
//!
//! # Pending references
//!
//! A record can be linked to a parent that hasn't been saved. Its foreign key
//! reads `null` until the parent is saved, then reflects the parent's id:
//!
//! ```ignore
//! let post = schema.new_record("post", json!({ "title": "Draft" }))?;
//! let author = schema.new_record("author", json!({ "name": "Zelda" }))?;
//!
//! post.set_related("author", Some(&author))?;
//! assert_eq!(post.related_id("author")?, None);
//!
//! author.save()?;
//! assert_eq!(post.related_id("author")?, author.id());
//! ```
//!
//! # Backends
//!
//! - [`memory`] - The bundled single-threaded in-memory store

pub mod prelude;

pub use mocklayer_core::{
    association, backend, collection, error, inflector, query, record, request, resource, schema,
    serializer, shorthand,
};

// Re-export serde_json for building attributes and fixtures
pub use serde_json;

/// In-memory record store implementations.
pub mod memory {
    pub use mocklayer_memory::{InMemoryDb, InMemoryDbBuilder};
}
