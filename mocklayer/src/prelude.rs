//! Convenient re-exports of commonly used types from mocklayer.
//!
//! Import this prelude module to quickly access the most frequently used types
//! and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use mocklayer::prelude::*;
//! ```
//!
//! This provides access to:
//! - Schema construction and association declarations
//! - Records, collections and association values
//! - Record store traits
//! - Filter expressions
//! - Shorthand resolution and serialization
//! - Error types

pub use mocklayer_core::{
    association::{Association, AssociationDef, AssociationKind, belongs_to, has_many},
    backend::{RecordId, RecordStore, RecordStoreBuilder, Row},
    collection::Collection,
    error::{DataLayerError, DataLayerResult},
    query::{Expr, FieldOp, Filter, QueryVisitor},
    record::{ForeignKey, Record, RecordKey, Related},
    request::{QueryParam, Request},
    resource::Resource,
    schema::{ModelDefinition, Schema, SchemaBuilder},
    serializer::{SerializerConfig, SerializerRegistry},
    shorthand::{RequestTarget, ShorthandOptions},
};
