//! Error types and result types for data layer operations.
//!
//! Every fallible operation in the workspace returns [`DataLayerResult<T>`].
//! Absence is not an error at this layer: lookups that find nothing return
//! `None` (or [`Resource::Empty`](crate::resource::Resource::Empty)) instead.

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

use crate::backend::RecordId;

/// Represents all possible errors that can occur when interacting with the data layer.
///
/// This enum covers record store failures, schema declaration mistakes,
/// association misuse, request shape problems and serialization failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataLayerError {
    /// Serialization/deserialization error when converting configuration or rows.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The requested table does not exist in the record store.
    #[error("Table not found: {0}")]
    TableNotFound(String),
    /// The record with the given id does not exist in the table.
    /// The first argument is the record id, the second is the table name.
    #[error("Record {0} not found in table {1}")]
    RecordNotFound(RecordId, String),
    /// A record with the given id already exists in the table.
    /// The first argument is the record id, the second is the table name.
    #[error("Record {0} already exists in table {1}")]
    RecordAlreadyExists(RecordId, String),
    /// No model with the given name is registered in the schema.
    #[error("Unknown model: {0}")]
    UnknownModel(String),
    /// The model has no association with the given name.
    /// The first argument is the model name, the second is the association name.
    #[error("Model {0} has no association named {1}")]
    UnknownAssociation(String, String),
    /// A singular accessor was used on a plural association or vice versa.
    /// The first argument is the model name, the second is the association name.
    #[error("Association {1} on model {0} is not of the requested kind")]
    AssociationKind(String, String),
    /// A record of the wrong model was assigned to an association.
    /// Arguments: association name, expected model, received model.
    #[error("Association {0} expects a {1} record, got a {2} record")]
    AssociationTarget(String, String, String),
    /// The schema declaration is inconsistent.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    /// The attribute cannot be written directly.
    #[error("Invalid attribute: {0}")]
    InvalidAttribute(String),
    /// The request descriptor cannot be resolved.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// A list-of-types request contained an entry that resolves to a single record.
    #[error(
        "`{0}` resolves to a single record, which cannot be returned from an array shorthand; create a serializer for this route instead"
    )]
    ShapeMismatch(String),
    /// An embedded relationship chain led back to a record already being embedded.
    /// The first argument is the model name, the second the record id.
    #[error("Circular embed of {0} {1}; sideload one of the relationships instead")]
    CircularEmbed(String, String),
    /// An error occurred in the underlying record store.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for data layer operations.
pub type DataLayerResult<T> = Result<T, DataLayerError>;

impl From<SerdeJsonError> for DataLayerError {
    fn from(err: SerdeJsonError) -> Self {
        DataLayerError::Serialization(err.to_string())
    }
}
