//! The result of resolving a request, and the input to serialization.

use crate::{collection::Collection, record::Record};

/// One record, one collection, several collections, or nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    /// No record matched; serializes to `null`.
    Empty,
    Record(Record),
    Collection(Collection),
    /// Several collections serialized into one document.
    Collections(Vec<Collection>),
}

impl Resource {
    pub fn is_empty(&self) -> bool {
        matches!(self, Resource::Empty)
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Resource::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Resource::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn as_collections(&self) -> Option<&[Collection]> {
        match self {
            Resource::Collections(collections) => Some(collections),
            _ => None,
        }
    }

    pub fn into_record(self) -> Option<Record> {
        match self {
            Resource::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn into_collection(self) -> Option<Collection> {
        match self {
            Resource::Collection(collection) => Some(collection),
            _ => None,
        }
    }
}

impl From<Record> for Resource {
    fn from(record: Record) -> Self {
        Resource::Record(record)
    }
}

impl From<&Record> for Resource {
    fn from(record: &Record) -> Self {
        Resource::Record(record.clone())
    }
}

impl From<Option<Record>> for Resource {
    fn from(record: Option<Record>) -> Self {
        record.map_or(Resource::Empty, Resource::Record)
    }
}

impl From<Collection> for Resource {
    fn from(collection: Collection) -> Self {
        Resource::Collection(collection)
    }
}

impl From<&Collection> for Resource {
    fn from(collection: &Collection) -> Self {
        Resource::Collection(collection.clone())
    }
}

impl From<Vec<Collection>> for Resource {
    fn from(collections: Vec<Collection>) -> Self {
        Resource::Collections(collections)
    }
}

impl From<&Resource> for Resource {
    fn from(resource: &Resource) -> Self {
        resource.clone()
    }
}
