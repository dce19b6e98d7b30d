//! Ordered sequences of records of one model.

use serde_json::Value;
use std::{collections::BTreeSet, fmt, ops::Index};

use crate::{
    backend::{RecordId, Row, row_from},
    error::DataLayerResult,
    record::{Record, Related},
    schema::Schema,
};

/// An ordered list of records of one model.
///
/// Collections returned by the schema follow store order. Bulk operations
/// apply to each member in order and stop at the first error.
#[derive(Clone)]
pub struct Collection {
    schema: Schema,
    model: String,
    records: Vec<Record>,
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("model", &self.model)
            .field("records", &self.records)
            .finish()
    }
}

impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        self.model == other.model && self.records == other.records
    }
}

impl Collection {
    pub(crate) fn new(schema: Schema, model: impl Into<String>, records: Vec<Record>) -> Self {
        Collection {
            schema,
            model: model.into(),
            records,
        }
    }

    /// The model every member belongs to.
    pub fn model_name(&self) -> &str {
        &self.model
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&Record> {
        self.records.last()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Ids of the saved members, in order.
    pub fn ids(&self) -> Vec<RecordId> {
        self.records.iter().filter_map(Record::id).collect()
    }

    /// Attributes of every member, in order.
    pub fn attrs(&self) -> DataLayerResult<Vec<Row>> {
        self.records.iter().map(Record::attrs).collect()
    }

    /// Members matching `predicate`, in order.
    pub fn filter<F>(&self, mut predicate: F) -> Collection
    where
        F: FnMut(&Record) -> bool,
    {
        let records = self
            .records
            .iter()
            .filter(|record| predicate(*record))
            .cloned()
            .collect();

        Collection::new(self.schema.clone(), self.model.clone(), records)
    }

    /// The union of every member's `name` association, each record once,
    /// in first-seen order.
    pub fn related(&self, name: &str) -> DataLayerResult<Collection> {
        let target = self.schema.association(&self.model, name)?.target().to_string();
        let mut seen = BTreeSet::new();
        let mut records = Vec::new();

        for record in &self.records {
            let related: Vec<Record> = match record.related(name)? {
                Related::One(parent) => parent.into_iter().collect(),
                Related::Many(children) => children.into_records(),
            };

            for other in related {
                if seen.insert(other.key()) {
                    records.push(other);
                }
            }
        }

        Ok(Collection::new(self.schema.clone(), target, records))
    }

    /// Writes the same attributes to every member.
    pub fn update_all(&self, attrs: Value) -> DataLayerResult<()> {
        let attrs = row_from(attrs)?;

        for record in &self.records {
            record.update(attrs.clone())?;
        }

        Ok(())
    }

    /// Saves every unsaved member.
    pub fn save_all(&self) -> DataLayerResult<()> {
        self.records.iter().try_for_each(Record::save)
    }

    /// Destroys every member.
    pub fn destroy_all(&self) -> DataLayerResult<()> {
        self.records.iter().try_for_each(Record::destroy)
    }
}

impl Index<usize> for Collection {
    type Output = Record;

    fn index(&self, index: usize) -> &Record {
        &self.records[index]
    }
}

impl IntoIterator for Collection {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
