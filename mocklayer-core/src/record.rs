//! Record handles and association accessors.
//!
//! A [`Record`] is a handle to one model instance. Saved records hold only
//! their id and read attributes through the store, so two handles to the same
//! row always observe each other's writes. Unsaved records keep their
//! attributes locally until [`Record::save`] inserts them.
//!
//! # Pending references
//!
//! Linking a record to an unsaved parent cannot write a foreign key yet. The
//! child keeps the parent in its pending table and writes `null` for the key;
//! the parent keeps a weak back-reference. When the parent is saved it writes
//! its new id into every child whose pending entry still points at it, exactly
//! once. Reassigning the key before that clears the pending entry.

use serde_json::Value;
use std::{
    cell::RefCell,
    collections::BTreeMap,
    fmt,
    rc::{Rc, Weak},
};
use tracing::debug;

use crate::{
    association::{Association, AssociationKind},
    backend::{ID_FIELD, RecordId, Row, row_from},
    collection::Collection,
    error::{DataLayerError, DataLayerResult},
    query::Filter,
    schema::Schema,
};

/// The state of a singular association's foreign key.
#[derive(Debug, Clone, PartialEq)]
pub enum ForeignKey {
    /// No parent is linked.
    Unset,
    /// Linked to the saved parent with this id.
    Id(RecordId),
    /// Linked to a parent that hasn't been saved yet.
    Pending(Record),
}

/// The value of an association accessor.
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    /// A singular association's parent, if any.
    One(Option<Record>),
    /// A plural association's children.
    Many(Collection),
}

/// Identity of a record, used to deduplicate serialized output.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKey {
    /// A persisted record: `(model, id)`.
    Saved(String, RecordId),
    /// An unsaved record, identified by its handle.
    Unsaved(usize),
}

#[derive(Debug)]
enum RecordState {
    New(Row),
    Saved(RecordId),
}

struct Dependent {
    record: Weak<RefCell<RecordInner>>,
    foreign_key: String,
}

struct RecordInner {
    model: String,
    state: RecordState,
    pending: BTreeMap<String, Record>,
    dependents: Vec<Dependent>,
}

/// A handle to one model instance.
///
/// Cloning a record clones the handle, not the instance.
#[derive(Clone)]
pub struct Record {
    inner: Rc<RefCell<RecordInner>>,
    schema: Schema,
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => {
                let mut debug = f.debug_struct("Record");
                debug.field("model", &inner.model);
                match &inner.state {
                    RecordState::Saved(id) => debug.field("id", id),
                    RecordState::New(attrs) => debug.field("new", attrs),
                };
                debug.finish()
            }
            Err(_) => f.write_str("Record { <borrowed> }"),
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }

        let (a, b) = (self.inner.borrow(), other.inner.borrow());
        match (&a.state, &b.state) {
            (RecordState::Saved(x), RecordState::Saved(y)) => x == y && a.model == b.model,
            _ => false,
        }
    }
}

fn single(field: &str, value: impl Into<Value>) -> Row {
    let mut row = Row::new();
    row.insert(field.to_string(), value.into());
    row
}

impl Record {
    pub(crate) fn new_unsaved(schema: Schema, model: String, attrs: Row) -> Self {
        Self::from_state(schema, model, RecordState::New(attrs))
    }

    pub(crate) fn saved(schema: Schema, model: String, id: RecordId) -> Self {
        Self::from_state(schema, model, RecordState::Saved(id))
    }

    fn from_state(schema: Schema, model: String, state: RecordState) -> Self {
        Record {
            inner: Rc::new(RefCell::new(RecordInner {
                model,
                state,
                pending: BTreeMap::new(),
                dependents: Vec::new(),
            })),
            schema,
        }
    }

    fn from_inner(schema: Schema, inner: Rc<RefCell<RecordInner>>) -> Self {
        Record { inner, schema }
    }

    /// The schema this record belongs to.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn model_name(&self) -> String {
        self.inner.borrow().model.clone()
    }

    /// The record's id, or `None` while it is unsaved.
    pub fn id(&self) -> Option<RecordId> {
        match self.inner.borrow().state {
            RecordState::Saved(id) => Some(id),
            RecordState::New(_) => None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id().is_none()
    }

    pub fn is_saved(&self) -> bool {
        self.id().is_some()
    }

    /// Returns `true` if both handles refer to the same instance.
    pub fn ptr_eq(&self, other: &Record) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The record's identity for deduplication.
    pub fn key(&self) -> RecordKey {
        let inner = self.inner.borrow();
        match inner.state {
            RecordState::Saved(id) => RecordKey::Saved(inner.model.clone(), id),
            RecordState::New(_) => RecordKey::Unsaved(Rc::as_ptr(&self.inner) as usize),
        }
    }

    /// The record's current attributes, `id` included once saved.
    ///
    /// # Errors
    ///
    /// Returns [`DataLayerError::RecordNotFound`] if the saved row was removed
    /// through another handle.
    pub fn attrs(&self) -> DataLayerResult<Row> {
        let (model, id) = {
            let inner = self.inner.borrow();
            match &inner.state {
                RecordState::New(attrs) => return Ok(attrs.clone()),
                RecordState::Saved(id) => (inner.model.clone(), *id),
            }
        };

        let table = self.schema.table_for(&model)?;
        self.schema
            .db()
            .find(table, id)?
            .ok_or_else(|| DataLayerError::RecordNotFound(id, table.to_string()))
    }

    /// Reads one attribute.
    pub fn attr(&self, name: &str) -> DataLayerResult<Option<Value>> {
        Ok(self.attrs()?.remove(name))
    }

    /// Writes one attribute. See [`Record::update`].
    pub fn set(&self, name: &str, value: impl Into<Value>) -> DataLayerResult<()> {
        self.update(single(name, value))
    }

    /// Writes attributes: into the store for saved records, locally otherwise.
    ///
    /// Writing a foreign key directly discards any pending parent for it.
    ///
    /// # Errors
    ///
    /// Returns [`DataLayerError::InvalidAttribute`] if `attrs` contains `id`.
    pub fn update(&self, attrs: Row) -> DataLayerResult<()> {
        if attrs.contains_key(ID_FIELD) {
            return Err(DataLayerError::InvalidAttribute(
                "id is assigned by the record store and cannot be written".into(),
            ));
        }

        {
            let mut inner = self.inner.borrow_mut();
            for key in attrs.keys() {
                inner.pending.remove(key);
            }
        }

        self.write(attrs)
    }

    fn write(&self, attrs: Row) -> DataLayerResult<()> {
        let (model, id) = {
            let mut inner = self.inner.borrow_mut();
            let model = inner.model.clone();
            match &mut inner.state {
                RecordState::New(row) => {
                    row.extend(attrs);
                    return Ok(());
                }
                RecordState::Saved(id) => (model, *id),
            }
        };

        self.schema
            .db()
            .update(self.schema.table_for(&model)?, id, attrs)
    }

    /// Inserts an unsaved record into the store and resolves pending
    /// references held by its dependents. Saving a saved record is a no-op.
    pub fn save(&self) -> DataLayerResult<()> {
        let (model, row) = {
            let inner = self.inner.borrow();
            match &inner.state {
                RecordState::Saved(_) => return Ok(()),
                RecordState::New(row) => (inner.model.clone(), row.clone()),
            }
        };

        let id = self.schema.db().insert(self.schema.table_for(&model)?, row)?;

        let dependents = {
            let mut inner = self.inner.borrow_mut();
            inner.state = RecordState::Saved(id);
            std::mem::take(&mut inner.dependents)
        };

        debug!(model = %model, id, dependents = dependents.len(), "saved record");

        for dependent in dependents {
            if let Some(inner) = dependent.record.upgrade() {
                Record::from_inner(self.schema.clone(), inner).resolve_pending(
                    &dependent.foreign_key,
                    self,
                    id,
                )?;
            }
        }

        Ok(())
    }

    fn resolve_pending(
        &self,
        foreign_key: &str,
        parent: &Record,
        id: RecordId,
    ) -> DataLayerResult<()> {
        let still_pending = {
            let mut inner = self.inner.borrow_mut();
            let matches = inner
                .pending
                .get(foreign_key)
                .is_some_and(|pending| pending.ptr_eq(parent));
            if matches {
                inner.pending.remove(foreign_key);
            }
            matches
        };

        if !still_pending {
            return Ok(());
        }

        debug!(model = %self.model_name(), foreign_key, id, "resolved pending reference");
        self.write(single(foreign_key, id))
    }

    /// Removes a saved record's row. The handle reverts to an unsaved record
    /// holding its last attributes without `id`. Destroying an unsaved record
    /// is a no-op.
    pub fn destroy(&self) -> DataLayerResult<()> {
        let (model, id) = {
            let inner = self.inner.borrow();
            match inner.state {
                RecordState::New(_) => return Ok(()),
                RecordState::Saved(id) => (inner.model.clone(), id),
            }
        };

        let table = self.schema.table_for(&model)?;
        let mut row = self.schema.db().find(table, id)?.unwrap_or_default();
        self.schema.db().remove(table, id)?;
        row.remove(ID_FIELD);

        debug!(model = %model, id, "destroyed record");
        self.inner.borrow_mut().state = RecordState::New(row);

        Ok(())
    }

    fn association(&self, name: &str, kind: AssociationKind) -> DataLayerResult<&Association> {
        let assoc = self.schema.association(&self.model_name(), name)?;

        if assoc.kind() != kind {
            return Err(DataLayerError::AssociationKind(
                assoc.owner().to_string(),
                assoc.name().to_string(),
            ));
        }

        Ok(assoc)
    }

    fn check_target(assoc: &Association, record: &Record) -> DataLayerResult<()> {
        let model = record.model_name();

        if model != assoc.target() {
            return Err(DataLayerError::AssociationTarget(
                format!("{}.{}", assoc.owner(), assoc.name()),
                assoc.target().to_string(),
                model,
            ));
        }

        Ok(())
    }

    fn foreign_key_of(&self, assoc: &Association) -> DataLayerResult<ForeignKey> {
        if let Some(parent) = self.inner.borrow().pending.get(assoc.foreign_key()) {
            return Ok(ForeignKey::Pending(parent.clone()));
        }

        Ok(self
            .attr(assoc.foreign_key())?
            .and_then(|value| value.as_u64())
            .map_or(ForeignKey::Unset, ForeignKey::Id))
    }

    /// The state of a singular association's foreign key.
    pub fn foreign_key(&self, name: &str) -> DataLayerResult<ForeignKey> {
        let assoc = self.association(name, AssociationKind::Singular)?;
        self.foreign_key_of(assoc)
    }

    /// The saved parent's id, if the association is linked to one.
    pub fn related_id(&self, name: &str) -> DataLayerResult<Option<RecordId>> {
        Ok(match self.foreign_key(name)? {
            ForeignKey::Id(id) => Some(id),
            ForeignKey::Unset | ForeignKey::Pending(_) => None,
        })
    }

    /// Reads a singular association.
    ///
    /// A pending parent is returned as is. A foreign key naming a row that
    /// no longer exists reads as `None`.
    pub fn get_related(&self, name: &str) -> DataLayerResult<Option<Record>> {
        let assoc = self.association(name, AssociationKind::Singular)?;

        match self.foreign_key_of(assoc)? {
            ForeignKey::Pending(parent) => Ok(Some(parent)),
            ForeignKey::Id(id) => self.schema.find(assoc.target(), id),
            ForeignKey::Unset => Ok(None),
        }
    }

    /// Links or unlinks a singular association.
    ///
    /// # Errors
    ///
    /// Returns [`DataLayerError::AssociationTarget`] if `parent` is of the wrong model.
    pub fn set_related(&self, name: &str, parent: Option<&Record>) -> DataLayerResult<()> {
        let assoc = self.association(name, AssociationKind::Singular)?;

        if let Some(parent) = parent {
            Self::check_target(assoc, parent)?;
        }

        self.link(assoc.foreign_key(), parent)
    }

    fn link(&self, foreign_key: &str, parent: Option<&Record>) -> DataLayerResult<()> {
        self.inner.borrow_mut().pending.remove(foreign_key);

        let Some(parent) = parent else {
            return self.write(single(foreign_key, Value::Null));
        };

        if let Some(id) = parent.id() {
            return self.write(single(foreign_key, id));
        }

        self.inner
            .borrow_mut()
            .pending
            .insert(foreign_key.to_string(), parent.clone());

        {
            let mut parent_inner = parent.inner.borrow_mut();
            parent_inner
                .dependents
                .retain(|dependent| dependent.record.strong_count() > 0);

            let known = parent_inner.dependents.iter().any(|dependent| {
                dependent.foreign_key == foreign_key
                    && dependent
                        .record
                        .upgrade()
                        .is_some_and(|inner| Rc::ptr_eq(&inner, &self.inner))
            });

            if !known {
                parent_inner.dependents.push(Dependent {
                    record: Rc::downgrade(&self.inner),
                    foreign_key: foreign_key.to_string(),
                });
            }
        }

        self.write(single(foreign_key, Value::Null))
    }

    /// Reads a plural association.
    ///
    /// Saved owners query the target table by foreign key. Unsaved owners
    /// return the children currently pending on them.
    pub fn get_related_many(&self, name: &str) -> DataLayerResult<Collection> {
        let assoc = self.association(name, AssociationKind::Plural)?;

        match self.id() {
            Some(id) => self
                .schema
                .filter(assoc.target(), &Filter::eq(assoc.foreign_key(), id)),
            None => {
                let children = self.pending_children(assoc.target(), assoc.foreign_key());
                Ok(Collection::new(self.schema.clone(), assoc.target(), children))
            }
        }
    }

    fn pending_children(&self, model: &str, foreign_key: &str) -> Vec<Record> {
        let candidates: Vec<_> = self
            .inner
            .borrow()
            .dependents
            .iter()
            .filter(|dependent| dependent.foreign_key == foreign_key)
            .filter_map(|dependent| dependent.record.upgrade())
            .collect();

        let mut children: Vec<Record> = Vec::new();

        for inner in candidates {
            let child = Record::from_inner(self.schema.clone(), inner);

            if child.model_name() != model || children.iter().any(|known| known.ptr_eq(&child)) {
                continue;
            }

            let points_here = child
                .inner
                .borrow()
                .pending
                .get(foreign_key)
                .is_some_and(|parent| parent.ptr_eq(self));

            if points_here {
                children.push(child);
            }
        }

        children
    }

    /// The ids of a plural association's saved children.
    pub fn related_ids(&self, name: &str) -> DataLayerResult<Vec<RecordId>> {
        Ok(self.get_related_many(name)?.ids())
    }

    /// Replaces a plural association's children.
    ///
    /// Children no longer listed have their foreign key cleared; listed
    /// children are linked to this record.
    pub fn set_related_many(&self, name: &str, children: &[Record]) -> DataLayerResult<()> {
        let assoc = self.association(name, AssociationKind::Plural)?;

        for child in children {
            Self::check_target(assoc, child)?;
        }

        for previous in self.get_related_many(name)?.iter() {
            if !children.iter().any(|child| child == previous) {
                previous.link(assoc.foreign_key(), None)?;
            }
        }

        for child in children {
            child.link(assoc.foreign_key(), Some(self))?;
        }

        Ok(())
    }

    /// Reads any association.
    pub fn related(&self, name: &str) -> DataLayerResult<Related> {
        match self.schema.association(&self.model_name(), name)?.kind() {
            AssociationKind::Singular => self.get_related(name).map(Related::One),
            AssociationKind::Plural => self.get_related_many(name).map(Related::Many),
        }
    }

    /// Builds an unsaved related record and links it.
    ///
    /// For a plural association the new child points at this record; for a
    /// singular one this record points at the new parent.
    pub fn new_related(&self, name: &str, attrs: Value) -> DataLayerResult<Record> {
        self.build_related(name, attrs, false)
    }

    /// Like [`Record::new_related`], but saves the new record.
    pub fn create_related(&self, name: &str, attrs: Value) -> DataLayerResult<Record> {
        self.build_related(name, attrs, true)
    }

    fn build_related(&self, name: &str, attrs: Value, save: bool) -> DataLayerResult<Record> {
        let assoc = self.schema.association(&self.model_name(), name)?;
        let related = Record::new_unsaved(
            self.schema.clone(),
            assoc.target().to_string(),
            row_from(attrs)?,
        );

        match assoc.kind() {
            AssociationKind::Plural => {
                related.link(assoc.foreign_key(), Some(self))?;
                if save {
                    related.save()?;
                }
            }
            AssociationKind::Singular => {
                if save {
                    related.save()?;
                }
                self.link(assoc.foreign_key(), Some(&related))?;
            }
        }

        Ok(related)
    }
}
