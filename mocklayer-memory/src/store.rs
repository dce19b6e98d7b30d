//! In-memory record store.
//!
//! Tables are `BTreeMap`s keyed by record id, so store order is ascending id.

use serde_json::Value;
use std::{cell::RefCell, collections::BTreeMap, rc::Rc};
use tracing::trace;

use mocklayer_core::{
    backend::{ID_FIELD, RecordId, RecordStore, RecordStoreBuilder, Row, row_from},
    error::{DataLayerError, DataLayerResult},
    query::{Expr, Filter},
};

use crate::evaluator::RowEvaluator;

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<RecordId, Row>,
    /// Highest id ever assigned or loaded since the last reset.
    last_id: RecordId,
}

type TableMap = BTreeMap<String, Table>;

/// Single-threaded in-memory record store.
///
/// `InMemoryDb` is cloneable; clones share the same tables, so a schema and
/// a test can hold the same database and observe each other's writes.
///
/// # Example
///
/// ```ignore
/// use mocklayer_memory::InMemoryDb;
/// use mocklayer::backend::{RecordStore, row_from};
/// use serde_json::json;
///
/// let db = InMemoryDb::new();
/// let id = db.insert("authors", row_from(json!({ "name": "Link" }))?)?;
/// assert_eq!(id, 1);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryDb {
    tables: Rc<RefCell<TableMap>>,
}

impl InMemoryDb {
    /// Creates a new empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for seeding a database with fixtures.
    pub fn builder() -> InMemoryDbBuilder {
        InMemoryDbBuilder::default()
    }

    /// Number of rows in a table; `0` for a missing table.
    pub fn count(&self, table: &str) -> usize {
        self.tables
            .borrow()
            .get(table)
            .map_or(0, |table| table.rows.len())
    }
}

impl RecordStore for InMemoryDb {
    fn insert(&self, table: &str, mut row: Row) -> DataLayerResult<RecordId> {
        let mut tables = self.tables.borrow_mut();
        let entry = tables.entry(table.to_string()).or_default();

        let id = match row.get(ID_FIELD) {
            None | Some(Value::Null) => entry.last_id + 1,
            Some(value) => value.as_u64().ok_or_else(|| {
                let message = format!("id must be a positive integer, got {value}");
                DataLayerError::InvalidAttribute(message)
            })?,
        };

        if entry.rows.contains_key(&id) {
            return Err(DataLayerError::RecordAlreadyExists(id, table.to_string()));
        }

        row.insert(ID_FIELD.to_string(), Value::from(id));
        entry.rows.insert(id, row);
        entry.last_id = entry.last_id.max(id);

        trace!(table, id, "inserted row");
        Ok(id)
    }

    fn find(&self, table: &str, id: RecordId) -> DataLayerResult<Option<Row>> {
        Ok(self
            .tables
            .borrow()
            .get(table)
            .and_then(|table| table.rows.get(&id))
            .cloned())
    }

    fn find_many(&self, table: &str, ids: &[RecordId]) -> DataLayerResult<Vec<Row>> {
        self.query(table, &Filter::any_of(ID_FIELD, ids.iter().copied()))
    }

    fn all(&self, table: &str) -> DataLayerResult<Vec<Row>> {
        Ok(self
            .tables
            .borrow()
            .get(table)
            .map(|table| table.rows.values().cloned().collect())
            .unwrap_or_default())
    }

    fn query(&self, table: &str, filter: &Expr) -> DataLayerResult<Vec<Row>> {
        let tables = self.tables.borrow();
        let Some(entry) = tables.get(table) else {
            return Ok(vec![]);
        };

        let rows = RowEvaluator::filter_rows(entry.rows.values(), filter);
        trace!(table, matched = rows.len(), "queried rows");

        Ok(rows)
    }

    fn update(&self, table: &str, id: RecordId, mut patch: Row) -> DataLayerResult<()> {
        let mut tables = self.tables.borrow_mut();
        let row = tables
            .get_mut(table)
            .and_then(|entry| entry.rows.get_mut(&id))
            .ok_or_else(|| DataLayerError::RecordNotFound(id, table.to_string()))?;

        patch.remove(ID_FIELD);
        trace!(table, id, fields = patch.len(), "updated row");
        row.extend(patch);

        Ok(())
    }

    fn remove(&self, table: &str, id: RecordId) -> DataLayerResult<()> {
        let mut tables = self.tables.borrow_mut();
        let removed = tables
            .get_mut(table)
            .and_then(|entry| entry.rows.remove(&id));

        if removed.is_none() {
            return Err(DataLayerError::RecordNotFound(id, table.to_string()));
        }

        trace!(table, id, "removed row");
        Ok(())
    }

    fn create_table(&self, table: &str) -> DataLayerResult<()> {
        self.tables
            .borrow_mut()
            .entry(table.to_string())
            .or_default();

        Ok(())
    }

    fn drop_table(&self, table: &str) -> DataLayerResult<()> {
        if self.tables.borrow_mut().remove(table).is_none() {
            return Err(DataLayerError::TableNotFound(table.to_string()));
        }

        Ok(())
    }

    fn list_tables(&self) -> DataLayerResult<Vec<String>> {
        Ok(self.tables.borrow().keys().cloned().collect())
    }

    fn empty(&self) -> DataLayerResult<()> {
        for table in self.tables.borrow_mut().values_mut() {
            *table = Table::default();
        }

        trace!("emptied all tables");
        Ok(())
    }
}

/// Builder for [`InMemoryDb`] instances, optionally seeded with fixtures.
///
/// ```ignore
/// use mocklayer::backend::RecordStoreBuilder;
///
/// let db = InMemoryDb::builder()
///     .with_fixtures(json!({ "authors": [{ "id": 1, "name": "Link" }] }))
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryDbBuilder {
    fixtures: Vec<(String, Vec<Value>)>,
}

impl InMemoryDbBuilder {
    /// Adds fixture rows from an object mapping table names to arrays of rows.
    /// Values that don't have that shape are rejected at build time.
    pub fn with_fixtures(mut self, fixtures: Value) -> Self {
        match fixtures {
            Value::Object(tables) => {
                for (table, rows) in tables {
                    let rows = match rows {
                        Value::Array(rows) => rows,
                        other => vec![other],
                    };
                    self.fixtures.push((table, rows));
                }
            }
            other => self.fixtures.push((String::new(), vec![other])),
        }

        self
    }

    /// Adds fixture rows for one table.
    pub fn with_table(mut self, table: impl Into<String>, rows: Vec<Value>) -> Self {
        self.fixtures.push((table.into(), rows));
        self
    }
}

impl RecordStoreBuilder for InMemoryDbBuilder {
    type Store = InMemoryDb;

    /// Builds the database and loads every fixture row, keeping their ids.
    ///
    /// # Errors
    ///
    /// Returns [`DataLayerError::InvalidAttribute`] for fixtures that aren't
    /// row objects, and [`DataLayerError::RecordAlreadyExists`] for duplicate ids.
    fn build(self) -> DataLayerResult<Self::Store> {
        let db = InMemoryDb::new();

        for (table, rows) in self.fixtures {
            if table.is_empty() {
                return Err(DataLayerError::InvalidAttribute(
                    "fixtures must map table names to arrays of rows".into(),
                ));
            }

            let rows = rows
                .into_iter()
                .map(row_from)
                .collect::<DataLayerResult<Vec<_>>>()?;
            db.load_rows(&table, rows)?;
        }

        Ok(db)
    }
}
