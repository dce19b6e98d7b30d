//! Record store abstraction for the data layer.
//!
//! The [`RecordStore`] trait is the flat, relationship-unaware storage the
//! association engine reads and writes through. Tables hold plain attribute
//! maps ([`Row`]) keyed by integer ids that the store assigns on insert.
//!
//! # Traits
//!
//! - [`RecordStore`]: raw create/read/update/delete over untyped keyed tables
//! - [`RecordStoreBuilder`]: factory trait for creating store instances
//!
//! # Examples
//!
//! ```ignore
//! use mocklayer::backend::RecordStore;
//! use serde_json::json;
//!
//! let db = InMemoryDb::new();
//! let id = db.insert("authors", row_from(json!({ "name": "Link" }))?)?;
//! assert_eq!(db.find("authors", id)?.unwrap()["name"], "Link");
//! ```

use serde_json::{Map, Value};
use std::fmt::Debug;

use crate::{
    error::{DataLayerError, DataLayerResult},
    query::Expr,
};

/// Integer id assigned to a row by the record store.
pub type RecordId = u64;

/// An untyped row: attribute name to JSON value.
pub type Row = Map<String, Value>;

/// Name of the primary key attribute every persisted row carries.
pub const ID_FIELD: &str = "id";

/// Abstract interface for flat record storage.
///
/// Implementations keep one table per pluralized model name. Rows are
/// returned in store order (ascending id for the bundled in-memory store),
/// never in request order.
///
/// # Interior mutability
///
/// Every method takes `&self`; the data layer is single-threaded and shares
/// one store between all records through the schema, so implementations
/// manage their own mutability.
///
/// # Error Handling
///
/// Reads of a missing table or id are not errors: they return `None` or an
/// empty vector. Writes addressing a missing row return
/// [`DataLayerError::RecordNotFound`].
pub trait RecordStore: Debug {
    /// Inserts a row into a table and returns its id.
    ///
    /// If the row carries an integer `id` that id is used, otherwise the next
    /// free id is assigned. The table is created if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`DataLayerError::RecordAlreadyExists`] if the id is taken.
    fn insert(&self, table: &str, row: Row) -> DataLayerResult<RecordId>;

    /// Retrieves one row by id, or `None` if it doesn't exist.
    fn find(&self, table: &str, id: RecordId) -> DataLayerResult<Option<Row>>;

    /// Retrieves the rows whose ids are listed, in store order.
    ///
    /// Ids with no matching row are skipped.
    fn find_many(&self, table: &str, ids: &[RecordId]) -> DataLayerResult<Vec<Row>>;

    /// Returns every row of a table in store order.
    fn all(&self, table: &str) -> DataLayerResult<Vec<Row>>;

    /// Returns the rows matching `filter`, in store order.
    fn query(&self, table: &str, filter: &Expr) -> DataLayerResult<Vec<Row>>;

    /// Merges `patch` into an existing row. The `id` attribute is never patched.
    ///
    /// # Errors
    ///
    /// Returns [`DataLayerError::RecordNotFound`] if the row doesn't exist.
    fn update(&self, table: &str, id: RecordId, patch: Row) -> DataLayerResult<()>;

    /// Removes a row.
    ///
    /// # Errors
    ///
    /// Returns [`DataLayerError::RecordNotFound`] if the row doesn't exist.
    fn remove(&self, table: &str, id: RecordId) -> DataLayerResult<()>;

    /// Creates an empty table. Creating an existing table is a no-op.
    fn create_table(&self, table: &str) -> DataLayerResult<()>;

    /// Drops a table and all its rows.
    ///
    /// # Errors
    ///
    /// Returns [`DataLayerError::TableNotFound`] if the table doesn't exist.
    fn drop_table(&self, table: &str) -> DataLayerResult<()>;

    /// Lists table names in sorted order.
    fn list_tables(&self) -> DataLayerResult<Vec<String>>;

    /// Bulk-inserts fixture rows, keeping the ids they carry.
    fn load_rows(&self, table: &str, rows: Vec<Row>) -> DataLayerResult<()> {
        for row in rows {
            self.insert(table, row)?;
        }

        Ok(())
    }

    /// Removes every row from every table, keeping the tables and resetting id counters.
    fn empty(&self) -> DataLayerResult<()>;
}

impl<S> RecordStore for &S
where
    S: RecordStore,
{
    fn insert(&self, table: &str, row: Row) -> DataLayerResult<RecordId> {
        (*self).insert(table, row)
    }

    fn find(&self, table: &str, id: RecordId) -> DataLayerResult<Option<Row>> {
        (*self).find(table, id)
    }

    fn find_many(&self, table: &str, ids: &[RecordId]) -> DataLayerResult<Vec<Row>> {
        (*self).find_many(table, ids)
    }

    fn all(&self, table: &str) -> DataLayerResult<Vec<Row>> {
        (*self).all(table)
    }

    fn query(&self, table: &str, filter: &Expr) -> DataLayerResult<Vec<Row>> {
        (*self).query(table, filter)
    }

    fn update(&self, table: &str, id: RecordId, patch: Row) -> DataLayerResult<()> {
        (*self).update(table, id, patch)
    }

    fn remove(&self, table: &str, id: RecordId) -> DataLayerResult<()> {
        (*self).remove(table, id)
    }

    fn create_table(&self, table: &str) -> DataLayerResult<()> {
        (*self).create_table(table)
    }

    fn drop_table(&self, table: &str) -> DataLayerResult<()> {
        (*self).drop_table(table)
    }

    fn list_tables(&self) -> DataLayerResult<Vec<String>> {
        (*self).list_tables()
    }

    fn load_rows(&self, table: &str, rows: Vec<Row>) -> DataLayerResult<()> {
        (*self).load_rows(table, rows)
    }

    fn empty(&self) -> DataLayerResult<()> {
        (*self).empty()
    }
}

/// Factory trait for record stores that need setup before use.
pub trait RecordStoreBuilder {
    type Store: RecordStore;

    fn build(self) -> DataLayerResult<Self::Store>;
}

/// Reads the integer `id` attribute of a row.
pub fn row_id(row: &Row) -> Option<RecordId> {
    row.get(ID_FIELD).and_then(Value::as_u64)
}

/// Converts a JSON object into a [`Row`].
///
/// # Errors
///
/// Returns [`DataLayerError::InvalidAttribute`] if the value is not an object.
pub fn row_from(value: Value) -> DataLayerResult<Row> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Row::new()),
        other => Err(DataLayerError::InvalidAttribute(format!(
            "expected an attribute object, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_from_accepts_objects_and_null() {
        assert_eq!(row_from(json!({ "a": 1 })).unwrap().len(), 1);
        assert!(row_from(Value::Null).unwrap().is_empty());
        assert!(matches!(row_from(json!([1])), Err(DataLayerError::InvalidAttribute(_))));
    }

    #[test]
    fn row_id_reads_integer_ids_only() {
        assert_eq!(row_id(&row_from(json!({ "id": 4 })).unwrap()), Some(4));
        assert_eq!(row_id(&row_from(json!({ "id": "4" })).unwrap()), None);
        assert_eq!(row_id(&Row::new()), None);
    }
}
