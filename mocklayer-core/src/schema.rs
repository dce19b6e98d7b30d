//! Model registry and record factory.
//!
//! A [`Schema`] owns the record store and one immutable table of model
//! definitions, built once by [`SchemaBuilder`]. It is a cheap, clonable
//! handle: every [`Record`] and [`Collection`] carries a clone and reads
//! association descriptors from the shared table by name.
//!
//! # Example
//!
//! ```ignore
//! use mocklayer::prelude::*;
//! use mocklayer::memory::InMemoryDb;
//! use serde_json::json;
//!
//! let schema = Schema::builder()
//!     .model("author", [has_many("posts")])
//!     .model("post", [belongs_to("author")])
//!     .build(InMemoryDb::new())?;
//!
//! let link = schema.create("author", json!({ "name": "Link" }))?;
//! link.create_related("posts", json!({ "title": "Lorem" }))?;
//! assert_eq!(schema.all("post")?.len(), 1);
//! ```

use serde_json::Value;
use std::{collections::BTreeMap, fmt, rc::Rc};
use tracing::debug;

use crate::{
    association::{Association, AssociationDef},
    backend::{RecordId, RecordStore, Row, row_from, row_id},
    collection::Collection,
    error::{DataLayerError, DataLayerResult},
    inflector::{pluralize, singularize},
    query::Expr,
    record::Record,
    request::Request,
    resource::Resource,
    shorthand::{self, RequestTarget, ShorthandOptions},
};

/// A registered model: its name, backing table and resolved associations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDefinition {
    name: String,
    table: String,
    associations: Vec<Association>,
}

impl ModelDefinition {
    /// The singular model name (`author`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The pluralized table name (`authors`).
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Associations in declaration order.
    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    pub fn association(&self, name: &str) -> Option<&Association> {
        self.associations
            .iter()
            .find(|assoc| assoc.name() == name)
    }
}

/// Collects model declarations and validates them into a [`Schema`].
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    models: Vec<(String, Vec<AssociationDef>)>,
}

impl SchemaBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a model and its associations.
    ///
    /// # Arguments
    ///
    /// * `name` - The singular model name; its table is the plural form
    /// * `associations` - [`belongs_to`](crate::association::belongs_to) and
    ///   [`has_many`](crate::association::has_many) declarations
    pub fn model(
        mut self,
        name: impl Into<String>,
        associations: impl IntoIterator<Item = AssociationDef>,
    ) -> Self {
        self.models
            .push((name.into(), associations.into_iter().collect()));
        self
    }

    /// Validates the declarations and builds the schema over `store`.
    ///
    /// A table is created in the store for every model.
    ///
    /// # Errors
    ///
    /// Returns [`DataLayerError::InvalidSchema`] for duplicate models, duplicate
    /// association names on one model, or associations targeting undeclared models.
    pub fn build<S: RecordStore + 'static>(self, store: S) -> DataLayerResult<Schema> {
        let declared: Vec<(String, String)> = self
            .models
            .iter()
            .map(|(name, _)| (name.clone(), pluralize(name)))
            .collect();
        let mut models = BTreeMap::new();

        for (name, defs) in self.models {
            if name.is_empty() {
                return Err(DataLayerError::InvalidSchema("model names cannot be empty".into()));
            }

            let mut associations: Vec<Association> = Vec::with_capacity(defs.len());

            for def in defs {
                if associations.iter().any(|assoc| assoc.name() == def.name()) {
                    return Err(DataLayerError::InvalidSchema(format!(
                        "model {name} declares association {} twice",
                        def.name()
                    )));
                }

                associations.push(def.resolve(&name, |word| {
                    model_name_for(
                        declared.iter().map(|(model, table)| (model.as_str(), table.as_str())),
                        word,
                    )
                }));
            }

            let definition = ModelDefinition {
                table: pluralize(&name),
                name: name.clone(),
                associations,
            };

            if models.insert(name.clone(), definition).is_some() {
                return Err(DataLayerError::InvalidSchema(format!(
                    "model {name} is declared twice"
                )));
            }
        }

        for definition in models.values() {
            for assoc in definition.associations() {
                if !models.contains_key(assoc.target()) {
                    return Err(DataLayerError::InvalidSchema(format!(
                        "association {}.{} targets undeclared model {}",
                        definition.name(),
                        assoc.name(),
                        assoc.target()
                    )));
                }
            }
        }

        for definition in models.values() {
            store.create_table(definition.table())?;
        }

        debug!(models = models.len(), "schema built");

        Ok(Schema {
            inner: Rc::new(SchemaInner {
                db: Box::new(store),
                models,
            }),
        })
    }
}

struct SchemaInner {
    db: Box<dyn RecordStore>,
    models: BTreeMap<String, ModelDefinition>,
}

/// The model registry bound to a record store.
#[derive(Clone)]
pub struct Schema {
    inner: Rc<SchemaInner>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("db", &self.inner.db)
            .field("models", &self.inner.models.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Schema {
    /// Creates a new schema builder.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// The underlying record store.
    pub fn db(&self) -> &dyn RecordStore {
        &*self.inner.db
    }

    /// Returns `true` if both handles refer to the same schema.
    pub fn ptr_eq(&self, other: &Schema) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Iterates model definitions in name order.
    pub fn models(&self) -> impl Iterator<Item = &ModelDefinition> {
        self.inner.models.values()
    }

    pub fn has_model(&self, name: &str) -> bool {
        self.inner.models.contains_key(name)
    }

    /// Looks up a model definition.
    ///
    /// # Errors
    ///
    /// Returns [`DataLayerError::UnknownModel`] if the model isn't registered.
    pub fn model(&self, name: &str) -> DataLayerResult<&ModelDefinition> {
        self.inner
            .models
            .get(name)
            .ok_or_else(|| DataLayerError::UnknownModel(name.to_string()))
    }

    /// Looks up the association `name` declared on `model`.
    ///
    /// # Errors
    ///
    /// Returns [`DataLayerError::UnknownModel`] or [`DataLayerError::UnknownAssociation`].
    pub fn association(&self, model: &str, name: &str) -> DataLayerResult<&Association> {
        self.model(model)?
            .association(name)
            .ok_or_else(|| DataLayerError::UnknownAssociation(model.to_string(), name.to_string()))
    }

    /// Maps a model or table name, as found in URLs and association names,
    /// to a registered model. Names matching no model or table are singularized.
    ///
    /// ```ignore
    /// assert_eq!(schema.model_name_for("movies"), "movie");
    /// ```
    pub fn model_name_for(&self, word: &str) -> String {
        model_name_for(self.models().map(|model| (model.name(), model.table())), word)
    }

    /// The table backing `model`.
    pub fn table_for(&self, model: &str) -> DataLayerResult<&str> {
        Ok(self.model(model)?.table())
    }

    /// Builds an unsaved record from a JSON attribute object.
    pub fn new_record(&self, model: &str, attrs: Value) -> DataLayerResult<Record> {
        self.model(model)?;

        Ok(Record::new_unsaved(self.clone(), model.to_string(), row_from(attrs)?))
    }

    /// Builds and saves a record.
    pub fn create(&self, model: &str, attrs: Value) -> DataLayerResult<Record> {
        let record = self.new_record(model, attrs)?;
        record.save()?;

        Ok(record)
    }

    /// Finds one record by id, or `None` if no row has that id.
    pub fn find(&self, model: &str, id: RecordId) -> DataLayerResult<Option<Record>> {
        let table = self.table_for(model)?;

        Ok(self
            .db()
            .find(table, id)?
            .map(|_| Record::saved(self.clone(), model.to_string(), id)))
    }

    /// Finds the records whose ids are listed, in store order. Unknown ids are skipped.
    pub fn find_many(&self, model: &str, ids: &[RecordId]) -> DataLayerResult<Collection> {
        let rows = self.db().find_many(self.table_for(model)?, ids)?;

        Ok(self.collection_from_rows(model, rows))
    }

    /// Every record of `model` in store order.
    pub fn all(&self, model: &str) -> DataLayerResult<Collection> {
        let rows = self.db().all(self.table_for(model)?)?;

        Ok(self.collection_from_rows(model, rows))
    }

    /// The first record of `model` in store order.
    pub fn first(&self, model: &str) -> DataLayerResult<Option<Record>> {
        Ok(self.all(model)?.first().cloned())
    }

    /// Records of `model` whose rows match `filter`, in store order.
    pub fn filter(&self, model: &str, filter: &Expr) -> DataLayerResult<Collection> {
        let rows = self.db().query(self.table_for(model)?, filter)?;

        Ok(self.collection_from_rows(model, rows))
    }

    /// Wraps already-loaded records of one model into a collection.
    ///
    /// # Errors
    ///
    /// Returns [`DataLayerError::UnknownModel`] if `model` isn't registered,
    /// or [`DataLayerError::AssociationTarget`] if a record is of another model.
    pub fn collection(&self, model: &str, records: Vec<Record>) -> DataLayerResult<Collection> {
        self.model(model)?;

        if let Some(stray) = records.iter().find(|record| record.model_name() != model) {
            return Err(DataLayerError::AssociationTarget(
                "collection".into(),
                model.to_string(),
                stray.model_name(),
            ));
        }

        Ok(Collection::new(self.clone(), model, records))
    }

    /// Loads fixture rows, keeping their ids.
    ///
    /// `data` is an object mapping table names to arrays of row objects:
    /// `{ "authors": [{ "id": 1, "name": "Link" }] }`.
    pub fn load_data(&self, data: Value) -> DataLayerResult<()> {
        let Value::Object(tables) = data else {
            return Err(DataLayerError::InvalidAttribute(
                "fixture data must map table names to arrays of rows".into(),
            ));
        };

        for (table, rows) in tables {
            let Value::Array(rows) = rows else {
                return Err(DataLayerError::InvalidAttribute(format!(
                    "fixtures for table {table} must be an array"
                )));
            };

            let rows = rows
                .into_iter()
                .map(row_from)
                .collect::<DataLayerResult<Vec<Row>>>()?;

            debug!(table = %table, count = rows.len(), "loading fixtures");
            self.db().load_rows(&table, rows)?;
        }

        Ok(())
    }

    /// Removes every row from the store.
    pub fn empty_data(&self) -> DataLayerResult<()> {
        self.db().empty()
    }

    /// Resolves a shorthand request against this schema.
    ///
    /// See [`shorthand::resolve`].
    pub fn resolve(
        &self,
        target: &RequestTarget,
        request: &Request,
        options: &ShorthandOptions,
    ) -> DataLayerResult<Resource> {
        shorthand::resolve(target, self, request, options)
    }

    fn collection_from_rows(&self, model: &str, rows: Vec<Row>) -> Collection {
        let records = rows
            .iter()
            .filter_map(row_id)
            .map(|id| Record::saved(self.clone(), model.to_string(), id))
            .collect();

        Collection::new(self.clone(), model, records)
    }
}

fn model_name_for<'a>(
    models: impl IntoIterator<Item = (&'a str, &'a str)>,
    word: &str,
) -> String {
    let mut by_table = None;

    for (name, table) in models {
        if name == word {
            return name.to_string();
        }
        if table == word && by_table.is_none() {
            by_table = Some(name);
        }
    }

    by_table.map_or_else(|| singularize(word), str::to_string)
}
