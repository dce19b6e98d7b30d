//! Per-model serializers producing JSON documents.
//!
//! The registry turns a [`Resource`] into a document shaped the way
//! REST-style front-end adapters expect:
//!
//! ```json
//! {
//!   "author": { "id": 1, "name": "Link", "post_ids": [1, 2] },
//!   "posts": [
//!     { "id": 1, "title": "Lorem", "author_id": 1 },
//!     { "id": 2, "title": "Ipsum", "author_id": 1 }
//!   ]
//! }
//! ```
//!
//! # Primary resources
//!
//! A record serializes under its model name and a collection under the
//! pluralized name. Primary resources carry the foreign key of every singular
//! association and a `{name}_ids` key for every plural one.
//!
//! # Relationships
//!
//! Only the associations listed in a model's [`SerializerConfig`] are
//! traversed. By default related records are sideloaded into top-level arrays
//! keyed by the pluralized target model, each record once, in the order a
//! depth-first walk first reaches it. With `embed` set they are nested under
//! the association name instead.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, trace};

use crate::{
    collection::Collection,
    error::{DataLayerError, DataLayerResult},
    inflector::pluralize,
    record::{Record, RecordKey, Related},
    resource::Resource,
    schema::Schema,
};

/// Serialization settings for one model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Association names to traverse.
    pub relationships: Vec<String>,
    /// Nest related records instead of sideloading them.
    pub embed: bool,
}

impl SerializerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the associations to traverse.
    pub fn relationships<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relationships = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn embed(mut self, embed: bool) -> Self {
        self.embed = embed;
        self
    }
}

/// Serializer configurations keyed by model, bound to a schema.
///
/// Models without a registered configuration use [`SerializerConfig::default`].
#[derive(Debug, Clone)]
pub struct SerializerRegistry {
    schema: Schema,
    configs: BTreeMap<String, SerializerConfig>,
    fallback: SerializerConfig,
}

impl SerializerRegistry {
    /// Creates a registry with no model-specific configuration.
    pub fn new(schema: Schema) -> Self {
        SerializerRegistry {
            schema,
            configs: BTreeMap::new(),
            fallback: SerializerConfig::default(),
        }
    }

    /// Loads configurations from a JSON object keyed by model name:
    /// `{ "author": { "relationships": ["posts"], "embed": false } }`.
    ///
    /// # Errors
    ///
    /// Returns [`DataLayerError::Serialization`] for malformed JSON, and
    /// [`DataLayerError::UnknownModel`] or [`DataLayerError::UnknownAssociation`]
    /// for names the schema doesn't declare.
    pub fn from_json(schema: Schema, configs: Value) -> DataLayerResult<Self> {
        let configs: BTreeMap<String, SerializerConfig> = serde_json::from_value(configs)?;
        let mut registry = SerializerRegistry::new(schema);

        for (model, config) in configs {
            registry.register(&model, config)?;
        }

        Ok(registry)
    }

    /// Registers the configuration for `model`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`DataLayerError::UnknownModel`] or
    /// [`DataLayerError::UnknownAssociation`] for undeclared names.
    pub fn register(&mut self, model: &str, config: SerializerConfig) -> DataLayerResult<()> {
        self.schema.model(model)?;

        for name in &config.relationships {
            self.schema.association(model, name)?;
        }

        self.configs.insert(model.to_string(), config);
        Ok(())
    }

    /// Builder form of [`SerializerRegistry::register`].
    pub fn with_serializer(
        mut self,
        model: &str,
        config: SerializerConfig,
    ) -> DataLayerResult<Self> {
        self.register(model, config)?;
        Ok(self)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The configuration used for `model`.
    pub fn config_for(&self, model: &str) -> &SerializerConfig {
        self.configs.get(model).unwrap_or(&self.fallback)
    }

    /// Serializes a resource into a document. [`Resource::Empty`] serializes to `null`.
    ///
    /// # Errors
    ///
    /// Returns [`DataLayerError::CircularEmbed`] if embedded associations loop
    /// back to a record already being embedded.
    pub fn serialize(&self, resource: impl Into<Resource>) -> DataLayerResult<Value> {
        let resource: Resource = resource.into();
        let mut walk = Walk::new(self);
        let mut document = Map::new();

        match resource {
            Resource::Empty => return Ok(Value::Null),
            Resource::Record(record) => {
                walk.seen.insert(record.key());
                let hash = walk.primary(&record)?;
                document.insert(record.model_name(), Value::Object(hash));
            }
            Resource::Collection(collection) => {
                walk.mark_seen(&collection);
                walk.primaries(&mut document, &collection)?;
            }
            Resource::Collections(collections) => {
                for collection in &collections {
                    walk.mark_seen(collection);
                }
                for collection in &collections {
                    walk.primaries(&mut document, collection)?;
                }
            }
        }

        let sideloaded: usize = walk.sections.iter().map(|(_, records)| records.len()).sum();
        debug!(sections = walk.sections.len(), sideloaded, "serialized document");

        for (key, records) in walk.sections {
            let section = document
                .entry(key)
                .or_insert_with(|| Value::Array(Vec::new()));

            if let Value::Array(existing) = section {
                existing.extend(records);
            }
        }

        Ok(Value::Object(document))
    }
}

/// State threaded through one serialization.
struct Walk<'a> {
    registry: &'a SerializerRegistry,
    seen: HashSet<RecordKey>,
    embedding: Vec<RecordKey>,
    sections: Vec<(String, Vec<Value>)>,
}

impl<'a> Walk<'a> {
    fn new(registry: &'a SerializerRegistry) -> Self {
        Walk {
            registry,
            seen: HashSet::new(),
            embedding: Vec::new(),
            sections: Vec::new(),
        }
    }

    fn mark_seen(&mut self, collection: &Collection) {
        for record in collection {
            self.seen.insert(record.key());
        }
    }

    fn primaries(
        &mut self,
        document: &mut Map<String, Value>,
        collection: &Collection,
    ) -> DataLayerResult<()> {
        let hashes = collection
            .iter()
            .map(|record| self.primary(record).map(Value::Object))
            .collect::<DataLayerResult<Vec<_>>>()?;

        let root = document
            .entry(pluralize(collection.model_name()))
            .or_insert_with(|| Value::Array(Vec::new()));

        if let Value::Array(existing) = root {
            existing.extend(hashes);
        }

        Ok(())
    }

    fn primary(&mut self, record: &Record) -> DataLayerResult<Map<String, Value>> {
        let model = record.model_name();
        let mut hash = record.attrs()?;

        for assoc in self.registry.schema.model(&model)?.associations() {
            if assoc.is_plural() {
                let ids = record.related_ids(assoc.name())?;
                hash.insert(assoc.ids_key(), Value::from(ids));
            } else if !hash.contains_key(assoc.foreign_key()) {
                let id = record.related_id(assoc.name())?;
                hash.insert(assoc.foreign_key().to_string(), id.map_or(Value::Null, Value::from));
            }
        }

        self.relationships(record, &model, &mut hash)?;
        Ok(hash)
    }

    fn relationships(
        &mut self,
        record: &Record,
        model: &str,
        hash: &mut Map<String, Value>,
    ) -> DataLayerResult<()> {
        let registry = self.registry;
        let config = registry.config_for(model);

        if config.relationships.is_empty() {
            return Ok(());
        }

        self.embedding.push(record.key());

        for name in &config.relationships {
            let assoc = registry.schema.association(model, name)?;
            let related = record.related(name)?;

            if config.embed {
                let value = match related {
                    Related::One(None) => Value::Null,
                    Related::One(Some(parent)) => Value::Object(self.embedded(&parent)?),
                    Related::Many(children) => Value::Array(
                        children
                            .iter()
                            .map(|child| self.embedded(child).map(Value::Object))
                            .collect::<DataLayerResult<_>>()?,
                    ),
                };

                if assoc.is_plural() {
                    hash.remove(&assoc.ids_key());
                }
                hash.insert(assoc.name().to_string(), value);
            } else {
                match related {
                    Related::One(parent) => {
                        if let Some(parent) = parent {
                            self.sideload(&parent)?;
                        }
                    }
                    Related::Many(children) => {
                        hash.insert(assoc.ids_key(), Value::from(children.ids()));
                        for child in &children {
                            self.sideload(child)?;
                        }
                    }
                }
            }
        }

        self.embedding.pop();
        Ok(())
    }

    fn embedded(&mut self, record: &Record) -> DataLayerResult<Map<String, Value>> {
        let model = record.model_name();
        let key = record.key();

        if self.embedding.contains(&key) {
            let id = record.id().map_or_else(|| "new".to_string(), |id| id.to_string());
            return Err(DataLayerError::CircularEmbed(model, id));
        }

        trace!(model = %model, id = ?record.id(), "embedding record");

        let mut hash = record.attrs()?;
        self.relationships(record, &model, &mut hash)?;
        Ok(hash)
    }

    fn sideload(&mut self, record: &Record) -> DataLayerResult<()> {
        if !self.seen.insert(record.key()) {
            return Ok(());
        }

        let model = record.model_name();
        let key = pluralize(&model);
        trace!(model = %model, id = ?record.id(), "sideloading record");

        let section = match self.sections.iter().position(|(name, _)| *name == key) {
            Some(index) => index,
            None => {
                self.sections.push((key, Vec::new()));
                self.sections.len() - 1
            }
        };
        let slot = self.sections[section].1.len();
        self.sections[section].1.push(Value::Null);

        let chain = std::mem::take(&mut self.embedding);
        let mut hash = record.attrs()?;
        self.relationships(record, &model, &mut hash)?;
        self.embedding = chain;

        self.sections[section].1[slot] = Value::Object(hash);
        Ok(())
    }
}
