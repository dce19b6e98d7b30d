//! Route shorthand resolution.
//!
//! A shorthand maps a mock request to data without a handwritten handler.
//! The [`RequestTarget`] says where the model type comes from: the URL, one
//! named type, or a list of types resolved side by side.
//!
//! | target | `id` param | result |
//! |--------|------------|--------|
//! | one type | absent | every record (or the `ids` listed, with coalescing) |
//! | one type | present | the record, or [`Resource::Empty`] |
//! | list | absent | one full collection per type |
//! | list | present | the URL owner's plural associations, one collection each |

use serde::Deserialize;
use tracing::debug;

use crate::{
    association::Association,
    backend::RecordId,
    collection::Collection,
    error::{DataLayerError, DataLayerResult},
    request::Request,
    resource::Resource,
    schema::Schema,
};

/// Where the shorthand takes its model type from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestTarget {
    /// Inferred from the request URL.
    Untyped,
    /// One model type, plural or singular.
    Named(String),
    /// Several model types resolved into a tuple of collections.
    List(Vec<String>),
}

impl From<&str> for RequestTarget {
    fn from(name: &str) -> Self {
        RequestTarget::Named(name.to_string())
    }
}

impl From<String> for RequestTarget {
    fn from(name: String) -> Self {
        RequestTarget::Named(name)
    }
}

impl From<Vec<String>> for RequestTarget {
    fn from(names: Vec<String>) -> Self {
        RequestTarget::List(names)
    }
}

impl From<&[&str]> for RequestTarget {
    fn from(names: &[&str]) -> Self {
        RequestTarget::List(names.iter().map(|name| name.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for RequestTarget {
    fn from(names: [&str; N]) -> Self {
        RequestTarget::from(&names[..])
    }
}

/// Per-call shorthand options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShorthandOptions {
    /// Answer `ids` query params with just the listed records.
    pub coalesce: bool,
}

impl ShorthandOptions {
    /// Options with coalescing enabled.
    pub fn coalesced() -> Self {
        ShorthandOptions { coalesce: true }
    }
}

/// Resolves a request to a [`Resource`].
///
/// # Errors
///
/// - [`DataLayerError::UnknownModel`] if a type isn't registered
/// - [`DataLayerError::InvalidRequest`] for a non-numeric `id` or a URL with no type segment
/// - [`DataLayerError::ShapeMismatch`] if a list entry resolves to a single record
pub fn resolve(
    target: &RequestTarget,
    schema: &Schema,
    request: &Request,
    options: &ShorthandOptions,
) -> DataLayerResult<Resource> {
    match target {
        RequestTarget::Untyped => resolve_untyped(schema, request, options),
        RequestTarget::Named(name) => resolve_named(name, schema, request, options),
        RequestTarget::List(names) => resolve_list(names, schema, request),
    }
}

/// Resolves a request whose type is the last URL path segment, or the
/// segment before the id when an `id` param is present. The segment is
/// matched against model and table names, see [`Schema::model_name_for`].
pub fn resolve_untyped(
    schema: &Schema,
    request: &Request,
    options: &ShorthandOptions,
) -> DataLayerResult<Resource> {
    let id = request.id()?;
    let segment = type_segment(request, id.is_some())?;

    resolve_model(schema, &schema.model_name_for(segment), id, request, options)
}

fn type_segment(request: &Request, has_id: bool) -> DataLayerResult<&str> {
    let mut segments = request
        .path()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .rev()
        .skip(usize::from(has_id));

    segments.next().ok_or_else(|| {
        let url = request.url();
        DataLayerError::InvalidRequest(format!("cannot infer a model type from `{url}`"))
    })
}

/// Resolves a request for one named type.
pub fn resolve_named(
    name: &str,
    schema: &Schema,
    request: &Request,
    options: &ShorthandOptions,
) -> DataLayerResult<Resource> {
    let model = schema.model_name_for(name);

    resolve_model(schema, &model, request.id()?, request, options)
}

fn resolve_model(
    schema: &Schema,
    model: &str,
    id: Option<RecordId>,
    request: &Request,
    options: &ShorthandOptions,
) -> DataLayerResult<Resource> {
    schema.model(model)?;

    if let Some(id) = id {
        debug!(model, id, "resolving record");
        return Ok(schema.find(model, id)?.into());
    }

    if options.coalesce {
        if let Some(ids) = request.ids()? {
            debug!(model, count = ids.len(), "resolving coalesced ids");
            return Ok(schema.find_many(model, &ids)?.into());
        }
    }

    debug!(model, "resolving collection");
    Ok(schema.all(model)?.into())
}

/// Resolves a list of types into a tuple of collections.
///
/// Without an `id` every type yields its full collection. With one, the
/// owner type is taken from the URL as for [`resolve_untyped`] and every
/// name must reach a plural association of the owner.
pub fn resolve_list(
    names: &[String],
    schema: &Schema,
    request: &Request,
) -> DataLayerResult<Resource> {
    let Some(id) = request.id()? else {
        debug!(types = names.len(), "resolving collections");

        return names
            .iter()
            .map(|name| schema.all(&schema.model_name_for(name)))
            .collect::<DataLayerResult<Vec<_>>>()
            .map(Resource::Collections);
    };

    let owner_model = schema.model_name_for(type_segment(request, true)?);
    let associations = names
        .iter()
        .map(|name| {
            if schema.model_name_for(name) == owner_model {
                return Err(DataLayerError::ShapeMismatch(name.clone()));
            }

            let assoc = owner_association(schema, &owner_model, name)?;
            if assoc.is_singular() {
                return Err(DataLayerError::ShapeMismatch(name.clone()));
            }

            Ok(assoc)
        })
        .collect::<DataLayerResult<Vec<_>>>()?;

    let Some(owner) = schema.find(&owner_model, id)? else {
        return Ok(Resource::Empty);
    };

    debug!(model = %owner_model, id, types = names.len(), "resolving owner collections");

    associations
        .into_iter()
        .map(|assoc| owner.get_related_many(assoc.name()))
        .collect::<DataLayerResult<Vec<Collection>>>()
        .map(Resource::Collections)
}

fn owner_association<'a>(
    schema: &'a Schema,
    owner: &str,
    name: &str,
) -> DataLayerResult<&'a Association> {
    let definition = schema.model(owner)?;

    if let Some(assoc) = definition.association(name) {
        return Ok(assoc);
    }

    let target = schema.model_name_for(name);
    definition
        .associations()
        .iter()
        .find(|assoc| assoc.target() == target)
        .ok_or_else(|| DataLayerError::UnknownAssociation(owner.to_string(), name.to_string()))
}
