//! Mock request descriptions consumed by the shorthand resolver.
//!
//! A [`Request`] carries the URL, the route params (`id`) and the parsed
//! query parameters (`ids`). Query strings are decoded as
//! `application/x-www-form-urlencoded` when the request is built from a URL,
//! and `key[]` or repeated keys are grouped into lists:
//!
//! ```ignore
//! let request = Request::new("/contacts?ids[]=1&ids[]=3");
//! assert_eq!(request.ids()?, Some(vec![1, 3]));
//! ```

use std::collections::BTreeMap;

use crate::{
    backend::RecordId,
    error::{DataLayerError, DataLayerResult},
};

/// A query parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    Single(String),
    /// A `key[]` parameter, or a key repeated in the query string.
    List(Vec<String>),
}

impl QueryParam {
    /// Every value, a single one included.
    pub fn values(&self) -> Vec<&str> {
        match self {
            QueryParam::Single(value) => vec![value.as_str()],
            QueryParam::List(values) => values.iter().map(String::as_str).collect(),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            QueryParam::Single(first) => {
                *self = QueryParam::List(vec![std::mem::take(first), value]);
            }
            QueryParam::List(values) => values.push(value),
        }
    }
}

/// A request as seen by a route handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    url: String,
    params: BTreeMap<String, String>,
    query_params: BTreeMap<String, QueryParam>,
}

impl Request {
    /// Creates a request, parsing the query string of `url`.
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let query_params = url
            .split_once('?')
            .map(|(_, query)| parse_query_string(query))
            .unwrap_or_default();

        Request {
            url,
            params: BTreeMap::new(),
            query_params,
        }
    }

    /// Sets a route param.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Sets the `id` route param.
    pub fn with_id(self, id: impl ToString) -> Self {
        self.with_param("id", id.to_string())
    }

    /// Sets a query param, replacing any parsed from the URL.
    pub fn with_query_param(mut self, key: impl Into<String>, value: QueryParam) -> Self {
        self.query_params.insert(key.into(), value);
        self
    }

    /// Sets the `ids` query param.
    pub fn with_ids(self, ids: impl IntoIterator<Item = RecordId>) -> Self {
        let ids = ids.into_iter().map(|id| id.to_string()).collect();
        self.with_query_param("ids", QueryParam::List(ids))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The URL without its query string.
    pub fn path(&self) -> &str {
        self.url
            .split_once('?')
            .map_or(self.url.as_str(), |(path, _)| path)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn query_params(&self) -> &BTreeMap<String, QueryParam> {
        &self.query_params
    }

    pub fn query_param(&self, key: &str) -> Option<&QueryParam> {
        self.query_params.get(key)
    }

    /// The `id` route param.
    ///
    /// # Errors
    ///
    /// Returns [`DataLayerError::InvalidRequest`] if the param is not an integer.
    pub fn id(&self) -> DataLayerResult<Option<RecordId>> {
        self.param("id").map(parse_id).transpose()
    }

    /// The `ids` query param. A single value may hold comma-separated ids.
    ///
    /// # Errors
    ///
    /// Returns [`DataLayerError::InvalidRequest`] if any id is not an integer.
    pub fn ids(&self) -> DataLayerResult<Option<Vec<RecordId>>> {
        let Some(param) = self.query_param("ids") else {
            return Ok(None);
        };

        param
            .values()
            .into_iter()
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(parse_id)
            .collect::<DataLayerResult<Vec<_>>>()
            .map(Some)
    }
}

fn parse_id(value: &str) -> DataLayerResult<RecordId> {
    value
        .parse()
        .map_err(|_| DataLayerError::InvalidRequest(format!("`{value}` is not a record id")))
}

fn parse_query_string(query: &str) -> BTreeMap<String, QueryParam> {
    let mut params: BTreeMap<String, QueryParam> = BTreeMap::new();

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let value = value.into_owned();

        let (key, list) = match key.strip_suffix("[]") {
            Some(stripped) => (stripped.to_string(), true),
            None => (key.to_string(), false),
        };

        match params.get_mut(&key) {
            Some(existing) => existing.push(value),
            None if list => {
                params.insert(key, QueryParam::List(vec![value]));
            }
            None => {
                params.insert(key, QueryParam::Single(value));
            }
        }
    }

    params
}
