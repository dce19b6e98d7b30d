//! Filter expressions evaluated by record stores.
//!
//! The association engine only ever asks a store for rows whose foreign key
//! equals an id, or whose id is in a list, so the expression language stays
//! that small: field equality, list membership, presence and conjunction.
//! Stores walk expressions with a [`QueryVisitor`].
//!
//! ```ignore
//! use mocklayer::query::Filter;
//!
//! let children = Filter::eq("author_id", 1).and(Filter::exists("title"));
//! let coalesced = Filter::any_of("id", [1, 3]);
//! ```

use serde_json::Value;

use crate::error::DataLayerError;

/// How a field is compared against the expression's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    /// The field equals the value.
    Eq,
    /// The field equals one of the values in an array.
    AnyOf,
}

/// A predicate over the attributes of one row.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Every inner expression holds. An empty list matches every row.
    And(Vec<Expr>),
    /// The field is present and not `null` (`true`), or absent or `null` (`false`).
    Exists(String, bool),
    /// A field comparison.
    Field {
        field: String,
        op: FieldOp,
        value: Value,
    },
}

impl Expr {
    /// Conjunction with `other`, appended to `self` if it already is one.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut exprs) => {
                exprs.push(other);
                Expr::And(exprs)
            }
            expr => Expr::And(vec![expr, other]),
        }
    }
}

/// Constructors for filter expressions.
pub struct Filter;

impl Filter {
    /// `field == value`. Numbers compare by value, so `1` matches `1.0`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::Field {
            field: field.into(),
            op: FieldOp::Eq,
            value: value.into(),
        }
    }

    /// `field` equals any of `values`; how id-list lookups are expressed.
    pub fn any_of<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Expr {
        Expr::Field {
            field: field.into(),
            op: FieldOp::AnyOf,
            value: Value::Array(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), true)
    }

    pub fn not_exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), false)
    }

    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }
}

/// A walk over an [`Expr`] tree, one method per node kind.
pub trait QueryVisitor {
    type Output;
    type Error: Into<DataLayerError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_exists(
        &mut self,
        field: &str,
        should_exist: bool,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: FieldOp,
        value: &Value,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Exists(field, should_exist) => self.visit_exists(field, *should_exist),
            Expr::Field { field, op, value } => self.visit_field(field, *op, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn and_appends_to_an_existing_conjunction() {
        let expr = Filter::eq("a", 1).and(Filter::eq("b", 2)).and(Filter::exists("c"));

        match expr {
            Expr::And(exprs) => assert_eq!(exprs.len(), 3),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn any_of_collects_values_into_an_array() {
        assert_eq!(
            Filter::any_of("id", [1, 3]),
            Expr::Field {
                field: "id".into(),
                op: FieldOp::AnyOf,
                value: json!([1, 3]),
            }
        );
    }
}
