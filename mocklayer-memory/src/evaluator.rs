//! Filter expression evaluation for in-memory rows.

use serde_json::Value;
use std::collections::BTreeMap;

use mocklayer_core::{
    backend::Row,
    error::DataLayerError,
    query::{Expr, FieldOp, QueryVisitor},
};

/// Comparable representation of JSON values.
///
/// Numbers are normalized to `f64`, so `1` and `1.0` compare equal.
#[derive(Debug, PartialEq)]
enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(BTreeMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Value> for Comparable<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Comparable::Null,
            Value::Bool(value) => Comparable::Bool(*value),
            Value::Number(number) => number
                .as_f64()
                .map_or(Comparable::Null, Comparable::Number),
            Value::String(value) => Comparable::String(value),
            Value::Array(items) => Comparable::Array(items.iter().map(Comparable::from).collect()),
            Value::Object(map) => Comparable::Map(
                map.iter()
                    .map(|(key, value)| (key.as_str(), Comparable::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Evaluates filter expressions against one row.
pub(crate) struct RowEvaluator<'a> {
    row: &'a Row,
}

impl<'a> RowEvaluator<'a> {
    pub fn new(row: &'a Row) -> Self {
        Self { row }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> bool {
        self.visit_expr(expr).unwrap_or(false)
    }

    /// Rows matching `expr`, in input order.
    pub fn filter_rows(rows: impl IntoIterator<Item = &'a Row>, expr: &Expr) -> Vec<Row> {
        rows.into_iter()
            .filter(|row| RowEvaluator::new(row).evaluate(expr))
            .cloned()
            .collect()
    }

    fn any_equal(field_value: &Value, values: &Value) -> bool {
        let field_value = Comparable::from(field_value);

        match Comparable::from(values) {
            Comparable::Array(values) => values.contains(&field_value),
            single => single == field_value,
        }
    }
}

impl<'a> QueryVisitor for RowEvaluator<'a> {
    type Output = bool;
    type Error = DataLayerError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_exists(
        &mut self,
        field: &str,
        should_exist: bool,
    ) -> Result<Self::Output, Self::Error> {
        let exists = self
            .row
            .get(field)
            .is_some_and(|value| !value.is_null());

        Ok(exists == should_exist)
    }

    fn visit_field(
        &mut self,
        field: &str,
        op: FieldOp,
        value: &Value,
    ) -> Result<Self::Output, Self::Error> {
        let Some(field_value) = self.row.get(field) else {
            return Ok(false);
        };

        Ok(match op {
            FieldOp::Eq => Comparable::from(field_value) == Comparable::from(value),
            FieldOp::AnyOf => Self::any_equal(field_value, value),
        })
    }
}
