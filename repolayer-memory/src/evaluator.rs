//! Filter evaluation and update application for the in-memory backend.

use std::{cmp::Ordering, collections::HashMap};

use bson::{Binary, Bson, Document, datetime::DateTime, oid::ObjectId};

use repolayer_core::{
    error::{StoreError, StoreResult},
    query::{Expr, FieldOp, QueryVisitor},
    update::{Update, UpdateOp},
};

/// Type-erased, comparable representation of BSON values.
///
/// Normalizes all numeric types to f64 so mixed-width comparisons behave
/// like the document store's.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    ObjectId(ObjectId),
    Binary(&'a Binary),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::Binary(value) => Comparable::Binary(value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => {
                Comparable::Array(arr.iter().map(Comparable::from).collect::<Vec<_>>())
            }
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>(),
            ),
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::Binary(a), Comparable::Binary(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => {
                a.bytes().partial_cmp(&b.bytes())
            }
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Evaluates filter expressions directly against stored documents.
pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> StoreResult<bool> {
        self.visit_expr(expr)
    }

    /// Whether the document matches the filter; `None` matches everything.
    pub fn matches(document: &Document, filter: Option<&Expr>) -> bool {
        match filter {
            Some(expr) => DocumentEvaluator::new(document)
                .evaluate(expr)
                .unwrap_or(false),
            None => true,
        }
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = StoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(
        &mut self,
        field: &str,
        should_exist: bool,
    ) -> Result<Self::Output, Self::Error> {
        Ok(self.document.get(field).is_some() == should_exist)
    }

    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error> {
        match self.document.get(field) {
            Some(field_value) => match op {
                FieldOp::Eq => Ok(Comparable::from(field_value) == Comparable::from(value)),
                FieldOp::Ne => Ok(Comparable::from(field_value) != Comparable::from(value)),
                FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => {
                    match Comparable::from(field_value).partial_cmp(&Comparable::from(value)) {
                        Some(ordering) => Ok(match op {
                            FieldOp::Gt => ordering == Ordering::Greater,
                            FieldOp::Gte => {
                                ordering == Ordering::Greater || ordering == Ordering::Equal
                            }
                            FieldOp::Lt => ordering == Ordering::Less,
                            FieldOp::Lte => ordering == Ordering::Less || ordering == Ordering::Equal,
                            _ => unreachable!(),
                        }),
                        None => Ok(false),
                    }
                }
                FieldOp::AnyOf => {
                    Ok(match (Comparable::from(field_value), Comparable::from(value)) {
                        (Comparable::Array(array), Comparable::Array(values)) => values
                            .iter()
                            .any(|val| array.iter().any(|item| item == val)),
                        (Comparable::Array(array), single) => {
                            array.iter().any(|item| item == &single)
                        }
                        (single, Comparable::Array(values)) => {
                            values.iter().any(|val| val == &single)
                        }
                        (left, right) => left == right,
                    })
                }
                FieldOp::NoneOf => {
                    Ok(match (Comparable::from(field_value), Comparable::from(value)) {
                        (Comparable::Array(array), Comparable::Array(values)) => !values
                            .iter()
                            .any(|val| array.iter().any(|item| item == val)),
                        (Comparable::Array(array), single) => {
                            !array.iter().any(|item| item == &single)
                        }
                        (single, Comparable::Array(values)) => {
                            !values.iter().any(|val| val == &single)
                        }
                        (left, right) => left != right,
                    })
                }
            },
            None => Ok(false),
        }
    }
}

/// Applies an update specification to a document, in operator order.
pub(crate) fn apply_update(document: &mut Document, update: &Update) {
    for op in update.ops() {
        match op {
            UpdateOp::Set { field, value } => {
                document.insert(field.clone(), value.clone());
            }
            UpdateOp::Unset { field } => {
                document.remove(field);
            }
            UpdateOp::Inc { field, amount } => {
                let next = match document.get(field) {
                    Some(Bson::Int32(value)) => Bson::Int64(*value as i64 + amount),
                    Some(Bson::Int64(value)) => Bson::Int64(value + amount),
                    Some(Bson::Double(value)) => Bson::Double(value + *amount as f64),
                    _ => Bson::Int64(*amount),
                };
                document.insert(field.clone(), next);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use repolayer_core::query::field;

    #[test]
    fn equality_matches_across_numeric_widths() {
        let document = doc! { "age": 30i64 };
        assert!(DocumentEvaluator::matches(
            &document,
            Some(&field("age").eq(30i32))
        ));
    }

    #[test]
    fn object_ids_compare_by_value() {
        let oid = ObjectId::new();
        let document = doc! { "_id": oid };
        assert!(DocumentEvaluator::matches(
            &document,
            Some(&field("_id").eq(oid))
        ));
        assert!(!DocumentEvaluator::matches(
            &document,
            Some(&field("_id").eq(ObjectId::new()))
        ));
    }

    #[test]
    fn uuid_keys_compare_by_value() {
        let uuid = bson::Uuid::new();
        let document = doc! { "_id": uuid };
        assert!(DocumentEvaluator::matches(
            &document,
            Some(&field("_id").eq(uuid))
        ));
        assert!(!DocumentEvaluator::matches(
            &document,
            Some(&field("_id").eq(bson::Uuid::new()))
        ));
    }

    #[test]
    fn missing_fields_never_match() {
        let document = doc! { "a": 1 };
        assert!(!DocumentEvaluator::matches(
            &document,
            Some(&field("b").eq(1))
        ));
        assert!(DocumentEvaluator::matches(
            &document,
            Some(&field("b").not_exists())
        ));
    }

    #[test]
    fn any_of_matches_scalars_against_value_lists() {
        let document = doc! { "status": "active" };
        let filter = field("status").any_of(vec!["active", "pending"]);
        assert!(DocumentEvaluator::matches(&document, Some(&filter)));

        let filter = field("status").none_of(vec!["archived", "deleted"]);
        assert!(DocumentEvaluator::matches(&document, Some(&filter)));
    }

    #[test]
    fn apply_update_runs_operators_in_order() {
        let mut document = doc! { "a": 1i64, "b": "x" };
        apply_update(
            &mut document,
            &Update::new().set("b", "y").inc("a", 2).unset("c").set("d", true),
        );

        assert_eq!(document.get("a"), Some(&Bson::Int64(3)));
        assert_eq!(document.get("b"), Some(&Bson::String("y".to_string())));
        assert_eq!(document.get("d"), Some(&Bson::Boolean(true)));
    }

    #[test]
    fn later_set_wins_over_earlier_set() {
        let mut document = doc! {};
        apply_update(
            &mut document,
            &Update::new().set("objectTypeId", "caller").set("objectTypeId", "proxy"),
        );
        assert_eq!(
            document.get("objectTypeId"),
            Some(&Bson::String("proxy".to_string()))
        );
    }
}
