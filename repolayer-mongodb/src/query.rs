//! Translation from the repolayer filter and update ASTs to MongoDB
//! operator documents.

use bson::{Bson, Document, doc};

use repolayer_core::{
    error::StoreError,
    query::{Expr, FieldOp, QueryVisitor},
    update::{Update, UpdateOp},
};

/// Translates filter expressions into MongoDB query documents.
pub(crate) struct MongoQueryTranslator;

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = StoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        // $not is operator-scoped in MongoDB; a single-branch $nor negates a
        // whole expression.
        Ok(doc! {
            "$nor": [self.visit_expr(expr)?],
        })
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: { "$exists": should_exist },
        })
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: match op {
                FieldOp::Eq => doc! { "$eq": value },
                FieldOp::Ne => doc! { "$ne": value },
                FieldOp::Gt => doc! { "$gt": value },
                FieldOp::Gte => doc! { "$gte": value },
                FieldOp::Lt => doc! { "$lt": value },
                FieldOp::Lte => doc! { "$lte": value },
                FieldOp::AnyOf => match value {
                    Bson::Array(_) => doc! { "$in": value },
                    other => doc! { "$in": [other] },
                },
                FieldOp::NoneOf => match value {
                    Bson::Array(_) => doc! { "$nin": value },
                    other => doc! { "$nin": [other] },
                },
            }
        })
    }
}

/// Translates an update specification into a MongoDB update document,
/// grouping operators under `$set`/`$unset`/`$inc`.
///
/// Operators are applied in order within each group, so a later `Set` on a
/// field wins over an earlier one — which is what lets the virtual layer's
/// appended discriminator tag take precedence.
pub(crate) fn to_update_document(update: &Update) -> Document {
    let mut set = Document::new();
    let mut unset = Document::new();
    let mut inc = Document::new();

    for op in update.ops() {
        match op {
            UpdateOp::Set { field, value } => {
                set.insert(field.clone(), value.clone());
            }
            UpdateOp::Unset { field } => {
                unset.insert(field.clone(), Bson::String(String::new()));
            }
            UpdateOp::Inc { field, amount } => {
                inc.insert(field.clone(), Bson::Int64(*amount));
            }
        }
    }

    let mut document = Document::new();
    if !set.is_empty() {
        document.insert("$set", set);
    }
    if !unset.is_empty() {
        document.insert("$unset", unset);
    }
    if !inc.is_empty() {
        document.insert("$inc", inc);
    }

    document
}
