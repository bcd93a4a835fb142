//! Filter and query construction for repository operations.
//!
//! Filters are an abstract expression tree translated by each backend
//! (MongoDB operator documents, direct evaluation in memory). Queries add
//! sorting and pagination on top of a filter.
//!
//! # Building filters
//!
//! ```ignore
//! use repolayer::query::{field, Filter, Query, SortDirection};
//!
//! let query = Query::builder()
//!     .filter(field("name").eq("Alice").and(field("age").gte(18)))
//!     .sort("createdOn", SortDirection::Desc)
//!     .limit(10)
//!     .build();
//! ```

use bson::Bson;

use crate::error::StoreError;

/// Sort direction for query results.
#[derive(Debug, Clone)]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

/// Sort specification: field name plus direction.
#[derive(Debug, Clone)]
pub struct Sort {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

/// Field comparison operators.
#[derive(Debug, Clone)]
pub enum FieldOp {
    /// Equal to.
    Eq,
    /// Not equal to.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
    /// Equals any of the given values (or array fields intersect them).
    AnyOf,
    /// Equals none of the given values.
    NoneOf,
}

/// A filter expression over documents.
///
/// Combine with [`Expr::and`], [`Expr::or`] and [`Expr::not`], or build the
/// leaves with [`field`].
#[derive(Debug, Clone)]
pub enum Expr {
    /// Logical AND of multiple expressions (all must match).
    And(Vec<Expr>),
    /// Logical OR of multiple expressions (any must match).
    Or(Vec<Expr>),
    /// Logical NOT of an expression.
    Not(Box<Expr>),
    /// Checks whether a field exists.
    Exists(String, bool),
    /// Field comparison.
    Field {
        /// The field name to compare.
        field: String,
        /// The comparison operator.
        op: FieldOp,
        /// The value to compare against.
        value: Bson,
    },
}

impl Expr {
    /// Combines this expression with another using logical AND. An existing
    /// AND list is extended rather than nested.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Combines this expression with another using logical OR. An existing
    /// OR list is extended rather than nested.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            _ => Expr::Or(vec![self, other]),
        }
    }

    /// Negates this expression.
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }
}

/// Starts a fluent filter on the named field.
pub fn field(name: impl Into<String>) -> Field {
    Field { name: name.into() }
}

/// Fluent builder for single-field filter expressions, created by
/// [`field`].
pub struct Field {
    name: String,
}

impl Field {
    fn op(self, op: FieldOp, value: impl Into<Bson>) -> Expr {
        Expr::Field { field: self.name, op, value: value.into() }
    }

    /// Matches documents where the field equals the value.
    pub fn eq(self, value: impl Into<Bson>) -> Expr {
        self.op(FieldOp::Eq, value)
    }

    /// Matches documents where the field does not equal the value.
    pub fn ne(self, value: impl Into<Bson>) -> Expr {
        self.op(FieldOp::Ne, value)
    }

    /// Matches documents where the field is greater than the value.
    pub fn gt(self, value: impl Into<Bson>) -> Expr {
        self.op(FieldOp::Gt, value)
    }

    /// Matches documents where the field is greater than or equal to the
    /// value.
    pub fn gte(self, value: impl Into<Bson>) -> Expr {
        self.op(FieldOp::Gte, value)
    }

    /// Matches documents where the field is less than the value.
    pub fn lt(self, value: impl Into<Bson>) -> Expr {
        self.op(FieldOp::Lt, value)
    }

    /// Matches documents where the field is less than or equal to the
    /// value.
    pub fn lte(self, value: impl Into<Bson>) -> Expr {
        self.op(FieldOp::Lte, value)
    }

    /// Matches documents where the field equals any of the values.
    pub fn any_of(self, values: impl Into<Bson>) -> Expr {
        self.op(FieldOp::AnyOf, values)
    }

    /// Matches documents where the field equals none of the values.
    pub fn none_of(self, values: impl Into<Bson>) -> Expr {
        self.op(FieldOp::NoneOf, values)
    }

    /// Matches documents where the field exists.
    pub fn exists(self) -> Expr {
        Expr::Exists(self.name, true)
    }

    /// Matches documents where the field does not exist.
    pub fn not_exists(self) -> Expr {
        Expr::Exists(self.name, false)
    }
}

/// Combinators over collections of expressions.
pub struct Filter;

impl Filter {
    /// Logical AND over the given expressions.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    /// Logical OR over the given expressions.
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }
}

/// A structured query: optional filter plus sorting and pagination.
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Optional filter expression to match documents.
    pub filter: Option<Expr>,
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
    /// Number of documents to skip.
    pub offset: Option<usize>,
    /// Sort specification for results.
    pub sort: Option<Sort>,
}

impl Query {
    /// Creates an empty query matching every document.
    pub fn new() -> Self {
        Query::default()
    }

    /// Creates a query builder.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }
}

/// Fluent builder for [`Query`].
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Creates a new query builder.
    pub fn new() -> Self {
        QueryBuilder { query: Query::default() }
    }

    /// Sets the filter expression.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(filter);
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Sets the number of documents to skip.
    pub fn offset(mut self, offset: usize) -> Self {
        self.query.offset = Some(offset);
        self
    }

    /// Sets the sort field and direction.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort = Some(Sort { field: field.into(), direction });
        self
    }

    /// Builds the final query.
    pub fn build(self) -> Query {
        self.query
    }
}

/// Visitor over filter expressions, implemented by backend translators and
/// evaluators.
pub trait QueryVisitor {
    /// The translation output (a predicate result, an operator document…).
    type Output;
    /// The translation error, convertible into [`StoreError`].
    type Error: Into<StoreError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_exists(
        &mut self,
        field: &str,
        should_exist: bool,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    /// Dispatches on the expression variant.
    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Exists(field, should_exist) => self.visit_exists(field, *should_exist),
            Expr::Field { field, op, value } => self.visit_field(field, op, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_flattens_into_an_existing_list() {
        let expr = field("a")
            .eq(1)
            .and(field("b").eq(2))
            .and(field("c").eq(3));

        match expr {
            Expr::And(list) => assert_eq!(list.len(), 3),
            other => panic!("expected a flattened AND, got {other:?}"),
        }
    }

    #[test]
    fn or_flattens_into_an_existing_list() {
        let expr = field("a").eq(1).or(field("b").eq(2)).or(field("c").eq(3));

        match expr {
            Expr::Or(list) => assert_eq!(list.len(), 3),
            other => panic!("expected a flattened OR, got {other:?}"),
        }
    }

    #[test]
    fn combinators_collect_expression_lists() {
        let and = Filter::and([field("a").eq(1), field("b").eq(2)]);
        assert!(matches!(and, Expr::And(ref list) if list.len() == 2));

        let or = Filter::or([field("a").eq(1), field("b").eq(2), field("c").eq(3)]);
        assert!(matches!(or, Expr::Or(ref list) if list.len() == 3));
    }

    #[test]
    fn builder_collects_all_parts() {
        let query = Query::builder()
            .filter(field("status").eq("active"))
            .limit(10)
            .offset(20)
            .sort("createdOn", SortDirection::Desc)
            .build();

        assert!(query.filter.is_some());
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.offset, Some(20));
        assert_eq!(query.sort.as_ref().map(|s| s.field.as_str()), Some("createdOn"));
    }
}
