//! Update specifications for filter-based modifications.
//!
//! An [`Update`] carries an ordered list of mutation operators applied to
//! every matched document. Backends translate the list (`$set`/`$unset`/
//! `$inc` operator documents for MongoDB, direct document mutation in
//! memory). The virtual-collection layer relies on the ordering: the
//! discriminator tag it appends takes precedence over any caller-supplied
//! value for the same field.

use bson::Bson;

/// A single mutation operator.
#[derive(Debug, Clone)]
pub enum UpdateOp {
    /// Sets a field to a value, creating it if absent.
    Set {
        /// The field name.
        field: String,
        /// The value to set.
        value: Bson,
    },
    /// Removes a field.
    Unset {
        /// The field name.
        field: String,
    },
    /// Increments a numeric field, creating it at `amount` if absent.
    Inc {
        /// The field name.
        field: String,
        /// The increment amount.
        amount: i64,
    },
}

/// An ordered update specification, built fluently:
///
/// ```ignore
/// use repolayer::update::Update;
///
/// let update = Update::new()
///     .set("name", "Alice")
///     .inc("revision", 1)
///     .unset("legacyField");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Update {
    ops: Vec<UpdateOp>,
}

impl Update {
    /// Creates an empty update.
    pub fn new() -> Self {
        Update::default()
    }

    /// Appends a set operator.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.ops.push(UpdateOp::Set { field: field.into(), value: value.into() });
        self
    }

    /// Appends an unset operator.
    pub fn unset(mut self, field: impl Into<String>) -> Self {
        self.ops.push(UpdateOp::Unset { field: field.into() });
        self
    }

    /// Appends an increment operator.
    pub fn inc(mut self, field: impl Into<String>, amount: i64) -> Self {
        self.ops.push(UpdateOp::Inc { field: field.into(), amount });
        self
    }

    /// Whether the update carries no operators.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The operators, in application order.
    pub fn ops(&self) -> &[UpdateOp] {
        &self.ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_keep_their_order() {
        let update = Update::new()
            .set("a", 1)
            .unset("b")
            .inc("c", 2)
            .set("d", "x");

        let kinds: Vec<&str> = update
            .ops()
            .iter()
            .map(|op| match op {
                UpdateOp::Set { .. } => "set",
                UpdateOp::Unset { .. } => "unset",
                UpdateOp::Inc { .. } => "inc",
            })
            .collect();

        assert_eq!(kinds, vec!["set", "unset", "inc", "set"]);
    }

    #[test]
    fn new_update_is_empty() {
        assert!(Update::new().is_empty());
        assert!(!Update::new().set("a", 1).is_empty());
    }
}
