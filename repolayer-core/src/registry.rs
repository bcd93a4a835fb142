//! Process-wide entity registry and one-time initialization.
//!
//! Every type deriving `Entity` submits an [`EntityDescriptor`] to a
//! distributed registry at link time. [`ensure_initialized`] finalizes the
//! registry exactly once per process, behind a single-flight guard:
//! concurrent first callers block until the one initialization completes,
//! and every later call is a no-op. [`EntityStore`] triggers the guard
//! before handing out any collection handle.
//!
//! [`EntityStore`]: crate::store::EntityStore

use once_cell::sync::OnceCell;

use crate::entity::EntityMetadata;

/// A registered entity type: its simple name and storage metadata.
///
/// Submitted by the `Entity` derive macro via `inventory::submit!`; rarely
/// constructed by hand.
pub struct EntityDescriptor {
    /// The entity type's simple name.
    pub type_name: &'static str,
    /// The entity type's storage metadata.
    pub metadata: EntityMetadata,
}

inventory::collect!(EntityDescriptor);

static INITIALIZED: OnceCell<usize> = OnceCell::new();

/// Finalizes the entity registry, exactly once per process.
///
/// Walks the registered descriptors, warns about contradictory placement
/// declarations (the name resolver rejects them per type with a
/// configuration error when the type is actually opened), and logs the
/// registered set. Idempotent and thread-safe.
pub fn ensure_initialized() {
    INITIALIZED.get_or_init(|| {
        let mut count = 0usize;
        for descriptor in inventory::iter::<EntityDescriptor> {
            if descriptor.metadata.collection_name.is_some()
                && descriptor.metadata.virtual_collection.is_some()
            {
                log::warn!(
                    "entity type {} declares both collection_name and virtual_collection; \
                     opening it will fail",
                    descriptor.type_name
                );
            }
            count += 1;
        }
        log::debug!("entity registry initialized with {count} registered type(s)");
        count
    });
}

/// Iterates over every registered entity descriptor.
pub fn descriptors() -> impl Iterator<Item = &'static EntityDescriptor> {
    inventory::iter::<EntityDescriptor>.into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialization_is_idempotent() {
        ensure_initialized();
        ensure_initialized();
        assert!(INITIALIZED.get().is_some());
    }
}
