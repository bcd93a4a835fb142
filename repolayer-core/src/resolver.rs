//! Physical collection name resolution.
//!
//! Given a [`StoreConfig`] and an entity type's [`EntityMetadata`], computes
//! the name of the physical collection the type is stored in. The rules are
//! evaluated in strict order and the first match wins:
//!
//! 1. virtual collections enabled **and** forced global → the configured
//!    default virtual collection (an error when none is configured);
//! 2. an explicit collection name and a virtual collection declared on the
//!    same type → configuration error;
//! 3. explicit collection name → that name;
//! 4. virtual collections enabled and a virtual collection declared → that
//!    name;
//! 5. virtual collections enabled and a default virtual collection
//!    configured → the default;
//! 6. a declared collection group → the group name; otherwise the type's
//!    simple name.
//!
//! Resolution is a pure function of immutable inputs: the same type and the
//! same configuration always produce the same name.

use crate::config::StoreConfig;
use crate::entity::Entity;
use crate::error::{StoreError, StoreResult};

/// Resolves the physical collection name for `E` under `config`.
///
/// # Errors
///
/// Returns [`StoreError::Configuration`] when the global override is active
/// without a default virtual collection name, when `E` declares both an
/// explicit collection name and a virtual collection, or when resolution
/// produces an empty name.
pub fn resolve_collection_name<E: Entity>(config: &StoreConfig) -> StoreResult<String> {
    let meta = E::metadata();

    // Rule 1: global virtual collection override.
    if config.virtual_enabled() && config.virtual_force_global() {
        return match config.virtual_default() {
            Some(name) if !name.trim().is_empty() => Ok(name.to_string()),
            _ => Err(StoreError::Configuration(
                "a default virtual collection name must be set in the connection \
                 descriptor when virtualCollectionGlobal is enabled"
                    .to_string(),
            )),
        };
    }

    // Rule 2: the two placement declarations are mutually exclusive.
    if meta.collection_name.is_some() && meta.virtual_collection.is_some() {
        return Err(StoreError::Configuration(format!(
            "collection_name and virtual_collection cannot both be declared on {}",
            E::type_name()
        )));
    }

    let name = if let Some(name) = meta.collection_name {
        name.to_string()
    } else if config.virtual_enabled() && meta.virtual_collection.is_some() {
        meta.virtual_collection.unwrap_or_default().to_string()
    } else if config.virtual_enabled() && config.has_virtual_default() {
        config.virtual_default().unwrap_or_default().to_string()
    } else if let Some(group) = meta.collection_group {
        group.to_string()
    } else {
        E::type_name().to_string()
    };

    if name.trim().is_empty() {
        return Err(StoreError::Configuration(format!(
            "resolved collection name is empty for {}",
            E::type_name()
        )));
    }

    log::debug!("resolved collection {name:?} for entity type {}", E::type_name());
    Ok(name)
}

/// The discriminator value written and matched for `E` inside a virtual
/// collection: the declared override, or the type's simple name.
///
/// Stable for the process lifetime of a given type.
pub fn discriminator<E: Entity>() -> &'static str {
    E::metadata().virtual_type_name.unwrap_or_else(E::type_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityMetadata;

    macro_rules! test_entity {
        ($name:ident, $meta:expr) => {
            #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
            struct $name {
                #[serde(rename = "_id")]
                id: String,
            }

            impl Entity for $name {
                type Key = String;

                fn id(&self) -> &String {
                    &self.id
                }

                fn created_on(&self) -> chrono::DateTime<chrono::Utc> {
                    chrono::Utc::now()
                }

                fn object_type_id(&self) -> Option<&str> {
                    None
                }

                fn set_object_type_id(&mut self, _type_id: Option<String>) {}

                fn type_name() -> &'static str {
                    stringify!($name)
                }

                fn metadata() -> EntityMetadata {
                    $meta
                }
            }
        };
    }

    test_entity!(Plain, EntityMetadata::default());
    test_entity!(
        Named,
        EntityMetadata {
            collection_name: Some("MyTestCollection"),
            ..EntityMetadata::default()
        }
    );
    test_entity!(
        Conflicted,
        EntityMetadata {
            collection_name: Some("explicit"),
            virtual_collection: Some("entities"),
            ..EntityMetadata::default()
        }
    );
    test_entity!(
        VirtualProduct,
        EntityMetadata {
            virtual_collection: Some("entities"),
            ..EntityMetadata::default()
        }
    );
    test_entity!(
        Cat,
        EntityMetadata {
            collection_group: Some("Animal"),
            ..EntityMetadata::default()
        }
    );
    test_entity!(
        Dog,
        EntityMetadata {
            collection_group: Some("Animal"),
            ..EntityMetadata::default()
        }
    );

    fn config(descriptor: &str) -> StoreConfig {
        StoreConfig::parse(descriptor).unwrap()
    }

    #[test]
    fn plain_type_resolves_to_its_simple_name() {
        let config = config("mongodb://localhost/app");
        assert_eq!(resolve_collection_name::<Plain>(&config).unwrap(), "Plain");
    }

    #[test]
    fn explicit_name_wins_regardless_of_virtual_settings() {
        for descriptor in [
            "mongodb://localhost/app",
            "mongodb://localhost/app?virtual=true",
            "mongodb://localhost/app?virtual=true&virtualCollection=shared",
        ] {
            let config = config(descriptor);
            assert_eq!(
                resolve_collection_name::<Named>(&config).unwrap(),
                "MyTestCollection"
            );
        }
    }

    #[test]
    fn declaring_both_names_is_a_configuration_error() {
        let config = config("mongodb://localhost/app");
        assert!(matches!(
            resolve_collection_name::<Conflicted>(&config),
            Err(StoreError::Configuration(_))
        ));
    }

    #[test]
    fn virtual_collection_is_used_when_enabled() {
        let config = config("mongodb://localhost/app?virtual=true");
        assert_eq!(
            resolve_collection_name::<VirtualProduct>(&config).unwrap(),
            "entities"
        );
    }

    #[test]
    fn virtual_collection_is_ignored_when_disabled() {
        let config = config("mongodb://localhost/app?virtual=false");
        assert_eq!(
            resolve_collection_name::<VirtualProduct>(&config).unwrap(),
            "VirtualProduct"
        );
    }

    #[test]
    fn default_virtual_collection_catches_unmapped_types() {
        let config = config("mongodb://localhost/app?virtual=true&virtualCollection=shared");
        assert_eq!(resolve_collection_name::<Plain>(&config).unwrap(), "shared");
    }

    #[test]
    fn default_virtual_collection_is_ignored_when_disabled() {
        let config = config("mongodb://localhost/app?virtual=false&virtualCollection=shared");
        assert_eq!(resolve_collection_name::<Plain>(&config).unwrap(), "Plain");
    }

    #[test]
    fn force_global_routes_every_type_to_the_default() {
        let config = config(
            "mongodb://localhost/app?virtual=true&virtualCollectionGlobal=true&virtualCollection=shared",
        );
        assert_eq!(resolve_collection_name::<Plain>(&config).unwrap(), "shared");
        assert_eq!(resolve_collection_name::<Named>(&config).unwrap(), "shared");
        assert_eq!(
            resolve_collection_name::<VirtualProduct>(&config).unwrap(),
            "shared"
        );
    }

    #[test]
    fn force_global_without_default_fails() {
        let config = config("mongodb://localhost/app?virtual=true&virtualCollectionGlobal=true");
        assert!(matches!(
            resolve_collection_name::<Plain>(&config),
            Err(StoreError::Configuration(_))
        ));
    }

    #[test]
    fn collection_group_collapses_a_type_family() {
        let config = config("mongodb://localhost/app");
        let cat = resolve_collection_name::<Cat>(&config).unwrap();
        let dog = resolve_collection_name::<Dog>(&config).unwrap();
        assert_eq!(cat, "Animal");
        assert_eq!(cat, dog);
    }

    #[test]
    fn resolution_is_idempotent() {
        let config = config("mongodb://localhost/app?virtual=true&virtualCollection=shared");
        assert_eq!(
            resolve_collection_name::<VirtualProduct>(&config).unwrap(),
            resolve_collection_name::<VirtualProduct>(&config).unwrap()
        );
    }

    #[test]
    fn discriminator_defaults_to_the_simple_name() {
        assert_eq!(discriminator::<VirtualProduct>(), "VirtualProduct");
    }

    test_entity!(
        Renamed,
        EntityMetadata {
            virtual_collection: Some("entities"),
            virtual_type_name: Some("legacy-name"),
            ..EntityMetadata::default()
        }
    );

    #[test]
    fn discriminator_honors_the_override() {
        assert_eq!(discriminator::<Renamed>(), "legacy-name");
    }
}
