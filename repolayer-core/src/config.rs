//! Store configuration derived from a connection descriptor.
//!
//! The descriptor has the shape
//! `<scheme>://<host>/<database>?virtual=<bool>&virtualCollectionGlobal=<bool>&virtualCollection=<name>`.
//! The query parameters carry the virtual-collection policy; everything
//! before the query is handed unchanged to the backend driver. Unrecognized
//! parameters are ignored.

use crate::error::{StoreError, StoreResult};

/// Immutable store configuration, created once per [`EntityStore`] and
/// alive exactly as long as it.
///
/// [`EntityStore`]: crate::store::EntityStore
#[derive(Debug, Clone)]
pub struct StoreConfig {
    connection_string: String,
    database: String,
    virtual_enabled: bool,
    virtual_force_global: bool,
    virtual_default: Option<String>,
}

impl StoreConfig {
    /// Parses a connection descriptor.
    ///
    /// Recognized query parameters:
    ///
    /// - `virtual` (bool, default `false`) — enables virtual collections;
    /// - `virtualCollectionGlobal` (bool, default `false`) — forces every
    ///   entity type into the default virtual collection;
    /// - `virtualCollection` (string, optional) — the default virtual
    ///   collection for unmapped entity types.
    ///
    /// Boolean values read as `true` for `true`/`1` and as `false` for
    /// anything else.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Configuration`] if the descriptor is empty or
    /// is not a well-formed `<scheme>://<host>/<database>` URI.
    pub fn parse(descriptor: &str) -> StoreResult<Self> {
        let descriptor = descriptor.trim();
        if descriptor.is_empty() {
            return Err(StoreError::Configuration(
                "connection descriptor must not be empty".to_string(),
            ));
        }

        let (scheme, remainder) = descriptor.split_once("://").ok_or_else(|| {
            StoreError::Configuration(format!(
                "malformed connection descriptor {descriptor:?}: missing scheme"
            ))
        })?;
        if scheme.is_empty() {
            return Err(StoreError::Configuration(format!(
                "malformed connection descriptor {descriptor:?}: empty scheme"
            )));
        }

        let (authority, path) = remainder.split_once('/').ok_or_else(|| {
            StoreError::Configuration(format!(
                "malformed connection descriptor {descriptor:?}: missing database path"
            ))
        })?;
        if authority.is_empty() {
            return Err(StoreError::Configuration(format!(
                "malformed connection descriptor {descriptor:?}: empty host"
            )));
        }

        let (database, query) = match path.split_once('?') {
            Some((database, query)) => (database, Some(query)),
            None => (path, None),
        };
        if database.is_empty() {
            return Err(StoreError::Configuration(format!(
                "malformed connection descriptor {descriptor:?}: empty database name"
            )));
        }

        let mut virtual_enabled = false;
        let mut virtual_force_global = false;
        let mut virtual_default = None;

        for pair in query.unwrap_or_default().split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "virtual" => virtual_enabled = parse_bool(value),
                "virtualCollectionGlobal" => virtual_force_global = parse_bool(value),
                "virtualCollection" => {
                    if !value.is_empty() {
                        virtual_default = Some(value.to_string());
                    }
                }
                // Driver options and anything else pass through untouched.
                _ => {}
            }
        }

        Ok(Self {
            connection_string: descriptor.to_string(),
            database: database.to_string(),
            virtual_enabled,
            virtual_force_global,
            virtual_default,
        })
    }

    /// The full connection descriptor, as given.
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// The database name extracted from the descriptor path.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Whether virtual collections are enabled.
    pub fn virtual_enabled(&self) -> bool {
        self.virtual_enabled
    }

    /// Whether every entity type is forced into the default virtual
    /// collection.
    pub fn virtual_force_global(&self) -> bool {
        self.virtual_force_global
    }

    /// The default virtual collection for unmapped entity types.
    pub fn virtual_default(&self) -> Option<&str> {
        self.virtual_default.as_deref()
    }

    /// Whether a non-blank default virtual collection has been configured.
    pub fn has_virtual_default(&self) -> bool {
        self.virtual_default
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty())
    }
}

fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
