//! Narrow driver interfaces consumed by the configuration and index layers.
//!
//! All calls are synchronous. No timeouts are applied here; callers that
//! need deadlines wrap these calls themselves.

use serde_json::Value;

use super::errors::DriverResult;

/// A named collection inside the currently selected database.
pub trait Collection {
    /// Collection name
    fn name(&self) -> &str;

    /// Return every document matching `filter`.
    fn find(&self, filter: &Value) -> DriverResult<Vec<Value>>;

    /// Drop the collection together with its indexes.
    fn drop_collection(&self) -> DriverResult<()>;

    /// Create an index. `keys` is a `{field: direction}` document and
    /// `options` the options document passed through to the store.
    fn create_index(&self, keys: &Value, options: &Value) -> DriverResult<()>;
}

/// A connection-level session.
pub trait Session {
    /// Select the database subsequent collection lookups resolve against.
    fn use_database(&mut self, name: &str) -> DriverResult<()>;

    /// Look up a collection by name in the current database.
    fn collection(&self, name: &str) -> Box<dyn Collection + '_>;
}

/// Source of the default session.
pub trait SessionRegistry {
    /// Return the default session, opening it if necessary.
    fn default_session(&self) -> DriverResult<Box<dyn Session + '_>>;
}
