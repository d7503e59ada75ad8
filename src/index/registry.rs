//! Per-model index registry
//!
//! # API
//!
//! - `index(definition, config, collection)` - Declare an index
//! - `add_default_indexes(config, collection)` - Declare the `_type` index
//! - `create_indexes(collection)` - Issue one driver call per spec
//!
//! Specs are identified by field. Declaring a field again replaces its
//! direction and options in place, so creation order stays the order in
//! which fields were first declared.

use serde_json::Value;
use tracing::{debug, info};

use crate::config::ConfigStore;
use crate::driver::Collection;

use super::errors::IndexResult;
use super::spec::{IndexKey, IndexOptions, IndexSpec};

/// Field holding the concrete type of a polymorphic document
pub const DISCRIMINATOR_FIELD: &str = "_type";

/// Static description of a model type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// Model name
    pub name: String,
    /// Backing collection
    pub collection: String,
    /// Whether the model is part of a single-collection hierarchy
    pub hereditary: bool,
}

impl ModelDescriptor {
    pub fn new(name: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection: collection.into(),
            hereditary: false,
        }
    }

    /// Mark the model as part of a hierarchy
    pub fn hereditary(mut self) -> Self {
        self.hereditary = true;
        self
    }
}

/// Index specs declared by one model
#[derive(Debug, Clone)]
pub struct IndexRegistry {
    model: ModelDescriptor,
    specs: Vec<IndexSpec>,
}

impl IndexRegistry {
    /// Empty registry for `model`
    pub fn new(model: ModelDescriptor) -> Self {
        Self {
            model,
            specs: Vec::new(),
        }
    }

    /// The owning model
    pub fn model(&self) -> &ModelDescriptor {
        &self.model
    }

    /// Declare an index from a definition object such as
    /// `{"name": 1, "background": true}`.
    ///
    /// Creates indexes right away when `autocreate_indexes` is set.
    pub fn index(
        &mut self,
        definition: &Value,
        config: &ConfigStore,
        collection: &dyn Collection,
    ) -> IndexResult<()> {
        let spec = IndexSpec::parse(definition)?;
        self.add(spec);
        self.create_if_enabled(config, collection)
    }

    /// Store a spec, replacing any spec on the same field
    pub fn add(&mut self, spec: IndexSpec) {
        debug!(
            model = %self.model.name,
            field = %spec.key.field,
            direction = %spec.key.direction,
            unique = spec.options.unique,
            "Registered index"
        );
        match self.position(&spec.key.field) {
            Some(pos) => self.specs[pos] = spec,
            None => self.specs.push(spec),
        }
    }

    /// Declare the discriminator index on hereditary models that do not
    /// have one yet, then apply the autocreate gate.
    pub fn add_default_indexes(
        &mut self,
        config: &ConfigStore,
        collection: &dyn Collection,
    ) -> IndexResult<()> {
        if self.model.hereditary && !self.contains(DISCRIMINATOR_FIELD) {
            self.add(IndexSpec::new(
                IndexKey::ascending(DISCRIMINATOR_FIELD),
                IndexOptions::default().background(true),
            ));
        }
        self.create_if_enabled(config, collection)
    }

    /// Send every spec to the driver in registration order.
    ///
    /// Returns the number of driver calls. Stops at the first driver error.
    pub fn create_indexes(&self, collection: &dyn Collection) -> IndexResult<usize> {
        if self.specs.is_empty() {
            return Ok(0);
        }

        for spec in &self.specs {
            collection.create_index(&spec.key.to_document(), &spec.options.to_document())?;
        }

        info!(
            model = %self.model.name,
            collection = collection.name(),
            count = self.specs.len(),
            "Created indexes"
        );
        Ok(self.specs.len())
    }

    fn create_if_enabled(&self, config: &ConfigStore, collection: &dyn Collection) -> IndexResult<()> {
        if config.autocreate_indexes()? {
            self.create_indexes(collection)?;
        }
        Ok(())
    }

    fn position(&self, field: &str) -> Option<usize> {
        self.specs.iter().position(|spec| spec.key.field == field)
    }

    /// Spec on `field`, if declared
    pub fn get(&self, field: &str) -> Option<&IndexSpec> {
        self.position(field).map(|pos| &self.specs[pos])
    }

    /// Whether `field` has a spec
    pub fn contains(&self, field: &str) -> bool {
        self.position(field).is_some()
    }

    /// Specs in registration order
    pub fn specs(&self) -> &[IndexSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{MemoryStore, Session};
    use crate::index::IndexDirection;
    use serde_json::json;

    fn person() -> IndexRegistry {
        IndexRegistry::new(ModelDescriptor::new("Person", "people"))
    }

    #[test]
    fn test_redeclaring_field_overwrites_in_place() {
        let store = MemoryStore::new();
        let mut session = store.session();
        session.use_database("app").unwrap();
        let people = session.collection("people");
        let config = ConfigStore::new();

        let mut registry = person();
        registry.index(&json!({ "name": 1 }), &config, people.as_ref()).unwrap();
        registry.index(&json!({ "age": 1 }), &config, people.as_ref()).unwrap();
        registry
            .index(&json!({ "name": -1, "unique": true }), &config, people.as_ref())
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.specs()[0].field(), "name");
        let name = registry.get("name").unwrap();
        assert_eq!(name.key.direction, IndexDirection::Descending);
        assert_eq!(name.options, IndexOptions::unique());
    }

    #[test]
    fn test_default_index_only_for_hereditary() {
        let store = MemoryStore::new();
        let session = store.session();
        let people = session.collection("people");
        let config = ConfigStore::new();

        let mut plain = person();
        plain.add_default_indexes(&config, people.as_ref()).unwrap();
        assert!(plain.is_empty());

        let mut hereditary =
            IndexRegistry::new(ModelDescriptor::new("Person", "people").hereditary());
        hereditary.add_default_indexes(&config, people.as_ref()).unwrap();
        hereditary.add_default_indexes(&config, people.as_ref()).unwrap();

        assert_eq!(hereditary.len(), 1);
        let spec = hereditary.get(DISCRIMINATOR_FIELD).unwrap();
        assert_eq!(
            spec.options.to_document(),
            json!({ "unique": false, "background": true })
        );
    }

    #[test]
    fn test_existing_type_index_is_kept() {
        let store = MemoryStore::new();
        let session = store.session();
        let people = session.collection("people");
        let config = ConfigStore::new();

        let mut registry =
            IndexRegistry::new(ModelDescriptor::new("Person", "people").hereditary());
        registry.add(IndexSpec::new(IndexKey::ascending("_type"), IndexOptions::unique()));
        registry.add_default_indexes(&config, people.as_ref()).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.get("_type").unwrap().options.unique);
    }

    #[test]
    fn test_empty_registry_issues_no_calls() {
        let store = MemoryStore::new();
        let session = store.session();
        let count = person().create_indexes(session.collection("people").as_ref()).unwrap();
        assert_eq!(count, 0);
        assert!(store.calls().is_empty());
    }

    #[test]
    fn test_invalid_definition_leaves_registry_unchanged() {
        let store = MemoryStore::new();
        let session = store.session();
        let config = ConfigStore::new();

        let mut registry = person();
        let err = registry
            .index(&json!({}), &config, session.collection("people").as_ref())
            .unwrap_err();
        assert_eq!(err.code(), "DOCMAP_INVALID_INDEX_SPEC");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_autocreate_gate_needs_declared_option() {
        let store = MemoryStore::new();
        let session = store.session();
        let config = ConfigStore::empty();

        let mut registry = person();
        let err = registry
            .index(&json!({ "name": 1 }), &config, session.collection("people").as_ref())
            .unwrap_err();
        assert_eq!(err.code(), "DOCMAP_UNKNOWN_OPTION");
    }
}
