//! Process-wide collection of index registries, one per model type.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::driver::Session;

use super::errors::IndexResult;
use super::registry::{IndexRegistry, ModelDescriptor};

/// Index registries keyed by model name
#[derive(Debug, Clone, Default)]
pub struct IndexCatalog {
    registries: BTreeMap<String, IndexRegistry>,
}

impl IndexCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry for `model`, created empty on first use.
    ///
    /// Registries are keyed by model name. The descriptor given on first use
    /// is kept; a later call with a different descriptor under the same name
    /// gets the existing registry and its original collection and
    /// `hereditary` flag.
    pub fn registry_for(&mut self, model: &ModelDescriptor) -> &mut IndexRegistry {
        let registry = self
            .registries
            .entry(model.name.clone())
            .or_insert_with(|| {
                debug!(model = %model.name, collection = %model.collection, "New index registry");
                IndexRegistry::new(model.clone())
            });
        if registry.model() != model {
            warn!(
                model = %model.name,
                kept = ?registry.model(),
                ignored = ?model,
                "Model already registered with another descriptor"
            );
        }
        registry
    }

    /// Registry of the model named `name`
    pub fn get(&self, name: &str) -> Option<&IndexRegistry> {
        self.registries.get(name)
    }

    /// All registries, by model name
    pub fn registries(&self) -> impl Iterator<Item = &IndexRegistry> {
        self.registries.values()
    }

    /// Create every registered index, model by model, each into its own
    /// collection. Returns the total number of driver calls.
    pub fn create_all(&self, session: &dyn Session) -> IndexResult<usize> {
        let mut total = 0;
        for registry in self.registries.values() {
            let collection = session.collection(&registry.model().collection);
            total += registry.create_indexes(collection.as_ref())?;
        }
        Ok(total)
    }

    pub fn len(&self) -> usize {
        self.registries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registries.is_empty()
    }
}
