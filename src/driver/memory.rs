//! In-memory reference driver
//!
//! Keeps databases, collections and created indexes in process memory and
//! records every call it receives. Used by the CLI's dry-run planning and by
//! tests.
//!
//! Filters passed to `find` are matched by top-level equality only. Query
//! operators such as `$not` are not evaluated, so `system.namespaces` always
//! returns the full namespace listing.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{json, Map, Value};

use super::errors::{DriverError, DriverResult};
use super::session::{Collection, Session, SessionRegistry};

/// Name of the pseudo-collection listing every namespace in a database.
pub const NAMESPACES_COLLECTION: &str = "system.namespaces";

/// A call observed by the in-memory driver.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    /// `Session::use_database`
    UseDatabase(String),
    /// `Collection::find`
    Find { collection: String, filter: Value },
    /// `Collection::drop_collection`
    Drop { collection: String },
    /// `Collection::create_index`
    CreateIndex {
        collection: String,
        keys: Value,
        options: Value,
    },
}

#[derive(Debug, Default, Clone)]
struct StoredCollection {
    documents: Vec<Value>,
    indexes: Vec<(Value, Value)>,
}

#[derive(Debug, Default)]
struct MemoryState {
    databases: BTreeMap<String, BTreeMap<String, StoredCollection>>,
    calls: Vec<DriverCall>,
    failing_drops: BTreeSet<String>,
    fail_index_creation: bool,
}

/// Shared in-memory document store.
///
/// Cloning yields another handle to the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> DriverResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| DriverError::Internal("Lock poisoned".into()))
    }

    fn inspect(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create an empty collection if it does not exist yet
    pub fn create_collection(&self, database: &str, collection: &str) {
        self.inspect()
            .databases
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default();
    }

    /// Insert a document, creating the collection on demand
    pub fn insert(&self, database: &str, collection: &str, document: Value) {
        self.inspect()
            .databases
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default()
            .documents
            .push(document);
    }

    /// Collection names in `database`, sorted
    pub fn collection_names(&self, database: &str) -> Vec<String> {
        self.inspect()
            .databases
            .get(database)
            .map(|collections| collections.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Indexes created on a collection, as `(keys, options)` in creation order
    pub fn indexes(&self, database: &str, collection: &str) -> Vec<(Value, Value)> {
        self.inspect()
            .databases
            .get(database)
            .and_then(|collections| collections.get(collection))
            .map(|c| c.indexes.clone())
            .unwrap_or_default()
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<DriverCall> {
        self.inspect().calls.clone()
    }

    /// Only the index creation calls
    pub fn index_calls(&self) -> Vec<DriverCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, DriverCall::CreateIndex { .. }))
            .collect()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.inspect().calls.clear();
    }

    /// Make dropping `collection` fail
    pub fn fail_drop_of(&self, collection: &str) {
        self.inspect().failing_drops.insert(collection.to_string());
    }

    /// Make every index creation fail
    pub fn fail_index_creation(&self, fail: bool) {
        self.inspect().fail_index_creation = fail;
    }

    /// Open a session with no database selected
    pub fn session(&self) -> MemorySession {
        MemorySession {
            store: self.clone(),
            database: None,
        }
    }
}

impl SessionRegistry for MemoryStore {
    fn default_session(&self) -> DriverResult<Box<dyn Session + '_>> {
        Ok(Box::new(self.session()))
    }
}

/// Session over a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemorySession {
    store: MemoryStore,
    database: Option<String>,
}

impl MemorySession {
    /// Currently selected database
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }
}

impl Session for MemorySession {
    fn use_database(&mut self, name: &str) -> DriverResult<()> {
        let mut state = self.store.lock()?;
        state.calls.push(DriverCall::UseDatabase(name.to_string()));
        state.databases.entry(name.to_string()).or_default();
        self.database = Some(name.to_string());
        Ok(())
    }

    fn collection(&self, name: &str) -> Box<dyn Collection + '_> {
        Box::new(MemoryCollection {
            session: self,
            name: name.to_string(),
        })
    }
}

/// Collection handle borrowed from a [`MemorySession`].
pub struct MemoryCollection<'a> {
    session: &'a MemorySession,
    name: String,
}

impl MemoryCollection<'_> {
    fn database(&self, command: &str) -> DriverResult<&str> {
        self.session
            .database
            .as_deref()
            .ok_or_else(|| DriverError::command_failed(command, "no database selected"))
    }
}

impl Collection for MemoryCollection<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn find(&self, filter: &Value) -> DriverResult<Vec<Value>> {
        let database = self.database("find")?;
        let mut state = self.session.store.lock()?;
        state.calls.push(DriverCall::Find {
            collection: self.name.clone(),
            filter: filter.clone(),
        });

        let Some(collections) = state.databases.get(database) else {
            return Ok(Vec::new());
        };

        if self.name == NAMESPACES_COLLECTION {
            return Ok(namespaces(database, collections));
        }

        let documents = collections
            .get(&self.name)
            .map(|c| {
                c.documents
                    .iter()
                    .filter(|doc| matches_filter(doc, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(documents)
    }

    fn drop_collection(&self) -> DriverResult<()> {
        let database = self.database("drop")?;
        let mut state = self.session.store.lock()?;
        state.calls.push(DriverCall::Drop {
            collection: self.name.clone(),
        });

        if state.failing_drops.contains(&self.name) {
            return Err(DriverError::command_failed(
                "drop",
                format!("cannot drop {}", self.name),
            ));
        }

        if let Some(collections) = state.databases.get_mut(database) {
            collections.remove(&self.name);
        }
        Ok(())
    }

    fn create_index(&self, keys: &Value, options: &Value) -> DriverResult<()> {
        let database = self.database("createIndexes")?;
        let mut state = self.session.store.lock()?;
        state.calls.push(DriverCall::CreateIndex {
            collection: self.name.clone(),
            keys: keys.clone(),
            options: options.clone(),
        });

        if state.fail_index_creation {
            return Err(DriverError::command_failed(
                "createIndexes",
                format!("index build failed on {}", self.name),
            ));
        }

        state
            .databases
            .entry(database.to_string())
            .or_default()
            .entry(self.name.clone())
            .or_default()
            .indexes
            .push((keys.clone(), options.clone()));
        Ok(())
    }
}

/// Namespace listing in the shape of `system.namespaces`: one entry per
/// collection, one per index (`db.coll.$field_dir`), and `db.system.indexes`
/// once any index exists.
fn namespaces(database: &str, collections: &BTreeMap<String, StoredCollection>) -> Vec<Value> {
    let mut entries = Vec::new();
    let mut any_index = false;

    for (name, collection) in collections {
        entries.push(json!({ "name": format!("{}.{}", database, name) }));
        for (keys, _) in &collection.indexes {
            any_index = true;
            entries.push(json!({
                "name": format!("{}.{}.${}", database, name, index_name(keys))
            }));
        }
    }

    if any_index {
        entries.push(json!({ "name": format!("{}.system.indexes", database) }));
    }
    entries
}

fn index_name(keys: &Value) -> String {
    keys.as_object()
        .map(|fields| {
            fields
                .iter()
                .map(|(field, dir)| format!("{}_{}", field, dir))
                .collect::<Vec<_>>()
                .join("_")
        })
        .unwrap_or_default()
}

fn matches_filter(document: &Value, filter: &Value) -> bool {
    let Some(criteria) = filter.as_object() else {
        return true;
    };
    let empty = Map::new();
    let fields = document.as_object().unwrap_or(&empty);
    criteria
        .iter()
        .all(|(key, expected)| fields.get(key) == Some(expected))
}
