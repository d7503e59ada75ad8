//! Index Registration Tests
//!
//! Tests for index invariants:
//! - One spec per field; later declarations overwrite earlier ones
//! - Hereditary models get exactly one `_type` index
//! - Creation issues one driver call per spec, in registration order
//! - `autocreate_indexes` creates indexes as they are declared
//! - Driver failures are returned unchanged

use docmapper::config::ConfigStore;
use docmapper::driver::{DriverCall, DriverError, MemorySession, MemoryStore, Session};
use docmapper::index::{
    IndexCatalog, IndexError, IndexOptions, IndexRegistry, ModelDescriptor, DISCRIMINATOR_FIELD,
};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn open(store: &MemoryStore, database: &str) -> MemorySession {
    let mut session = store.session();
    session.use_database(database).unwrap();
    session
}

fn person() -> ModelDescriptor {
    ModelDescriptor::new("Person", "people")
}

fn autocreating_config() -> ConfigStore {
    let mut config = ConfigStore::new();
    config
        .apply_settings(json!({ "options": { "autocreate_indexes": true } }))
        .unwrap();
    config
}

// =============================================================================
// Registration Tests
// =============================================================================

/// Redeclaring a field leaves a single spec with the latest options.
#[test]
fn test_redeclared_field_overwrites() {
    let store = MemoryStore::new();
    let session = open(&store, "app");
    let people = session.collection("people");
    let config = ConfigStore::new();

    let mut registry = IndexRegistry::new(person());
    registry.index(&json!({ "name": 1 }), &config, people.as_ref()).unwrap();
    registry
        .index(&json!({ "name": -1, "unique": true }), &config, people.as_ref())
        .unwrap();

    assert_eq!(registry.len(), 1);
    let spec = registry.get("name").unwrap();
    assert_eq!(spec.options, IndexOptions::unique());
    assert_eq!(spec.options.to_document(), json!({ "unique": true }));
}

/// Non-hereditary models get no default index.
#[test]
fn test_default_indexes_skip_plain_models() {
    let store = MemoryStore::new();
    let session = open(&store, "app");
    let config = ConfigStore::new();

    let mut registry = IndexRegistry::new(person());
    registry
        .add_default_indexes(&config, session.collection("people").as_ref())
        .unwrap();

    assert!(registry.is_empty());
}

/// Hereditary models get one `_type` index with background creation.
#[test]
fn test_default_indexes_for_hereditary_model() {
    let store = MemoryStore::new();
    let session = open(&store, "app");
    let people = session.collection("people");
    let config = ConfigStore::new();

    let mut registry = IndexRegistry::new(person().hereditary());
    registry.index(&json!({ "name": 1 }), &config, people.as_ref()).unwrap();
    registry.add_default_indexes(&config, people.as_ref()).unwrap();

    assert_eq!(registry.len(), 2);
    let spec = registry.get(DISCRIMINATOR_FIELD).unwrap();
    assert_eq!(spec.key.to_document(), json!({ "_type": 1 }));
    assert_eq!(
        spec.options.to_document(),
        json!({ "unique": false, "background": true })
    );
}

/// Empty definitions are rejected.
#[test]
fn test_empty_definition_rejected() {
    let store = MemoryStore::new();
    let session = open(&store, "app");
    let config = ConfigStore::new();

    let mut registry = IndexRegistry::new(person());
    let result = registry.index(&json!({}), &config, session.collection("people").as_ref());

    assert!(matches!(result, Err(IndexError::InvalidIndexSpec(_))));
}

/// Numeric directions other than 1 and -1 reach the driver as written.
#[test]
fn test_numeric_direction_passes_through() {
    let store = MemoryStore::new();
    let session = open(&store, "app");
    let people = session.collection("people");
    let config = ConfigStore::new();

    let mut registry = IndexRegistry::new(person());
    registry.index(&json!({ "rank": 2 }), &config, people.as_ref()).unwrap();
    registry
        .index(&json!({ "name": 1, "unique": 1 }), &config, people.as_ref())
        .unwrap();
    registry.create_indexes(people.as_ref()).unwrap();

    assert_eq!(
        store.index_calls(),
        vec![
            DriverCall::CreateIndex {
                collection: "people".into(),
                keys: json!({ "rank": 2 }),
                options: json!({ "unique": false }),
            },
            DriverCall::CreateIndex {
                collection: "people".into(),
                keys: json!({ "name": 1 }),
                options: json!({ "unique": 1 }),
            },
        ]
    );
}

/// Zero is not a direction.
#[test]
fn test_zero_direction_rejected() {
    let store = MemoryStore::new();
    let session = open(&store, "app");
    let config = ConfigStore::new();

    let mut registry = IndexRegistry::new(person());
    let result = registry.index(&json!({ "rank": 0 }), &config, session.collection("people").as_ref());

    assert!(matches!(result, Err(IndexError::InvalidIndexSpec(_))));
    assert!(registry.is_empty());
}

// =============================================================================
// Creation Tests
// =============================================================================

/// No specs, no driver calls.
#[test]
fn test_create_empty_registry() {
    let store = MemoryStore::new();
    let session = open(&store, "app");
    store.clear_calls();

    let registry = IndexRegistry::new(person());
    let count = registry
        .create_indexes(session.collection("people").as_ref())
        .unwrap();

    assert_eq!(count, 0);
    assert!(store.calls().is_empty());
}

/// N specs produce N calls in registration order.
#[test]
fn test_create_in_registration_order() {
    let store = MemoryStore::new();
    let session = open(&store, "app");
    let people = session.collection("people");
    let config = ConfigStore::new();

    let mut registry = IndexRegistry::new(person());
    registry.index(&json!({ "last_name": 1 }), &config, people.as_ref()).unwrap();
    registry
        .index(&json!({ "email": 1, "unique": true, "sparse": true }), &config, people.as_ref())
        .unwrap();
    registry.index(&json!({ "age": -1 }), &config, people.as_ref()).unwrap();
    assert!(store.index_calls().is_empty());

    let count = registry.create_indexes(people.as_ref()).unwrap();

    assert_eq!(count, 3);
    assert_eq!(
        store.index_calls(),
        vec![
            DriverCall::CreateIndex {
                collection: "people".into(),
                keys: json!({ "last_name": 1 }),
                options: json!({ "unique": false }),
            },
            DriverCall::CreateIndex {
                collection: "people".into(),
                keys: json!({ "email": 1 }),
                options: json!({ "unique": true, "sparse": true }),
            },
            DriverCall::CreateIndex {
                collection: "people".into(),
                keys: json!({ "age": -1 }),
                options: json!({ "unique": false }),
            },
        ]
    );
    assert_eq!(store.indexes("app", "people").len(), 3);
}

/// With autocreate on, every declaration flushes the whole registry.
#[test]
fn test_autocreate_flushes_on_declaration() {
    let store = MemoryStore::new();
    let session = open(&store, "app");
    let people = session.collection("people");
    let config = autocreating_config();

    let mut registry = IndexRegistry::new(person().hereditary());
    registry.index(&json!({ "name": 1 }), &config, people.as_ref()).unwrap();
    assert_eq!(store.index_calls().len(), 1);

    registry.add_default_indexes(&config, people.as_ref()).unwrap();
    assert_eq!(store.index_calls().len(), 3);
}

/// Driver errors come back unchanged.
#[test]
fn test_driver_failure_propagates() {
    let store = MemoryStore::new();
    let session = open(&store, "app");
    let people = session.collection("people");
    let config = ConfigStore::new();

    let mut registry = IndexRegistry::new(person());
    registry.index(&json!({ "name": 1 }), &config, people.as_ref()).unwrap();
    registry.index(&json!({ "age": 1 }), &config, people.as_ref()).unwrap();
    store.fail_index_creation(true);

    let err = registry.create_indexes(people.as_ref()).unwrap_err();

    assert!(matches!(
        err,
        IndexError::Driver(DriverError::CommandFailed { .. })
    ));
    assert_eq!(store.index_calls().len(), 1);
}

// =============================================================================
// Catalog Tests
// =============================================================================

/// The catalog flushes each model into its own collection.
#[test]
fn test_catalog_create_all() {
    let store = MemoryStore::new();
    let session = open(&store, "app");
    let config = ConfigStore::new();
    let account = ModelDescriptor::new("Account", "accounts");

    let mut catalog = IndexCatalog::new();
    {
        let people = session.collection("people");
        let registry = catalog.registry_for(&person().hereditary());
        registry.index(&json!({ "name": 1 }), &config, people.as_ref()).unwrap();
        registry.add_default_indexes(&config, people.as_ref()).unwrap();
    }
    {
        let accounts = session.collection("accounts");
        catalog
            .registry_for(&account)
            .index(&json!({ "number": 1, "unique": true }), &config, accounts.as_ref())
            .unwrap();
    }

    let total = catalog.create_all(&session).unwrap();

    assert_eq!(total, 3);
    assert_eq!(store.indexes("app", "people").len(), 2);
    assert_eq!(
        store.indexes("app", "accounts"),
        vec![(json!({ "number": 1 }), json!({ "unique": true }))]
    );
}
