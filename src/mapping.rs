//! Mapping engine collaborator
//!
//! Model declarations reject field names that would shadow methods the
//! mapping engine defines on every document.

use std::collections::BTreeSet;

/// The part of the mapping engine the configuration layer reads.
pub trait MappingEngine: Send + Sync {
    /// Method names a field definition must not shadow.
    fn prohibited_method_names(&self) -> BTreeSet<String>;
}

/// Methods every mapped document responds to.
const DOCUMENT_METHODS: &[&str] = &[
    "_destroy",
    "_index",
    "_parent",
    "_root",
    "attributes",
    "changed",
    "changed_attributes",
    "changes",
    "collection",
    "db",
    "delete",
    "destroy",
    "destroyed",
    "errors",
    "fields",
    "frozen",
    "insert",
    "new_record",
    "persisted",
    "reload",
    "remove",
    "save",
    "to_key",
    "update",
    "update_attribute",
    "update_attributes",
    "valid",
];

/// Built-in mapping engine with a fixed method set.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardMapping;

impl MappingEngine for StandardMapping {
    fn prohibited_method_names(&self) -> BTreeSet<String> {
        DOCUMENT_METHODS.iter().map(|m| m.to_string()).collect()
    }
}
