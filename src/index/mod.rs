//! Declarative index management
//!
//! Models declare index specs; the specs are kept per model and sent to the
//! document store on demand, or immediately when `autocreate_indexes` is on.
//!
//! # Invariants
//!
//! - One spec per field; redeclaring a field replaces its spec in place
//! - Creation issues exactly one driver call per spec, in registration order
//! - Driver failures are returned unchanged

mod catalog;
mod errors;
mod registry;
mod spec;

pub use catalog::IndexCatalog;
pub use errors::{IndexError, IndexResult};
pub use registry::{IndexRegistry, ModelDescriptor, DISCRIMINATOR_FIELD};
pub use spec::{IndexDirection, IndexKey, IndexOptions, IndexSpec};
