//! Document-store driver interfaces
//!
//! The mapper never talks to a store directly. Index creation and purge go
//! through the traits below; a real driver implements them, and
//! [`memory::MemoryStore`] provides an in-process implementation.

mod errors;
pub mod memory;
mod session;

pub use errors::{DriverError, DriverResult};
pub use memory::{DriverCall, MemorySession, MemoryStore};
pub use session::{Collection, Session, SessionRegistry};
