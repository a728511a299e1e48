//! Domain layer: keys, normalized entries and closure computation
//!
//! This layer is independent of external concerns (no configuration, no I/O).

pub mod closure;
pub mod entries;
pub mod error;
pub mod key;

pub use closure::{Closure, Traversal};
pub use entries::EntryTable;
pub use error::{DomainError, DomainResult};
pub use key::{BranchName, Key, Relation};
