//! Transitive closures over named, directed relations between keyed entries.
//!
//! Entries carry, per declared branch, a list of directly related ids. At
//! construction every entry's closure along every branch is computed once,
//! cycle-safe, and cached; queries read from that cache only.
//!
//! ```
//! use hierarchy_closure::{ClosureEngine, Key};
//! use serde_json::json;
//!
//! let engine = ClosureEngine::new(
//!     [(6, json!({"ancestor": 8})), (8, json!({"ancestor": 1}))],
//!     ["ancestor"],
//! )?;
//! let ancestors = engine.related_by("ancestor", [6])?;
//! assert_eq!(ancestors.into_iter().collect::<Vec<_>>(), vec![Key::from(1), Key::from(8)]);
//! # Ok::<(), hierarchy_closure::DomainError>(())
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod render;
pub mod util;

pub use application::{ApplicationError, ApplicationResult, ClosureEngine, EngineBuilder};
pub use config::{BuildSettings, Settings};
pub use domain::{BranchName, Closure, DomainError, DomainResult, Key, Relation};
