//! Application layer: engine construction and queries
//!
//! This layer orchestrates the domain and applies build settings.

pub mod engine;
pub mod error;

pub use engine::{ClosureEngine, EngineBuilder};
pub use error::{ApplicationError, ApplicationResult};
