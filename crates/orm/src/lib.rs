//! # elif-associations: belongs-to references for elif.rs models
//!
//! A `BelongsTo` slot points from an owning record to at most one target
//! record through a foreign key stored on the owner. The target is loaded
//! lazily from an `EntityStore`, replaced wholesale on assignment, and an
//! optional counter cache on the target kind follows the reference around.
//!
//! Persistence is not part of this crate: the store is a collaborator
//! behind the `EntityStore` trait. `MemoryStore` implements it in process.

pub mod error;
pub mod model;
pub mod relationships;
pub mod store;

// Re-export core traits and types
pub use error::*;
pub use model::*;
pub use relationships::*;
pub use store::*;
