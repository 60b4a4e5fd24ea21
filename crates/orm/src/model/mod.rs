//! Model System - Records, identifiers and typed models
//!
//! - `primary_key`: Identifier values for records and foreign keys
//! - `record`: Dynamic entity instances exchanged with the entity store
//! - `core_trait`: Model trait converting typed structs to and from records

pub mod core_trait;
pub mod primary_key;
pub mod record;

// Re-export main types and traits for convenience
pub use core_trait::Model;
pub use primary_key::PrimaryKey;
pub use record::{Attributes, Record};
