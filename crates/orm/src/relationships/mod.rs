//! Relationships Module - Belongs-to reference slots

pub mod belongs_to;
pub mod config;
pub mod handle;
pub mod owner;

#[cfg(test)]
mod belongs_to_tests;

// Re-export main types
pub use belongs_to::*;
pub use config::*;
pub use handle::*;
pub use owner::*;
