//! Bibliography entry model shared by the bibkit crates
//!
//! This crate provides the in-memory model the text round trip produces and consumes:
//! - Entry: typed record with a citation key and ordered raw fields
//! - Author: structured personal name with two canonical renderings
//! - PageRange, Doi: validated value types behind the typed entry views
//! - ValidationResult: errors and warnings as data
//! - Registry: custom entry types and field aliases, shared as `Arc<Registry>`

pub mod author;
pub mod doi;
pub mod entry;
pub mod entry_type;
pub mod error;
pub mod page_range;
pub mod registry;
pub mod validation;

pub use author::*;
pub use doi::*;
pub use entry::*;
pub use entry_type::*;
pub use error::*;
pub use page_range::*;
pub use registry::*;
pub use validation::*;
