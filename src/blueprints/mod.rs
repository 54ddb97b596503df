//! Creature blueprint loading
//!
//! Blueprints are JSON documents listed in an index. The store fetches them
//! from a content source, runs the migration chain and validates the result
//! before anything downstream sees it.

pub mod migration;
pub mod schema;
pub mod source;
pub mod store;
pub mod validation;

pub use migration::{current_version, migrate};
pub use schema::*;
pub use source::{
    source_for_root, ContentSource, FsContentSource, HttpContentSource, MemoryContentSource,
};
pub use store::{BlueprintCache, BlueprintIndex, BlueprintStore};
pub use validation::{into_document, validate, REQUIRED_FIELDS};
