//! Diagram persistence
//!
//! Diagrams are saved as JSON documents that reference entities by a
//! sequential integer id and resolve them back through the catalog on load.
//! Loading is best-effort: anything that no longer resolves is reported as a
//! warning and skipped.

mod context;
mod document;
mod loader;

pub use context::*;
pub use document::*;
pub use loader::*;
