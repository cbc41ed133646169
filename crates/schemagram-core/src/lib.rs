//! Schemagram Core - catalog abstractions for the ERD model
//!
//! This crate defines what the diagram layer knows about databases:
//!
//! - `ObjectRef` - identity of a catalog object
//! - `EntityInfo`, `ColumnInfo`, `ForeignKeyInfo` - cached table metadata
//! - `SchemaNavigator` - async trait for walking catalogs
//! - `ProgressMonitor` - cooperative cancellation for long traversals
//! - `IdentifierRules` - per data source quoting of qualified names
//! - `MemoryCatalog` - an in-memory navigator

mod catalog;
mod error;
mod filter;
mod identifier;
mod memory;
mod navigator;
mod progress;

pub use catalog::*;
pub use error::*;
pub use filter::*;
pub use identifier::*;
pub use memory::*;
pub use navigator::*;
pub use progress::*;
