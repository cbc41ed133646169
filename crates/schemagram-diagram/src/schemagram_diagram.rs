//! Schemagram Diagram - entity-relationship diagrams over database catalogs
//!
//! This crate provides:
//! - The diagram model (entities, attributes, associations, notes)
//! - Foreign key resolution as tables enter and leave a diagram
//! - Catalog collection of diagram contents
//! - JSON documents for saving and reloading diagrams
//! - Data source discovery in legacy XML diagrams

mod association;
mod attribute;
mod collector;
mod diagram;
mod entity;
mod error;
pub mod legacy;
pub mod persistence;
mod provider;
mod settings;

pub use association::{AssociationId, ErdAssociation, Point};
pub use attribute::{AttributeVisibility, ErdAttribute};
pub use collector::{CollectorSettings, DiagramObjectCollector};
pub use diagram::{DataSourceEntities, DiagramEvent, ErdDiagram, ErdNote};
pub use entity::{Bounds, EntityId, ErdEntity};
pub use error::DiagramError;
pub use provider::{ContentProvider, DefaultContentProvider};
pub use settings::DiagramSettings;

// Re-export persistence types for convenience
pub use persistence::{
    AssociationRecord, AttributeRecord, DiagramDocument, DocumentData, DocumentError,
    EntityRecord, LoadedDiagram, PersistContext, load_diagram,
};
