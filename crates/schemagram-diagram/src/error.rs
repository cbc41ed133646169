//! Diagram model errors
//!
//! These are programmer errors: everything caused by a broken catalog or a
//! stale document is logged and skipped instead.

use thiserror::Error;

use crate::{AssociationId, EntityId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiagramError {
    #[error("attribute '{attribute}' already exists in entity '{entity}'")]
    DuplicateAttribute { entity: String, attribute: String },

    #[error("attribute '{attribute}' not found in entity '{entity}'")]
    UnknownAttribute { entity: String, attribute: String },

    #[error(
        "association '{name}' has {source_count} source attributes but {target_count} target attributes"
    )]
    MismatchedConditions {
        name: String,
        source_count: usize,
        target_count: usize,
    },

    #[error("entity {0} is not part of the diagram")]
    UnknownEntity(EntityId),

    #[error("association {0} is not part of the diagram")]
    UnknownAssociation(AssociationId),
}
