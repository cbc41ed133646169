//! Associations between entities

use schemagram_core::{ConstraintKind, ForeignKeyInfo};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{DiagramError, EntityId};

/// Handle of an association inside a diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssociationId(pub(crate) u32);

impl AssociationId {
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for AssociationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#a{}", self.0)
    }
}

/// Bend point of a connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Relationship from a source entity (holding the foreign key) to a target
/// entity (holding the referenced key).
///
/// `source_attributes[i]` joins `target_attributes[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ErdAssociation {
    pub name: String,
    pub kind: ConstraintKind,
    pub(crate) source: EntityId,
    pub(crate) target: EntityId,
    source_attributes: Vec<String>,
    target_attributes: Vec<String>,
    /// Routing hints for rendering
    pub bends: Vec<Point>,
    /// Foreign key this association was materialized from
    pub(crate) key: Option<ForeignKeyInfo>,
}

impl ErdAssociation {
    pub fn new(
        name: impl Into<String>,
        kind: ConstraintKind,
        source: EntityId,
        target: EntityId,
        source_attributes: Vec<String>,
        target_attributes: Vec<String>,
    ) -> Result<Self, DiagramError> {
        let name = name.into();
        if !source_attributes.is_empty()
            && !target_attributes.is_empty()
            && source_attributes.len() != target_attributes.len()
        {
            return Err(DiagramError::MismatchedConditions {
                name,
                source_count: source_attributes.len(),
                target_count: target_attributes.len(),
            });
        }
        Ok(Self {
            name,
            kind,
            source,
            target,
            source_attributes,
            target_attributes,
            bends: Vec::new(),
            key: None,
        })
    }

    /// Association backed by a catalog foreign key
    pub(crate) fn from_key(
        key: &ForeignKeyInfo,
        source: EntityId,
        target: EntityId,
    ) -> Result<Self, DiagramError> {
        let mut association = Self::new(
            key.name.clone(),
            key.kind,
            source,
            target,
            key.columns.clone(),
            key.referenced_columns.clone(),
        )?;
        association.key = Some(key.clone());
        Ok(association)
    }

    pub fn source(&self) -> EntityId {
        self.source
    }

    pub fn target(&self) -> EntityId {
        self.target
    }

    pub fn source_attributes(&self) -> &[String] {
        &self.source_attributes
    }

    pub fn target_attributes(&self) -> &[String] {
        &self.target_attributes
    }

    /// Join conditions as (source attribute, target attribute)
    pub fn condition_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.source_attributes
            .iter()
            .zip(self.target_attributes.iter())
            .map(|(s, t)| (s.as_str(), t.as_str()))
    }

    pub fn condition_count(&self) -> usize {
        self.source_attributes.len().min(self.target_attributes.len())
    }

    pub fn is_logical(&self) -> bool {
        self.kind == ConstraintKind::Logical
    }

    pub fn is_self_reference(&self) -> bool {
        self.source == self.target
    }

    pub fn foreign_key(&self) -> Option<&ForeignKeyInfo> {
        self.key.as_ref()
    }
}
