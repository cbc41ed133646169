//! Diagram entities

use schemagram_core::{CompiledNameFilter, EntityInfo, ForeignKeyInfo, ObjectRef};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::{AssociationId, AttributeVisibility, DiagramError, ErdAttribute};

/// Handle of an entity inside a diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub(crate) u32);

impl EntityId {
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#e{}", self.0)
    }
}

/// Layout hint for an entity or note
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Diagram wrapper around one table or view
#[derive(Debug, Clone)]
pub struct ErdEntity {
    info: Arc<EntityInfo>,
    pub alias: Option<String>,
    /// Root of exploration
    pub primary: bool,
    /// Per-entity override of the diagram's visibility policy
    pub visibility: Option<AttributeVisibility>,
    pub description: Option<String>,
    pub bounds: Option<Bounds>,
    attributes: Vec<ErdAttribute>,
    attributes_loaded: bool,
    pub(crate) unresolved_keys: Vec<ForeignKeyInfo>,
    pub(crate) outgoing: Vec<AssociationId>,
    pub(crate) incoming: Vec<AssociationId>,
}

impl ErdEntity {
    /// Wrap a catalog entity. Every foreign key starts out unresolved.
    pub fn new(info: EntityInfo) -> Self {
        let unresolved_keys = info.foreign_keys.clone();
        Self {
            info: Arc::new(info),
            alias: None,
            primary: false,
            visibility: None,
            description: None,
            bounds: None,
            attributes: Vec::new(),
            attributes_loaded: false,
            unresolved_keys,
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias;
        self
    }

    pub fn with_primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    pub fn with_visibility(mut self, visibility: AttributeVisibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn object(&self) -> &ObjectRef {
        &self.info.object
    }

    pub fn info(&self) -> &EntityInfo {
        &self.info
    }

    /// Alias if set, otherwise the table name
    pub fn name(&self) -> &str {
        self.alias.as_deref().unwrap_or_else(|| self.info.name())
    }

    pub fn is_view(&self) -> bool {
        self.info.is_view()
    }

    pub fn attributes(&self) -> &[ErdAttribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&ErdAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut ErdAttribute> {
        self.attributes.iter_mut().find(|a| a.name == name)
    }

    /// Whether attributes were filled or added explicitly
    pub fn attributes_loaded(&self) -> bool {
        self.attributes_loaded
    }

    /// Outgoing associations (this entity holds the key)
    pub fn associations(&self) -> &[AssociationId] {
        &self.outgoing
    }

    /// Incoming associations (this entity is referenced)
    pub fn references(&self) -> &[AssociationId] {
        &self.incoming
    }

    /// Foreign keys whose target is not in the diagram yet
    pub fn unresolved_keys(&self) -> &[ForeignKeyInfo] {
        &self.unresolved_keys
    }

    /// Add an attribute for a column of this entity.
    ///
    /// Fails if the entity already has an attribute for the same column.
    pub fn add_attribute(&mut self, attribute: ErdAttribute) -> Result<(), DiagramError> {
        if self.attribute(&attribute.name).is_some() {
            return Err(DiagramError::DuplicateAttribute {
                entity: self.info.name().to_string(),
                attribute: attribute.name,
            });
        }
        self.attributes.push(attribute);
        self.attributes_loaded = true;
        Ok(())
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<ErdAttribute> {
        let index = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(index))
    }

    /// (Re)load attributes from the catalog snapshot.
    ///
    /// The key set is the best identifier plus referential and constraint
    /// columns; the visibility policy then picks from the full column list.
    /// Inherited and hidden columns never show, and columns rejected by the
    /// data source's attribute filter are dropped regardless of policy.
    /// Alias and checked state of attributes that survive the reload are kept.
    pub fn fill_attributes(
        &mut self,
        visibility: AttributeVisibility,
        filter: Option<&CompiledNameFilter>,
    ) {
        let identifier: HashSet<&str> = self.info.best_identifier().into_iter().collect();
        let referential = self.info.referential_columns();
        let foreign = self.info.foreign_key_columns();

        let mut columns: Vec<_> = self.info.columns.iter().collect();
        columns.sort_by_key(|c| c.ordinal);

        let previous = std::mem::take(&mut self.attributes);
        for column in columns {
            if column.is_inherited || column.is_hidden {
                continue;
            }
            if filter.is_some_and(|f| !f.matches(&column.name)) {
                continue;
            }
            let name = column.name.as_str();
            let in_identifier = identifier.contains(name);
            let visible = match visibility {
                AttributeVisibility::All => true,
                AttributeVisibility::Primary => in_identifier,
                AttributeVisibility::Keys => in_identifier || referential.contains(name),
                AttributeVisibility::None => false,
            };
            if !visible {
                continue;
            }
            let mut attribute =
                ErdAttribute::from_column(column, in_identifier, foreign.contains(name));
            if let Some(old) = previous.iter().find(|a| a.name == column.name) {
                attribute.alias = old.alias.clone();
                attribute.checked = old.checked;
            }
            self.attributes.push(attribute);
        }
        self.attributes_loaded = true;
        tracing::trace!(
            entity = %self.info.object,
            visibility = visibility.as_str(),
            attribute_count = self.attributes.len(),
            "filled entity attributes"
        );
    }

    /// Move the named attributes to the front, in the given order, and
    /// renumber display order. Unknown names are ignored.
    pub fn reorder_attributes(&mut self, names: &[&str]) {
        let mut reordered = Vec::with_capacity(self.attributes.len());
        for name in names {
            if let Some(index) = self.attributes.iter().position(|a| a.name == *name) {
                reordered.push(self.attributes.remove(index));
            }
        }
        reordered.append(&mut self.attributes);
        for (order, attribute) in reordered.iter_mut().enumerate() {
            attribute.order = order;
        }
        self.attributes = reordered;
    }
}

#[cfg(test)]
mod tests;
