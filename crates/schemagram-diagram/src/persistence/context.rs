//! Id assignment and icon interning for document writing

use indexmap::IndexSet;
use std::collections::HashMap;

use crate::{AssociationId, EntityId};

/// Assigns document ids to diagram elements in first-visit order
#[derive(Debug, Default)]
pub struct PersistContext {
    next_id: u32,
    entities: HashMap<EntityId, u32>,
    associations: HashMap<AssociationId, u32>,
    icons: IndexSet<String>,
}

impl PersistContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Document id of an entity, assigned on first call
    pub fn entity_id(&mut self, id: EntityId) -> u32 {
        if let Some(existing) = self.entities.get(&id) {
            return *existing;
        }
        let assigned = self.next();
        self.entities.insert(id, assigned);
        assigned
    }

    /// Document id of an association, assigned on first call
    pub fn association_id(&mut self, id: AssociationId) -> u32 {
        if let Some(existing) = self.associations.get(&id) {
            return *existing;
        }
        let assigned = self.next();
        self.associations.insert(id, assigned);
        assigned
    }

    /// Id of an entity that was already written
    pub fn lookup_entity(&self, id: EntityId) -> Option<u32> {
        self.entities.get(&id).copied()
    }

    /// Index of `icon` in the icon table
    pub fn intern_icon(&mut self, icon: &str) -> usize {
        self.icons.insert_full(icon.to_string()).0
    }

    pub fn icons(&self) -> impl Iterator<Item = &str> {
        self.icons.iter().map(String::as_str)
    }

    pub fn into_icons(self) -> Vec<String> {
        self.icons.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_sequential_and_stable() {
        let mut context = PersistContext::new();
        assert_eq!(context.entity_id(EntityId(7)), 1);
        assert_eq!(context.entity_id(EntityId(3)), 2);
        assert_eq!(context.association_id(AssociationId(0)), 3);
        assert_eq!(context.entity_id(EntityId(7)), 1);
        assert_eq!(context.lookup_entity(EntityId(3)), Some(2));
        assert_eq!(context.lookup_entity(EntityId(9)), None);
    }

    #[test]
    fn test_icons_interned_once() {
        let mut context = PersistContext::new();
        assert_eq!(context.intern_icon("table"), 0);
        assert_eq!(context.intern_icon("view"), 1);
        assert_eq!(context.intern_icon("table"), 0);
        assert_eq!(context.into_icons(), vec!["table".to_string(), "view".to_string()]);
    }
}
