//! Diagram aggregate
//!
//! `ErdDiagram` owns the entity and association arenas and keeps three
//! indices in step with them: display order, the object -> entity map, and
//! the per data source / per container grouping. Foreign keys whose target
//! is missing stay queued on their entity and are retried on every insert.

use indexmap::IndexMap;
use parking_lot::RwLock;
use schemagram_core::{
    ConstraintKind, DataSourceId, DataSourceInfo, ForeignKeyInfo, ObjectRef, ProjectId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::{
    AssociationId, Bounds, ContentProvider, DefaultContentProvider, DiagramError, EntityId,
    ErdAssociation, ErdEntity, Point,
};

const EVENT_CAPACITY: usize = 256;

/// Change notification for listeners that mirror the diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramEvent {
    EntityAdded(EntityId),
    EntityRemoved(EntityId),
    EntityChanged(EntityId),
    AssociationAdded(AssociationId),
    AssociationRemoved(AssociationId),
    NotesChanged,
}

/// Free-text note placed on the diagram
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErdNote {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
}

impl ErdNote {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bounds: None,
        }
    }
}

/// Entities of one data source grouped by container (schema or catalog)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceEntities {
    pub data_source: DataSourceId,
    pub containers: Vec<(ObjectRef, Vec<EntityId>)>,
}

#[derive(Debug, Default)]
struct DiagramState {
    next_entity: u32,
    next_association: u32,
    entities: HashMap<EntityId, ErdEntity>,
    order: Vec<EntityId>,
    associations: IndexMap<AssociationId, ErdAssociation>,
    entity_map: HashMap<ObjectRef, EntityId>,
    data_sources: IndexMap<DataSourceId, IndexMap<ObjectRef, Vec<EntityId>>>,
    known_sources: IndexMap<DataSourceId, DataSourceInfo>,
    notes: Vec<ErdNote>,
    error_messages: Vec<String>,
}

impl DiagramState {
    fn insert_association(&mut self, association: ErdAssociation) -> AssociationId {
        let id = AssociationId(self.next_association);
        self.next_association += 1;
        if let Some(source) = self.entities.get_mut(&association.source) {
            source.outgoing.push(id);
        }
        if let Some(target) = self.entities.get_mut(&association.target) {
            target.incoming.push(id);
        }
        self.associations.insert(id, association);
        id
    }

    fn detach_association(&mut self, id: AssociationId) -> Option<ErdAssociation> {
        let association = self.associations.shift_remove(&id)?;
        if let Some(source) = self.entities.get_mut(&association.source) {
            source.outgoing.retain(|a| *a != id);
        }
        if let Some(target) = self.entities.get_mut(&association.target) {
            target.incoming.retain(|a| *a != id);
        }
        Some(association)
    }

    fn find_association(
        &self,
        source: EntityId,
        target: EntityId,
        name: &str,
    ) -> Option<AssociationId> {
        let entity = self.entities.get(&source)?;
        entity.outgoing.iter().copied().find(|id| {
            self.associations
                .get(id)
                .is_some_and(|a| a.target == target && a.name == name)
        })
    }

    fn find_key_association(
        &self,
        source: EntityId,
        key: &ForeignKeyInfo,
    ) -> Option<AssociationId> {
        let entity = self.entities.get(&source)?;
        entity.outgoing.iter().copied().find(|id| {
            self.associations
                .get(id)
                .is_some_and(|a| a.key.as_ref() == Some(key))
        })
    }

    /// Materialize the queued keys of one entity whose targets are present
    fn resolve_entity(&mut self, id: EntityId) -> Vec<AssociationId> {
        let pending = match self.entities.get_mut(&id) {
            Some(entity) if !entity.unresolved_keys.is_empty() => {
                std::mem::take(&mut entity.unresolved_keys)
            }
            _ => return Vec::new(),
        };

        let mut unresolved = Vec::new();
        let mut created = Vec::new();
        for key in pending {
            let Some(target) = self.entity_map.get(&key.referenced).copied() else {
                unresolved.push(key);
                continue;
            };
            if self.find_key_association(id, &key).is_some() {
                continue;
            }
            match ErdAssociation::from_key(&key, id, target) {
                Ok(association) => {
                    tracing::debug!(
                        key = %key.name,
                        source = %id,
                        target = %target,
                        "resolved foreign key"
                    );
                    created.push(self.insert_association(association));
                }
                Err(err) => {
                    tracing::warn!(key = %key.name, error = %err, "dropping malformed foreign key");
                }
            }
        }

        if let Some(entity) = self.entities.get_mut(&id) {
            entity.unresolved_keys = unresolved;
        }
        created
    }

    fn resolve_all(&mut self) -> Vec<AssociationId> {
        let ids = self.order.clone();
        ids.into_iter()
            .flat_map(|id| self.resolve_entity(id))
            .collect()
    }

    fn has_resolvable_keys(&self) -> bool {
        self.entities.values().any(|entity| {
            entity
                .unresolved_keys
                .iter()
                .any(|key| self.entity_map.contains_key(&key.referenced))
        })
    }

    fn index_entity(&mut self, id: EntityId, object: &ObjectRef) {
        let container = object.parent().unwrap_or_else(|| object.clone());
        self.data_sources
            .entry(object.data_source.clone())
            .or_default()
            .entry(container)
            .or_default()
            .push(id);
    }

    fn unindex_entity(&mut self, id: EntityId, object: &ObjectRef) {
        let container = object.parent().unwrap_or_else(|| object.clone());
        let Some(bucket) = self.data_sources.get_mut(&object.data_source) else {
            return;
        };
        if let Some(ids) = bucket.get_mut(&container) {
            ids.retain(|e| *e != id);
            if ids.is_empty() {
                bucket.shift_remove(&container);
            }
        }
        if bucket.is_empty() {
            self.data_sources.shift_remove(&object.data_source);
        }
    }
}

/// Entity-relationship diagram
pub struct ErdDiagram {
    name: String,
    project: ProjectId,
    provider: Arc<dyn ContentProvider>,
    state: RwLock<DiagramState>,
    events: broadcast::Sender<DiagramEvent>,
}

impl fmt::Debug for ErdDiagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("ErdDiagram")
            .field("name", &self.name)
            .field("project", &self.project)
            .field("entities", &state.order.len())
            .field("associations", &state.associations.len())
            .finish()
    }
}

impl ErdDiagram {
    /// Create an empty diagram with the default content provider
    pub fn new(name: impl Into<String>, project: impl Into<ProjectId>) -> Self {
        Self::with_provider(name, project, Arc::new(DefaultContentProvider::new()))
    }

    pub fn with_provider(
        name: impl Into<String>,
        project: impl Into<ProjectId>,
        provider: Arc<dyn ContentProvider>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            name: name.into(),
            project: project.into(),
            provider,
            state: RwLock::new(DiagramState::default()),
            events,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    pub fn provider(&self) -> &Arc<dyn ContentProvider> {
        &self.provider
    }

    /// Listen for change notifications of `reflect`ed operations
    pub fn subscribe(&self) -> broadcast::Receiver<DiagramEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: DiagramEvent) {
        // no receivers is fine
        let _ = self.events.send(event);
    }

    // ========== Data sources ==========

    /// Register a connection the diagram may hold entities for
    pub fn register_data_source(&self, info: DataSourceInfo) {
        tracing::debug!(data_source = %info.id, "registering data source");
        self.state.write().known_sources.insert(info.id.clone(), info);
    }

    pub fn data_source_info(&self, id: &DataSourceId) -> Option<DataSourceInfo> {
        self.state.read().known_sources.get(id).cloned()
    }

    pub fn registered_data_sources(&self) -> Vec<DataSourceInfo> {
        self.state.read().known_sources.values().cloned().collect()
    }

    /// Data sources that currently hold entities, in first-use order
    pub fn data_sources(&self) -> Vec<DataSourceId> {
        self.state.read().data_sources.keys().cloned().collect()
    }

    /// Entities grouped by data source and container
    pub fn data_source_index(&self) -> Vec<DataSourceEntities> {
        self.state
            .read()
            .data_sources
            .iter()
            .map(|(data_source, containers)| DataSourceEntities {
                data_source: data_source.clone(),
                containers: containers
                    .iter()
                    .map(|(container, ids)| (container.clone(), ids.clone()))
                    .collect(),
            })
            .collect()
    }

    pub fn entities_in_container(&self, container: &ObjectRef) -> Vec<EntityId> {
        self.state
            .read()
            .data_sources
            .get(&container.data_source)
            .and_then(|bucket| bucket.get(container))
            .cloned()
            .unwrap_or_default()
    }

    // ========== Entities ==========

    /// Populate an entity through the content provider
    pub fn fill_entity(&self, entity: &mut ErdEntity) {
        let data_source = self.data_source_info(&entity.object().data_source);
        self.provider.fill_entity(entity, data_source.as_ref());
    }

    /// Insert an entity at `position` (or append) and resolve relations for
    /// every entity in the diagram.
    ///
    /// Entities without an underlying object or without a registered data
    /// source are rejected (`None`). Unless the content provider allows
    /// duplicates, adding a table that is already present returns the
    /// existing handle.
    pub fn add_entity(
        &self,
        mut entity: ErdEntity,
        position: Option<usize>,
        reflect: bool,
    ) -> Option<EntityId> {
        let object = entity.object().clone();
        if object.is_root() || object.data_source.is_empty() {
            tracing::warn!(entity = %entity.name(), "entity has no underlying object, not added");
            return None;
        }
        let Some(data_source) = self.data_source_info(&object.data_source) else {
            tracing::warn!(
                entity = %object,
                data_source = %object.data_source,
                "entity has no associated connection, not added"
            );
            return None;
        };
        if !entity.attributes_loaded() {
            self.provider.fill_entity(&mut entity, Some(&data_source));
        }

        let (id, created) = {
            let mut state = self.state.write();
            if !self.provider.allow_entity_duplicates()
                && let Some(existing) = state.entity_map.get(&object)
            {
                tracing::debug!(entity = %object, id = %existing, "entity already in diagram");
                return Some(*existing);
            }
            let id = EntityId(state.next_entity);
            state.next_entity += 1;

            entity.outgoing.clear();
            entity.incoming.clear();
            state.entity_map.entry(object.clone()).or_insert(id);
            let index = position.map_or(state.order.len(), |p| p.min(state.order.len()));
            state.order.insert(index, id);
            state.index_entity(id, &object);
            state.entities.insert(id, entity);

            let created = state.resolve_all();
            (id, created)
        };

        tracing::debug!(
            entity = %object,
            id = %id,
            new_associations = created.len(),
            "entity added"
        );
        if reflect {
            self.emit(DiagramEvent::EntityAdded(id));
            for association in created {
                self.emit(DiagramEvent::AssociationAdded(association));
            }
        }
        Some(id)
    }

    /// Remove an entity and every association touching it.
    ///
    /// Foreign keys of other entities that pointed at it go back to their
    /// unresolved queues. The returned entity has its keys reset so it can be
    /// added to a diagram again.
    pub fn remove_entity(&self, id: EntityId, reflect: bool) -> Option<ErdEntity> {
        let (mut entity, removed, created) = {
            let mut state = self.state.write();
            let entity = state.entities.remove(&id)?;
            state.order.retain(|e| *e != id);

            let object = entity.object().clone();
            if state.entity_map.get(&object) == Some(&id) {
                state.entity_map.remove(&object);
                let replacement = state.order.iter().copied().find(|other| {
                    state
                        .entities
                        .get(other)
                        .is_some_and(|e| e.object() == &object)
                });
                if let Some(replacement) = replacement {
                    state.entity_map.insert(object.clone(), replacement);
                }
            }
            state.unindex_entity(id, &object);

            let mut association_ids: Vec<AssociationId> = entity
                .outgoing
                .iter()
                .chain(entity.incoming.iter())
                .copied()
                .collect();
            association_ids.sort();
            association_ids.dedup();

            let mut removed = Vec::with_capacity(association_ids.len());
            for association_id in association_ids {
                let Some(association) = state.detach_association(association_id) else {
                    continue;
                };
                if association.target == id
                    && association.source != id
                    && let Some(key) = association.key
                    && let Some(source) = state.entities.get_mut(&association.source)
                {
                    source.unresolved_keys.push(key);
                }
                removed.push(association_id);
            }

            let created = state.resolve_all();
            (entity, removed, created)
        };

        entity.outgoing.clear();
        entity.incoming.clear();
        entity.unresolved_keys = entity.info().foreign_keys.clone();

        tracing::debug!(
            entity = %entity.object(),
            id = %id,
            removed_associations = removed.len(),
            "entity removed"
        );
        if reflect {
            for association in removed {
                self.emit(DiagramEvent::AssociationRemoved(association));
            }
            self.emit(DiagramEvent::EntityRemoved(id));
            for association in created {
                self.emit(DiagramEvent::AssociationAdded(association));
            }
        }
        Some(entity)
    }

    /// Apply an edit to an entity (alias, attributes, layout).
    ///
    /// `edit` runs while the diagram's write lock is held. It must not call
    /// back into this diagram: the lock is not reentrant and such a call
    /// deadlocks.
    pub fn update_entity<R>(
        &self,
        id: EntityId,
        reflect: bool,
        edit: impl FnOnce(&mut ErdEntity) -> R,
    ) -> Result<R, DiagramError> {
        let result = {
            let mut state = self.state.write();
            let entity = state
                .entities
                .get_mut(&id)
                .ok_or(DiagramError::UnknownEntity(id))?;
            edit(entity)
        };
        if reflect {
            self.emit(DiagramEvent::EntityChanged(id));
        }
        Ok(result)
    }

    pub fn entity(&self, id: EntityId) -> Option<ErdEntity> {
        self.state.read().entities.get(&id).cloned()
    }

    /// Entities in display order
    pub fn entities(&self) -> Vec<(EntityId, ErdEntity)> {
        let state = self.state.read();
        state
            .order
            .iter()
            .filter_map(|id| state.entities.get(id).map(|e| (*id, e.clone())))
            .collect()
    }

    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.state.read().order.clone()
    }

    pub fn entity_count(&self) -> usize {
        self.state.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().order.is_empty()
    }

    /// Entity representing a table. With duplicates allowed this is the
    /// earliest added entity still in the diagram.
    pub fn entity_by_object(&self, object: &ObjectRef) -> Option<EntityId> {
        self.state.read().entity_map.get(object).copied()
    }

    pub fn entity_map(&self) -> HashMap<ObjectRef, EntityId> {
        self.state.read().entity_map.clone()
    }

    pub fn contains_object(&self, object: &ObjectRef) -> bool {
        self.state.read().entity_map.contains_key(object)
    }

    /// Foreign keys of an entity still waiting for their target
    pub fn unresolved_keys(&self, id: EntityId) -> Vec<ForeignKeyInfo> {
        self.state
            .read()
            .entities
            .get(&id)
            .map(|e| e.unresolved_keys.clone())
            .unwrap_or_default()
    }

    // ========== Associations ==========

    /// Retry queued foreign keys of every entity. Idempotent.
    pub fn resolve_relations(&self, reflect: bool) -> Vec<AssociationId> {
        let created = self.state.write().resolve_all();
        if reflect {
            for association in &created {
                self.emit(DiagramEvent::AssociationAdded(*association));
            }
        }
        created
    }

    /// Retry queued foreign keys of a single entity
    pub fn add_model_relations(
        &self,
        id: EntityId,
        reflect: bool,
    ) -> Result<Vec<AssociationId>, DiagramError> {
        let created = {
            let mut state = self.state.write();
            if !state.entities.contains_key(&id) {
                return Err(DiagramError::UnknownEntity(id));
            }
            state.resolve_entity(id)
        };
        if reflect {
            for association in &created {
                self.emit(DiagramEvent::AssociationAdded(*association));
            }
        }
        Ok(created)
    }

    /// No queued key has its target in the diagram
    pub fn is_stable(&self) -> bool {
        !self.state.read().has_resolvable_keys()
    }

    /// Declare a relationship that does not exist in the database
    pub fn add_logical_association(
        &self,
        source: EntityId,
        target: EntityId,
        name: impl Into<String>,
        pairs: &[(&str, &str)],
        reflect: bool,
    ) -> Result<AssociationId, DiagramError> {
        let id = {
            let mut state = self.state.write();
            let source_entity = state
                .entities
                .get(&source)
                .ok_or(DiagramError::UnknownEntity(source))?;
            let target_entity = state
                .entities
                .get(&target)
                .ok_or(DiagramError::UnknownEntity(target))?;
            for (source_column, target_column) in pairs {
                if source_entity.info().column(source_column).is_none() {
                    return Err(DiagramError::UnknownAttribute {
                        entity: source_entity.name().to_string(),
                        attribute: source_column.to_string(),
                    });
                }
                if target_entity.info().column(target_column).is_none() {
                    return Err(DiagramError::UnknownAttribute {
                        entity: target_entity.name().to_string(),
                        attribute: target_column.to_string(),
                    });
                }
            }
            let association = ErdAssociation::new(
                name,
                ConstraintKind::Logical,
                source,
                target,
                pairs.iter().map(|(s, _)| s.to_string()).collect(),
                pairs.iter().map(|(_, t)| t.to_string()).collect(),
            )?;
            state.insert_association(association)
        };
        tracing::debug!(
            association = %id,
            source = %source,
            target = %target,
            "logical association added"
        );
        if reflect {
            self.emit(DiagramEvent::AssociationAdded(id));
        }
        Ok(id)
    }

    /// Remove an association from both endpoints. A removed foreign key
    /// association is not re-created by later resolution.
    pub fn remove_association(
        &self,
        id: AssociationId,
        reflect: bool,
    ) -> Result<ErdAssociation, DiagramError> {
        let association = self
            .state
            .write()
            .detach_association(id)
            .ok_or(DiagramError::UnknownAssociation(id))?;
        if reflect {
            self.emit(DiagramEvent::AssociationRemoved(id));
        }
        Ok(association)
    }

    pub fn association(&self, id: AssociationId) -> Option<ErdAssociation> {
        self.state.read().associations.get(&id).cloned()
    }

    /// All associations in creation order
    pub fn associations(&self) -> Vec<(AssociationId, ErdAssociation)> {
        self.state
            .read()
            .associations
            .iter()
            .map(|(id, a)| (*id, a.clone()))
            .collect()
    }

    pub fn association_count(&self) -> usize {
        self.state.read().associations.len()
    }

    /// Outgoing associations of an entity
    pub fn associations_of(&self, id: EntityId) -> Vec<AssociationId> {
        self.state
            .read()
            .entities
            .get(&id)
            .map(|e| e.outgoing.clone())
            .unwrap_or_default()
    }

    /// Incoming associations of an entity
    pub fn references_of(&self, id: EntityId) -> Vec<AssociationId> {
        self.state
            .read()
            .entities
            .get(&id)
            .map(|e| e.incoming.clone())
            .unwrap_or_default()
    }

    pub fn find_association(
        &self,
        source: EntityId,
        target: EntityId,
        name: &str,
    ) -> Option<AssociationId> {
        self.state.read().find_association(source, target, name)
    }

    /// Association with this name whose condition columns match exactly.
    /// Unnamed foreign keys between the same pair of tables differ only in
    /// their columns.
    pub fn find_association_by_columns(
        &self,
        source: EntityId,
        target: EntityId,
        name: &str,
        source_attributes: &[String],
        target_attributes: &[String],
    ) -> Option<AssociationId> {
        let state = self.state.read();
        let entity = state.entities.get(&source)?;
        entity.outgoing.iter().copied().find(|id| {
            state.associations.get(id).is_some_and(|a| {
                a.target == target
                    && a.name == name
                    && a.source_attributes() == source_attributes
                    && a.target_attributes() == target_attributes
            })
        })
    }

    pub fn set_association_bends(
        &self,
        id: AssociationId,
        bends: Vec<Point>,
    ) -> Result<(), DiagramError> {
        let mut state = self.state.write();
        let association = state
            .associations
            .get_mut(&id)
            .ok_or(DiagramError::UnknownAssociation(id))?;
        association.bends = bends;
        Ok(())
    }

    // ========== Notes ==========

    pub fn add_note(&self, note: ErdNote, reflect: bool) -> usize {
        let index = {
            let mut state = self.state.write();
            state.notes.push(note);
            state.notes.len() - 1
        };
        if reflect {
            self.emit(DiagramEvent::NotesChanged);
        }
        index
    }

    pub fn remove_note(&self, index: usize, reflect: bool) -> Option<ErdNote> {
        let note = {
            let mut state = self.state.write();
            (index < state.notes.len()).then(|| state.notes.remove(index))
        };
        if note.is_some() && reflect {
            self.emit(DiagramEvent::NotesChanged);
        }
        note
    }

    pub fn notes(&self) -> Vec<ErdNote> {
        self.state.read().notes.clone()
    }

    // ========== Error messages ==========

    pub fn add_error_message(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(diagram = %self.name, message = %message, "diagram error");
        self.state.write().error_messages.push(message);
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.state.read().error_messages.clone()
    }

    pub fn clear_error_messages(&self) {
        self.state.write().error_messages.clear();
    }
}
