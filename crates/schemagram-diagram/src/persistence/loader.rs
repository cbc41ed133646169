//! Rebuilding diagrams from documents

use schemagram_core::{
    ConstraintKind, DataSourceId, DataSourceInfo, EntityInfo, ObjectRef, ProjectId,
    SchemaNavigator,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    AssociationRecord, ContentProvider, DiagramDocument, EntityId, EntityRecord, ErdAttribute,
    ErdDiagram, ErdEntity,
};

/// Diagram rebuilt from a document plus everything that did not resolve
#[derive(Debug)]
pub struct LoadedDiagram {
    pub diagram: ErdDiagram,
    pub warnings: Vec<String>,
}

struct Loader<'a> {
    navigator: &'a dyn SchemaNavigator,
    diagram: ErdDiagram,
    warnings: Vec<String>,
    /// `None` once a data source failed to connect
    data_sources: HashMap<DataSourceId, Option<DataSourceInfo>>,
    entity_ids: HashMap<u32, EntityId>,
}

/// Resolve a document against the live catalog.
///
/// Entities are looked up by fully-qualified name first and by navigator
/// node path second. Foreign-key associations come back from the catalog
/// as entities are added; the document only contributes their bend points.
/// Logical associations are recreated from the document.
pub async fn load_diagram(
    document: &DiagramDocument,
    navigator: &dyn SchemaNavigator,
    project: impl Into<ProjectId>,
    provider: Arc<dyn ContentProvider>,
) -> LoadedDiagram {
    let name = document.name.clone().unwrap_or_else(|| "diagram".to_string());
    let mut loader = Loader {
        navigator,
        diagram: ErdDiagram::with_provider(name, project, provider),
        warnings: Vec::new(),
        data_sources: HashMap::new(),
        entity_ids: HashMap::new(),
    };

    for record in &document.entities {
        loader.load_entity(record).await;
    }
    for record in &document.associations {
        loader.load_association(record);
    }
    for note in &document.notes {
        loader.diagram.add_note(note.clone(), false);
    }

    tracing::info!(
        diagram = %loader.diagram.name(),
        entities = loader.diagram.entity_count(),
        associations = loader.diagram.association_count(),
        warnings = loader.warnings.len(),
        "diagram loaded"
    );
    LoadedDiagram {
        diagram: loader.diagram,
        warnings: loader.warnings,
    }
}

impl Loader<'_> {
    fn warn(&mut self, message: String) {
        tracing::warn!(message = %message, "diagram load");
        self.warnings.push(message);
    }

    async fn data_source(&mut self, id: &DataSourceId) -> Option<DataSourceInfo> {
        if let Some(known) = self.data_sources.get(id) {
            return known.clone();
        }
        let resolved = match self.connect(id).await {
            Ok(info) => {
                self.diagram.register_data_source(info.clone());
                Some(info)
            }
            Err(err) => {
                self.warn(format!("Can't connect to data source '{}': {}", id, err));
                None
            }
        };
        self.data_sources.insert(id.clone(), resolved.clone());
        resolved
    }

    async fn connect(&self, id: &DataSourceId) -> schemagram_core::Result<DataSourceInfo> {
        let info = self.navigator.data_source(id).await?;
        self.navigator.connect(id).await?;
        Ok(info)
    }

    async fn resolve_entity(&mut self, record: &EntityRecord) -> Option<EntityInfo> {
        let node_path = record.node_uri.as_deref().or(record.node_id.as_deref());
        let node_object = node_path.and_then(ObjectRef::parse_node_path);
        let data_source = record
            .data_source
            .clone()
            .map(DataSourceId::from)
            .or_else(|| node_object.as_ref().map(|o| o.data_source.clone()))?;
        let info = self.data_source(&data_source).await?;

        if let Some(fqn) = &record.fqn {
            match info.rules.parse_qualified_name(fqn) {
                Some(name) => match self.navigator.find_entity(&data_source, &name).await {
                    Ok(Some(entity)) => return Some(entity),
                    Ok(None) => {}
                    Err(err) => {
                        tracing::debug!(fqn = %fqn, error = %err, "lookup by name failed");
                    }
                },
                None => tracing::debug!(fqn = %fqn, "unparseable qualified name"),
            }
        }

        let object = node_object?;
        match self.navigator.entity(&object).await {
            Ok(found) => found,
            Err(err) => {
                tracing::debug!(object = %object, error = %err, "lookup by node path failed");
                None
            }
        }
    }

    async fn load_entity(&mut self, record: &EntityRecord) {
        let Some(info) = self.resolve_entity(record).await else {
            self.warn(format!("Entity '{}' not found in catalog", record.name));
            return;
        };

        let mut entity = ErdEntity::new(info)
            .with_alias(record.alias.clone())
            .with_primary(record.primary);
        entity.visibility = record.visibility;
        entity.description = record.description.clone();
        entity.bounds = record.bounds;

        let mut attributes: Vec<_> = record.attributes.iter().collect();
        attributes.sort_by_key(|a| a.order);
        for saved in attributes {
            let Some(column) = entity.info().column(&saved.name).cloned() else {
                self.warn(format!(
                    "Attribute '{}' not found in entity '{}'",
                    saved.name, record.name
                ));
                continue;
            };
            let mut attribute =
                ErdAttribute::from_column(&column, saved.in_primary_key, saved.in_foreign_key);
            attribute.alias = saved.alias.clone();
            attribute.checked = saved.checked;
            attribute.order = saved.order;
            if let Err(err) = entity.add_attribute(attribute) {
                self.warn(err.to_string());
            }
        }

        match self.diagram.add_entity(entity, None, false) {
            Some(id) => {
                self.entity_ids.insert(record.id, id);
            }
            None => self.warn(format!("Entity '{}' could not be added", record.name)),
        }
    }

    fn load_association(&mut self, record: &AssociationRecord) {
        let (Some(source), Some(target)) = (
            self.entity_ids.get(&record.foreign_entity).copied(),
            self.entity_ids.get(&record.primary_entity).copied(),
        ) else {
            self.warn(format!(
                "Association '{}' references a missing entity",
                record.name
            ));
            return;
        };

        let id = match ConstraintKind::parse(&record.kind) {
            Some(ConstraintKind::Logical) => {
                let pairs: Vec<(&str, &str)> = record
                    .foreign_attributes
                    .iter()
                    .zip(record.primary_attributes.iter())
                    .map(|(s, t)| (s.as_str(), t.as_str()))
                    .collect();
                match self
                    .diagram
                    .add_logical_association(source, target, record.name.clone(), &pairs, false)
                {
                    Ok(id) => id,
                    Err(err) => {
                        self.warn(format!(
                            "Logical association '{}' skipped: {}",
                            record.name, err
                        ));
                        return;
                    }
                }
            }
            Some(ConstraintKind::ForeignKey) => {
                match self.diagram.find_association_by_columns(
                    source,
                    target,
                    &record.name,
                    &record.foreign_attributes,
                    &record.primary_attributes,
                ) {
                    Some(id) => id,
                    None => {
                        self.warn(format!(
                            "Foreign key '{}' no longer exists in catalog",
                            record.name
                        ));
                        return;
                    }
                }
            }
            None => {
                self.warn(format!(
                    "Association '{}' has unknown type '{}'",
                    record.name, record.kind
                ));
                return;
            }
        };

        if !record.bends.is_empty()
            && let Err(err) = self.diagram.set_association_bends(id, record.bends.clone())
        {
            self.warn(err.to_string());
        }
    }
}
