//! Diagram object collector
//!
//! Walks catalog containers below a set of roots and gathers the tables and
//! views a new diagram should show. Catalog failures are recorded as error
//! messages instead of aborting, and a cancelled monitor ends the walk with
//! whatever was collected so far.

use indexmap::{IndexMap, IndexSet};
use schemagram_core::{
    CatalogNode, CompiledNameFilter, DataSourceId, EntityInfo, ObjectRef, ProgressMonitor,
    SchemaNavigator,
};
use std::collections::HashSet;
use std::sync::Arc;

use crate::{DiagramSettings, EntityId, ErdDiagram, ErdEntity};

/// Which catalog objects the collector accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorSettings {
    pub show_views: bool,
    /// Include views even when `show_views` is off
    pub force_show_views: bool,
    pub show_partitions: bool,
    pub show_hidden: bool,
    pub show_system: bool,
    /// Also add tables referenced by foreign keys of collected tables
    pub include_related: bool,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            show_views: true,
            force_show_views: false,
            show_partitions: false,
            show_hidden: false,
            show_system: false,
            include_related: false,
        }
    }
}

impl CollectorSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &DiagramSettings) -> Self {
        Self {
            show_views: settings.show_views,
            force_show_views: false,
            show_partitions: settings.show_partitions,
            show_hidden: settings.show_hidden,
            show_system: settings.show_system,
            include_related: settings.include_related,
        }
    }

    pub fn with_views(mut self, show: bool) -> Self {
        self.show_views = show;
        self
    }

    pub fn with_force_show_views(mut self, force: bool) -> Self {
        self.force_show_views = force;
        self
    }

    pub fn with_partitions(mut self, show: bool) -> Self {
        self.show_partitions = show;
        self
    }

    pub fn with_hidden(mut self, show: bool) -> Self {
        self.show_hidden = show;
        self
    }

    pub fn with_system(mut self, show: bool) -> Self {
        self.show_system = show;
        self
    }

    pub fn with_related(mut self, include: bool) -> Self {
        self.include_related = include;
        self
    }

    /// Whether an entity passes the inclusion rules
    pub fn accepts(&self, info: &EntityInfo) -> bool {
        if info.is_partition && !self.show_partitions {
            return false;
        }
        if info.is_view() && !(self.show_views || self.force_show_views) {
            return false;
        }
        if info.is_hidden && !self.show_hidden {
            return false;
        }
        if info.is_system && !self.show_system {
            return false;
        }
        true
    }
}

/// Gathers diagram entities from catalog roots
pub struct DiagramObjectCollector {
    navigator: Arc<dyn SchemaNavigator>,
    settings: CollectorSettings,
    error_messages: Vec<String>,
}

impl DiagramObjectCollector {
    pub fn new(navigator: Arc<dyn SchemaNavigator>, settings: CollectorSettings) -> Self {
        Self {
            navigator,
            settings,
            error_messages: Vec::new(),
        }
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    /// Problems recorded by every call so far
    pub fn error_messages(&self) -> &[String] {
        &self.error_messages
    }

    fn record_error(&mut self, message: String) {
        tracing::warn!(message = %message, "collector error");
        self.error_messages.push(message);
    }

    /// Distinct tables and views below `roots`, in discovery order
    pub async fn collect_tables(
        &mut self,
        monitor: &dyn ProgressMonitor,
        roots: &[ObjectRef],
    ) -> IndexSet<ObjectRef> {
        self.collect_entities(monitor, roots)
            .await
            .into_keys()
            .collect()
    }

    /// Like `collect_tables`, keeping the catalog snapshot of each entity
    pub async fn collect_entities(
        &mut self,
        monitor: &dyn ProgressMonitor,
        roots: &[ObjectRef],
    ) -> IndexMap<ObjectRef, EntityInfo> {
        let mut collected = IndexMap::new();
        for root in roots {
            if monitor.is_cancelled() {
                tracing::debug!(collected = collected.len(), "collection cancelled");
                break;
            }
            let node = match self.navigator.node(root).await {
                Ok(Some(node)) => node,
                Ok(None) => {
                    tracing::warn!(object = %root, "root object not found in catalog");
                    continue;
                }
                Err(err) => {
                    self.record_error(format!("Can't read '{}': {}", root, err));
                    continue;
                }
            };
            self.collect_below(monitor, node, &mut collected).await;
        }
        collected
    }

    /// Depth-first walk from one root. Children are pushed in reverse so they
    /// come off the stack in catalog order.
    async fn collect_below(
        &mut self,
        monitor: &dyn ProgressMonitor,
        root: CatalogNode,
        collected: &mut IndexMap<ObjectRef, EntityInfo>,
    ) {
        let mut visited: HashSet<ObjectRef> = HashSet::new();
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            if monitor.is_cancelled() {
                return;
            }
            match node {
                CatalogNode::Entity(info) => {
                    if !self.settings.accepts(&info) {
                        tracing::trace!(entity = %info.object, "entity skipped by settings");
                        continue;
                    }
                    if !collected.contains_key(&info.object) {
                        collected.insert(info.object.clone(), info);
                    }
                }
                CatalogNode::Alias(alias) => {
                    if !visited.insert(alias.object.clone()) {
                        tracing::warn!(
                            alias = %alias.object,
                            "alias cycle detected, branch skipped"
                        );
                        continue;
                    }
                    match self.navigator.node(&alias.target).await {
                        Ok(Some(target)) => stack.push(target),
                        Ok(None) => {
                            tracing::warn!(
                                alias = %alias.object,
                                target = %alias.target,
                                "alias target not found"
                            );
                        }
                        Err(err) => {
                            self.record_error(format!(
                                "Can't resolve alias '{}': {}",
                                alias.object, err
                            ));
                        }
                    }
                }
                CatalogNode::Container(container) => {
                    if !visited.insert(container.object.clone()) {
                        tracing::warn!(
                            container = %container.object,
                            "container visited twice, branch skipped"
                        );
                        continue;
                    }
                    monitor.subtask(&container.object.to_string());
                    let children = match self.navigator.children(&container.object).await {
                        Ok(children) => children,
                        Err(err) => {
                            self.record_error(format!(
                                "Can't read children of '{}': {}",
                                container.object, err
                            ));
                            continue;
                        }
                    };
                    let filter: Option<CompiledNameFilter> = container
                        .name_filter
                        .as_ref()
                        .filter(|f| !f.is_empty())
                        .map(|f| f.compile());
                    stack.extend(
                        children
                            .into_iter()
                            .filter(|child| {
                                filter
                                    .as_ref()
                                    .is_none_or(|f| f.matches(child.object().name()))
                            })
                            .rev(),
                    );
                }
            }
        }
    }

    /// Build the entities a new diagram should hold for `roots`.
    ///
    /// Roots from another project are rejected, each data source is
    /// connected once and registered with the diagram, and a root whose
    /// structure can't be cached is skipped while the remaining roots are
    /// still collected. Problems found here are also copied to the diagram's
    /// error messages.
    pub async fn generate_entity_list(
        &mut self,
        monitor: &dyn ProgressMonitor,
        diagram: &ErdDiagram,
        roots: &[ObjectRef],
    ) -> Vec<ErdEntity> {
        let first_message = self.error_messages.len();
        monitor.begin_task("Collect diagram objects", roots.len() as u64);

        let mut connected: HashSet<DataSourceId> = HashSet::new();
        let mut unreachable: HashSet<DataSourceId> = HashSet::new();
        let mut accepted = Vec::with_capacity(roots.len());

        for root in roots {
            if monitor.is_cancelled() {
                break;
            }
            monitor.worked(1);

            match self.navigator.project_of(root).await {
                Ok(project) if &project != diagram.project() => {
                    self.record_error(format!(
                        "Object '{}' belongs to project '{}' and can't be added to a diagram of project '{}'",
                        root,
                        project,
                        diagram.project()
                    ));
                    continue;
                }
                Ok(_) => {}
                Err(err) => {
                    self.record_error(format!("Can't determine project of '{}': {}", root, err));
                    continue;
                }
            }

            let data_source = &root.data_source;
            if unreachable.contains(data_source) {
                continue;
            }
            if !connected.contains(data_source) {
                if let Err(err) = self.connect(diagram, data_source).await {
                    self.record_error(format!("Can't connect to '{}': {}", data_source, err));
                    unreachable.insert(data_source.clone());
                    continue;
                }
                connected.insert(data_source.clone());
            }

            if let Err(err) = self.navigator.cache_structure(root).await {
                self.record_error(format!("Can't cache structure of '{}': {}", root, err));
                continue;
            }
            accepted.push(root.clone());
        }

        let mut collected = self.collect_entities(monitor, &accepted).await;
        if self.settings.include_related && !monitor.is_cancelled() {
            self.add_related(&mut collected, &connected).await;
        }

        let root_set: HashSet<&ObjectRef> = roots.iter().collect();
        let entities: Vec<ErdEntity> = collected
            .into_values()
            .map(|info| {
                let primary = root_set.contains(&info.object);
                let mut entity = ErdEntity::new(info).with_primary(primary);
                diagram.fill_entity(&mut entity);
                entity
            })
            .collect();

        for message in &self.error_messages[first_message..] {
            diagram.add_error_message(message.clone());
        }
        monitor.done();
        tracing::info!(
            roots = roots.len(),
            entities = entities.len(),
            errors = self.error_messages.len() - first_message,
            "collected diagram objects"
        );
        entities
    }

    async fn connect(
        &self,
        diagram: &ErdDiagram,
        data_source: &DataSourceId,
    ) -> schemagram_core::Result<()> {
        self.navigator.connect(data_source).await?;
        let info = self.navigator.data_source(data_source).await?;
        diagram.register_data_source(info);
        Ok(())
    }

    /// Targets of foreign keys of collected entities, one level deep
    async fn add_related(
        &mut self,
        collected: &mut IndexMap<ObjectRef, EntityInfo>,
        connected: &HashSet<DataSourceId>,
    ) {
        let targets: IndexSet<ObjectRef> = collected
            .values()
            .flat_map(|info| info.foreign_keys.iter().map(|fk| fk.referenced.clone()))
            .filter(|target| {
                !collected.contains_key(target) && connected.contains(&target.data_source)
            })
            .collect();

        for target in targets {
            match self.navigator.entity(&target).await {
                Ok(Some(info)) if self.settings.accepts(&info) => {
                    tracing::debug!(entity = %target, "adding referenced table");
                    collected.insert(target, info);
                }
                Ok(_) => {}
                Err(err) => {
                    self.record_error(format!("Can't read '{}': {}", target, err));
                }
            }
        }
    }

    /// Generate the entity list and add it to the diagram
    pub async fn populate(
        &mut self,
        monitor: &dyn ProgressMonitor,
        diagram: &ErdDiagram,
        roots: &[ObjectRef],
        reflect: bool,
    ) -> Vec<EntityId> {
        let entities = self.generate_entity_list(monitor, diagram, roots).await;
        entities
            .into_iter()
            .filter_map(|entity| diagram.add_entity(entity, None, reflect))
            .collect()
    }
}

#[cfg(test)]
mod tests;
