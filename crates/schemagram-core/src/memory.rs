//! In-memory catalog
//!
//! `MemoryCatalog` implements `SchemaNavigator` over a fixed set of nodes. It
//! backs the CLI (loaded from a JSON snapshot) and the test suites, and can
//! simulate unreachable data sources and failing structure reads.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::{
    AliasInfo, CatalogNode, ContainerInfo, ContainerKind, DataSourceId, DataSourceInfo,
    EntityInfo, ObjectRef, QualifiedName, Result, SchemaNavigator, SchemagramError,
};

/// Serializable catalog contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSnapshot {
    pub data_sources: Vec<DataSourceInfo>,
    pub nodes: Vec<CatalogNode>,
}

#[derive(Debug, Default)]
struct CatalogState {
    data_sources: Vec<DataSourceInfo>,
    nodes: HashMap<ObjectRef, CatalogNode>,
    /// Children per parent, in insertion order
    children: HashMap<ObjectRef, Vec<ObjectRef>>,
    connected: HashSet<DataSourceId>,
    failing_connections: HashMap<DataSourceId, String>,
    failing_containers: HashMap<ObjectRef, String>,
    connect_attempts: usize,
}

impl CatalogState {
    fn insert(&mut self, node: CatalogNode) {
        let object = node.object().clone();
        if let Some(parent) = object.parent() {
            let siblings = self.children.entry(parent).or_default();
            if !siblings.contains(&object) {
                siblings.push(object.clone());
            }
        }
        self.nodes.insert(object, node);
    }

    fn check_reachable(&self, data_source: &DataSourceId) -> Result<()> {
        match self.failing_connections.get(data_source) {
            Some(message) => Err(SchemagramError::Connection(message.clone())),
            None => Ok(()),
        }
    }
}

/// Catalog held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: RwLock<CatalogState>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a snapshot
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        let catalog = Self::new();
        for data_source in snapshot.data_sources {
            catalog.add_data_source(data_source);
        }
        for node in snapshot.nodes {
            catalog.state.write().insert(node);
        }
        catalog
    }

    /// Parse a JSON snapshot
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: CatalogSnapshot = serde_json::from_str(json)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Export the current contents
    pub fn snapshot(&self) -> CatalogSnapshot {
        let state = self.state.read();
        let mut nodes: Vec<CatalogNode> = state
            .nodes
            .values()
            .filter(|n| !n.object().is_root())
            .cloned()
            .collect();
        nodes.sort_by(|a, b| a.object().cmp(b.object()));
        CatalogSnapshot {
            data_sources: state.data_sources.clone(),
            nodes,
        }
    }

    /// Register a data source together with its root container node
    pub fn add_data_source(&self, info: DataSourceInfo) -> &Self {
        let mut state = self.state.write();
        let root = ObjectRef::root(info.id.clone());
        state.insert(CatalogNode::Container(ContainerInfo::new(
            root,
            ContainerKind::DataSource,
        )));
        state.data_sources.retain(|ds| ds.id != info.id);
        state.data_sources.push(info);
        self
    }

    pub fn add_container(&self, container: ContainerInfo) -> &Self {
        self.state.write().insert(CatalogNode::Container(container));
        self
    }

    pub fn add_entity(&self, entity: EntityInfo) -> &Self {
        self.state.write().insert(CatalogNode::Entity(entity));
        self
    }

    pub fn add_alias(&self, alias: AliasInfo) -> &Self {
        self.state.write().insert(CatalogNode::Alias(alias));
        self
    }

    /// Remove a node (and its subtree) from the catalog
    pub fn remove(&self, object: &ObjectRef) {
        let mut state = self.state.write();
        let mut pending = vec![object.clone()];
        while let Some(current) = pending.pop() {
            state.nodes.remove(&current);
            if let Some(children) = state.children.remove(&current) {
                pending.extend(children);
            }
        }
        if let Some(parent) = object.parent()
            && let Some(siblings) = state.children.get_mut(&parent)
        {
            siblings.retain(|c| c != object);
        }
    }

    /// Make every call touching `data_source` fail with a connection error
    pub fn fail_connection(
        &self,
        data_source: impl Into<DataSourceId>,
        message: impl Into<String>,
    ) {
        self.state
            .write()
            .failing_connections
            .insert(data_source.into(), message.into());
    }

    /// Make `cache_structure` fail for a container
    pub fn fail_cache(&self, container: ObjectRef, message: impl Into<String>) {
        self.state
            .write()
            .failing_containers
            .insert(container, message.into());
    }

    pub fn is_connected(&self, data_source: &DataSourceId) -> bool {
        self.state.read().connected.contains(data_source)
    }

    pub fn connect_attempts(&self) -> usize {
        self.state.read().connect_attempts
    }
}

#[async_trait]
impl SchemaNavigator for MemoryCatalog {
    async fn data_source(&self, id: &DataSourceId) -> Result<DataSourceInfo> {
        self.state
            .read()
            .data_sources
            .iter()
            .find(|ds| &ds.id == id)
            .cloned()
            .ok_or_else(|| SchemagramError::NotFound(format!("data source '{}'", id)))
    }

    async fn connect(&self, id: &DataSourceId) -> Result<()> {
        let mut state = self.state.write();
        state.connect_attempts += 1;
        if !state.data_sources.iter().any(|ds| &ds.id == id) {
            return Err(SchemagramError::NotFound(format!("data source '{}'", id)));
        }
        state.check_reachable(id)?;
        if state.connected.insert(id.clone()) {
            tracing::debug!(data_source = %id, "connected");
        }
        Ok(())
    }

    async fn cache_structure(&self, container: &ObjectRef) -> Result<()> {
        let state = self.state.read();
        state.check_reachable(&container.data_source)?;
        match state.failing_containers.get(container) {
            Some(message) => Err(SchemagramError::Catalog(message.clone())),
            None => Ok(()),
        }
    }

    async fn children(&self, parent: &ObjectRef) -> Result<Vec<CatalogNode>> {
        let state = self.state.read();
        state.check_reachable(&parent.data_source)?;
        Ok(state
            .children
            .get(parent)
            .map(|children| {
                children
                    .iter()
                    .filter_map(|c| state.nodes.get(c).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn node(&self, object: &ObjectRef) -> Result<Option<CatalogNode>> {
        let state = self.state.read();
        state.check_reachable(&object.data_source)?;
        Ok(state.nodes.get(object).cloned())
    }

    async fn find_entity(
        &self,
        data_source: &DataSourceId,
        name: &QualifiedName,
    ) -> Result<Option<EntityInfo>> {
        let object = ObjectRef::new(data_source.clone(), name.path());
        Ok(match self.node(&object).await? {
            Some(CatalogNode::Entity(info)) => Some(info),
            _ => None,
        })
    }
}
