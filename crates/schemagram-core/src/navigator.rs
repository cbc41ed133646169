//! Catalog navigation interface

use async_trait::async_trait;

use crate::{
    CatalogNode, DataSourceId, DataSourceInfo, EntityInfo, ObjectRef, ProjectId, QualifiedName,
    Result,
};

/// Read access to database catalogs.
///
/// Implementations wrap live connections (or an in-memory snapshot) and are
/// shared between the object collector and the persistence codec.
#[async_trait]
pub trait SchemaNavigator: Send + Sync {
    /// Look up a configured data source
    async fn data_source(&self, id: &DataSourceId) -> Result<DataSourceInfo>;

    /// Make sure the data source is connected
    async fn connect(&self, id: &DataSourceId) -> Result<()>;

    /// Prefetch the structure (tables, columns, keys) below a container.
    /// The default does nothing.
    async fn cache_structure(&self, _container: &ObjectRef) -> Result<()> {
        Ok(())
    }

    /// List the direct children of a container
    async fn children(&self, parent: &ObjectRef) -> Result<Vec<CatalogNode>>;

    /// Look up a single node
    async fn node(&self, object: &ObjectRef) -> Result<Option<CatalogNode>>;

    /// Find a table or view by its catalog/schema/name parts
    async fn find_entity(
        &self,
        data_source: &DataSourceId,
        name: &QualifiedName,
    ) -> Result<Option<EntityInfo>>;

    /// Look up an entity by reference
    async fn entity(&self, object: &ObjectRef) -> Result<Option<EntityInfo>> {
        Ok(match self.node(object).await? {
            Some(CatalogNode::Entity(info)) => Some(info),
            _ => None,
        })
    }

    /// Project that owns the object's data source
    async fn project_of(&self, object: &ObjectRef) -> Result<ProjectId> {
        Ok(self.data_source(&object.data_source).await?.project)
    }
}
