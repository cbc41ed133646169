//! Content providers
//!
//! A content provider decides how an entity is populated when it enters a
//! diagram: which attributes it shows and whether the same table may appear
//! more than once.

use schemagram_core::DataSourceInfo;

use crate::{AttributeVisibility, DiagramSettings, ErdEntity};

pub trait ContentProvider: Send + Sync {
    /// Populate the attributes of a freshly created entity
    fn fill_entity(&self, entity: &mut ErdEntity, data_source: Option<&DataSourceInfo>);

    /// Whether one table may be represented by several (aliased) entities
    fn allow_entity_duplicates(&self) -> bool {
        false
    }
}

/// Provider driven by an attribute visibility policy
#[derive(Debug, Clone, Default)]
pub struct DefaultContentProvider {
    visibility: AttributeVisibility,
    allow_duplicates: bool,
}

impl DefaultContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &DiagramSettings) -> Self {
        Self {
            visibility: settings.attribute_visibility,
            allow_duplicates: settings.allow_entity_duplicates,
        }
    }

    pub fn with_visibility(mut self, visibility: AttributeVisibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_duplicates(mut self, allow: bool) -> Self {
        self.allow_duplicates = allow;
        self
    }

    pub fn visibility(&self) -> AttributeVisibility {
        self.visibility
    }
}

impl ContentProvider for DefaultContentProvider {
    fn fill_entity(&self, entity: &mut ErdEntity, data_source: Option<&DataSourceInfo>) {
        let filter = data_source
            .and_then(|ds| ds.attribute_filter.as_ref())
            .filter(|f| !f.is_empty())
            .map(|f| f.compile());
        let visibility = entity.visibility.unwrap_or(self.visibility);
        entity.fill_attributes(visibility, filter.as_ref());
    }

    fn allow_entity_duplicates(&self) -> bool {
        self.allow_duplicates
    }
}
