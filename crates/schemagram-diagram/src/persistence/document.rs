//! Diagram document structure

use schemagram_core::DataKind;
use serde::{Deserialize, Serialize};
use std::io::Read;
use thiserror::Error;

use crate::{AttributeVisibility, Bounds, ErdDiagram, ErdNote, PersistContext, Point};

/// Error returned when a document can't be read
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Written by a newer release that this reader does not understand
    #[error(
        "diagram document version {version} is newer than the supported version {supported}"
    )]
    TooNew { version: u32, supported: u32 },

    #[error("diagram document is missing the required 'version' field")]
    MissingVersion,

    #[error("failed to parse diagram document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read diagram document: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Deserialize)]
struct VersionProbe {
    version: Option<u32>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Saved diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramDocument {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
    #[serde(default)]
    pub associations: Vec<AssociationRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<ErdNote>,
    /// Present when written with full info
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DocumentData>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentData {
    #[serde(default)]
    pub icons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Fully-qualified name quoted with the data source's rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqn: Option<String>,
    #[serde(rename = "dataSource", default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
    #[serde(rename = "nodeId", default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(rename = "nodeUri", default, skip_serializing_if = "Option::is_none")]
    pub node_uri: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub primary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<AttributeVisibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    #[serde(rename = "iconIndex", default, skip_serializing_if = "Option::is_none")]
    pub icon_index: Option<usize>,
    #[serde(default)]
    pub attributes: Vec<AttributeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub checked: bool,
    #[serde(rename = "inPrimaryKey", default, skip_serializing_if = "is_false")]
    pub in_primary_key: bool,
    #[serde(rename = "inForeignKey", default, skip_serializing_if = "is_false")]
    pub in_foreign_key: bool,
    #[serde(default)]
    pub order: usize,
    #[serde(rename = "iconIndex", default, skip_serializing_if = "Option::is_none")]
    pub icon_index: Option<usize>,
    #[serde(rename = "dataKind", default, skip_serializing_if = "Option::is_none")]
    pub data_kind: Option<DataKind>,
    #[serde(rename = "defaultValue", default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Association between two entity records.
///
/// The primary entity holds the referenced key, the foreign entity holds the
/// foreign key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationRecord {
    pub id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "primary-entity")]
    pub primary_entity: u32,
    #[serde(rename = "foreign-entity")]
    pub foreign_entity: u32,
    #[serde(rename = "primary-attributes", default)]
    pub primary_attributes: Vec<String>,
    #[serde(rename = "foreign-attributes", default)]
    pub foreign_attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bends: Vec<Point>,
}

impl DiagramDocument {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            name: None,
            entities: Vec::new(),
            associations: Vec::new(),
            notes: Vec::new(),
            data: None,
        }
    }

    /// Capture a diagram. `full_info` adds icons, data kinds, default values
    /// and descriptions.
    pub fn from_diagram(diagram: &ErdDiagram, full_info: bool) -> Self {
        let mut context = PersistContext::new();
        let mut document = Self::new();
        document.name = Some(diagram.name().to_string());

        for (id, entity) in diagram.entities() {
            let record_id = context.entity_id(id);
            let object = entity.object();
            let rules = diagram
                .data_source_info(&object.data_source)
                .map(|ds| ds.rules)
                .unwrap_or_default();

            let attributes = entity
                .attributes()
                .iter()
                .map(|attribute| {
                    let mut record = AttributeRecord {
                        name: attribute.name.clone(),
                        alias: attribute.alias.clone(),
                        checked: attribute.checked,
                        in_primary_key: attribute.is_primary_key,
                        in_foreign_key: attribute.is_foreign_key,
                        order: attribute.order,
                        icon_index: None,
                        data_kind: None,
                        default_value: None,
                        description: None,
                    };
                    if full_info {
                        record.icon_index =
                            attribute.icon.as_deref().map(|i| context.intern_icon(i));
                        record.data_kind = Some(attribute.data_kind);
                        record.default_value = attribute.default_value.clone();
                        record.description = attribute.comment.clone();
                    }
                    record
                })
                .collect();

            let info = entity.info();
            document.entities.push(EntityRecord {
                id: record_id,
                name: info.name().to_string(),
                alias: entity.alias.clone(),
                fqn: Some(rules.qualified_name(&object.path)),
                data_source: Some(object.data_source.to_string()),
                node_id: Some(object.node_id()),
                node_uri: Some(object.node_uri()),
                primary: entity.primary,
                visibility: entity.visibility,
                description: if full_info {
                    entity.description.clone().or_else(|| info.comment.clone())
                } else {
                    entity.description.clone()
                },
                bounds: entity.bounds,
                icon_index: if full_info {
                    info.icon.as_deref().map(|i| context.intern_icon(i))
                } else {
                    None
                },
                attributes,
            });
        }

        for (id, association) in diagram.associations() {
            let (Some(foreign), Some(primary)) = (
                context.lookup_entity(association.source()),
                context.lookup_entity(association.target()),
            ) else {
                tracing::warn!(
                    association = %association.name,
                    "association endpoint missing, not saved"
                );
                continue;
            };
            document.associations.push(AssociationRecord {
                id: context.association_id(id),
                name: association.name.clone(),
                kind: association.kind.as_str().to_string(),
                primary_entity: primary,
                foreign_entity: foreign,
                primary_attributes: association.target_attributes().to_vec(),
                foreign_attributes: association.source_attributes().to_vec(),
                bends: association.bends.clone(),
            });
        }

        document.notes = diagram.notes();
        if full_info {
            document.data = Some(DocumentData {
                icons: context.into_icons(),
            });
        }

        tracing::debug!(
            diagram = %diagram.name(),
            entities = document.entities.len(),
            associations = document.associations.len(),
            full_info,
            "diagram document created"
        );
        document
    }

    /// Icon name for an index written by `from_diagram`
    pub fn icon(&self, index: usize) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|data| data.icons.get(index))
            .map(String::as_str)
    }

    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a document, rejecting versions newer than `CURRENT_VERSION`
    pub fn from_slice(data: &[u8]) -> Result<Self, DocumentError> {
        let probe: VersionProbe = serde_json::from_slice(data)?;
        let version = probe.version.ok_or(DocumentError::MissingVersion)?;
        if version > Self::CURRENT_VERSION {
            return Err(DocumentError::TooNew {
                version,
                supported: Self::CURRENT_VERSION,
            });
        }
        Ok(serde_json::from_slice(data)?)
    }

    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Self::from_slice(json.as_bytes())
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, DocumentError> {
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;
        Self::from_slice(&raw)
    }
}

impl Default for DiagramDocument {
    fn default() -> Self {
        Self::new()
    }
}
