//! Entity attributes

use schemagram_core::{ColumnInfo, DataKind};
use serde::{Deserialize, Serialize};

/// Which attributes an entity shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeVisibility {
    #[default]
    All,
    /// Identifying key columns only
    Primary,
    /// Identifying, referential and constraint key columns
    Keys,
    None,
}

impl AttributeVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeVisibility::All => "all",
            AttributeVisibility::Primary => "primary",
            AttributeVisibility::Keys => "keys",
            AttributeVisibility::None => "none",
        }
    }
}

impl std::str::FromStr for AttributeVisibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(AttributeVisibility::All),
            "primary" => Ok(AttributeVisibility::Primary),
            "keys" => Ok(AttributeVisibility::Keys),
            "none" => Ok(AttributeVisibility::None),
            other => Err(format!("unknown attribute visibility '{}'", other)),
        }
    }
}

/// Diagram wrapper around one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErdAttribute {
    pub name: String,
    pub data_type: String,
    pub data_kind: DataKind,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub comment: Option<String>,
    pub icon: Option<String>,
    pub alias: Option<String>,
    pub checked: bool,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
    /// Display position within the entity
    pub order: usize,
}

impl ErdAttribute {
    pub fn from_column(column: &ColumnInfo, in_primary_key: bool, in_foreign_key: bool) -> Self {
        Self {
            name: column.name.clone(),
            data_type: column.data_type.clone(),
            data_kind: column.data_kind(),
            nullable: column.nullable,
            default_value: column.default_value.clone(),
            comment: column.comment.clone(),
            icon: column.icon.clone(),
            alias: None,
            checked: false,
            is_primary_key: in_primary_key,
            is_foreign_key: in_foreign_key,
            order: column.ordinal,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn is_key(&self) -> bool {
        self.is_primary_key || self.is_foreign_key
    }
}
