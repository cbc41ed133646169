//! Diagram preferences

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::AttributeVisibility;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramSettings {
    pub attribute_visibility: AttributeVisibility,
    pub show_views: bool,
    pub show_partitions: bool,
    pub show_hidden: bool,
    pub show_system: bool,
    pub allow_entity_duplicates: bool,
    /// Add tables referenced by collected tables
    pub include_related: bool,
    /// Write icons, data kinds, defaults and descriptions into saved diagrams
    pub persist_full_info: bool,
}

impl Default for DiagramSettings {
    fn default() -> Self {
        Self {
            attribute_visibility: AttributeVisibility::All,
            show_views: true,
            show_partitions: false,
            show_hidden: false,
            show_system: false,
            allow_entity_duplicates: false,
            include_related: false,
            persist_full_info: false,
        }
    }
}

impl DiagramSettings {
    /// Load from the user config directory, defaults if nothing was saved
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::settings_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read diagram settings from {:?}", path))?;
        serde_json::from_str(&content).with_context(|| "Failed to parse diagram settings JSON")
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create settings directory: {:?}", parent))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write diagram settings to {:?}", path))?;
        tracing::debug!(path = ?path, "saved diagram settings");
        Ok(())
    }

    pub fn settings_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not find config directory")?;
        Ok(config_dir.join("schemagram").join("diagram.json"))
    }
}
