//! # Funnel Document
//!
//! The root aggregate: metadata, global settings, and the ordered list of
//! sections that make up the page.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::block::Block;
use crate::error::ModelResult;
use crate::id_generator::IdGenerator;
use crate::layout::Section;
use crate::legacy::{self, LegacyContent};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunnelStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FunnelSettings {
    pub background_color: String,
    pub max_width: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for FunnelSettings {
    fn default() -> Self {
        Self {
            background_color: "#ffffff".to_string(),
            max_width: "1200px".to_string(),
            font_family: None,
            extra: Map::new(),
        }
    }
}

impl FunnelSettings {
    /// Parse a persisted settings blob, falling back to defaults
    pub fn parse_lenient(source: &str) -> Self {
        match serde_json::from_str(source) {
            Ok(settings) => settings,
            Err(e) => {
                if !source.trim().is_empty() {
                    warn!(error = %e, "Unreadable funnel settings, using defaults");
                }
                FunnelSettings::default()
            }
        }
    }
}

/// Persisted content payload: `{ "sections": [...] }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunnelContent {
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl FunnelContent {
    /// Parse canonical content strictly
    pub fn parse(source: &str) -> ModelResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Parse persisted content, migrating the legacy flat format and
    /// falling back to an empty document when nothing can be read.
    pub fn parse_lenient(source: &str, ids: &mut IdGenerator) -> Self {
        if source.trim().is_empty() {
            return FunnelContent::default();
        }

        let value: Value = match serde_json::from_str(source) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Malformed funnel content, loading an empty document");
                return FunnelContent::default();
            }
        };

        let is_legacy = value.get("sections").is_none() && value.get("blocks").is_some();
        let parsed = if is_legacy {
            serde_json::from_value::<LegacyContent>(value).map(|legacy| legacy::migrate(legacy, ids))
        } else {
            serde_json::from_value::<FunnelContent>(value)
        };

        parsed.unwrap_or_else(|e| {
            warn!(error = %e, "Malformed funnel content, loading an empty document");
            FunnelContent::default()
        })
    }

    pub fn to_json_string(&self) -> ModelResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Every block in the document, nested ones included, pre-order
    pub fn blocks(&self) -> Vec<&Block> {
        fn walk<'a>(blocks: &'a [Block], out: &mut Vec<&'a Block>) {
            for block in blocks {
                out.push(block);
                walk(block.children(), out);
            }
        }

        let mut out = Vec::new();
        for section in &self.sections {
            for column in &section.columns {
                walk(&column.blocks, &mut out);
            }
        }
        out
    }

    /// Every section, column and block id in the document
    pub fn all_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        for section in &self.sections {
            ids.push(section.id.clone());
            for column in &section.columns {
                ids.push(column.id.clone());
            }
        }
        ids.extend(self.blocks().into_iter().map(|b| b.id.clone()));
        ids
    }
}

/// The funnel document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Funnel {
    /// Absent until first persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub content: FunnelContent,

    #[serde(default)]
    pub settings: FunnelSettings,

    #[serde(default)]
    pub status: FunnelStatus,

    #[serde(default)]
    pub is_published: bool,
}

impl Funnel {
    /// Create an empty draft. Blank names fall back to "Untitled Funnel".
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let name = if name.trim().is_empty() {
            "Untitled Funnel".to_string()
        } else {
            name
        };

        Self {
            id: None,
            name,
            description: None,
            content: FunnelContent::default(),
            settings: FunnelSettings::default(),
            status: FunnelStatus::Draft,
            is_published: false,
        }
    }

    pub fn sections(&self) -> &[Section] {
        &self.content.sections
    }

    pub fn publish(&mut self) {
        self.status = FunnelStatus::Published;
        self.is_published = true;
    }

    pub fn unpublish(&mut self) {
        self.status = FunnelStatus::Draft;
        self.is_published = false;
    }

    pub fn archive(&mut self) {
        self.status = FunnelStatus::Archived;
        self.is_published = false;
    }

    /// Status and published flag agree
    pub fn is_consistent(&self) -> bool {
        (self.status == FunnelStatus::Published) == self.is_published
    }
}
