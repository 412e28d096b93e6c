//! # Legacy Content Migration
//!
//! Early funnels stored a flat list of absolutely positioned blocks:
//!
//! ```json
//! { "blocks": [ { "id": "b1", "type": "text", "content": {}, "position": { "x": 0, "y": 40 } } ] }
//! ```
//!
//! Migration runs once at load time and produces a single-layout section
//! whose only column holds the blocks in reading order (top to bottom,
//! then left to right).

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::block::{Block, BlockSettings, BlockType};
use crate::content::BlockContent;
use crate::funnel::FunnelContent;
use crate::id_generator::IdGenerator;
use crate::layout::{Column, Section, SectionLayout};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyContent {
    pub blocks: Vec<LegacyBlock>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LegacyPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyBlock {
    pub id: String,

    #[serde(rename = "type")]
    pub block_type: String,

    #[serde(default)]
    pub content: Value,

    #[serde(default)]
    pub settings: BlockSettings,

    #[serde(default)]
    pub position: LegacyPosition,
}

/// Convert the flat legacy format into the canonical section tree
pub fn migrate(legacy: LegacyContent, ids: &mut IdGenerator) -> FunnelContent {
    let mut blocks = legacy.blocks;
    blocks.sort_by(|a, b| {
        a.position
            .y
            .total_cmp(&b.position.y)
            .then(a.position.x.total_cmp(&b.position.x))
    });

    let total = blocks.len();
    let mut column = Column::new(ids.new_id("column"), 100.0);

    column.blocks.extend(blocks.into_iter().filter_map(convert_block));

    info!(
        migrated = column.blocks.len(),
        skipped = total - column.blocks.len(),
        "Migrated legacy funnel content"
    );

    let mut section = Section::new(ids.new_id("section"), SectionLayout::Single);
    section.columns.push(column);

    FunnelContent {
        sections: vec![section],
    }
}

fn convert_block(legacy: LegacyBlock) -> Option<Block> {
    let block_type = match legacy.block_type.parse::<BlockType>() {
        Ok(block_type) => block_type,
        Err(e) => {
            warn!(block_id = %legacy.id, error = %e, "Dropping legacy block");
            return None;
        }
    };

    let content = BlockContent::from_json(block_type, legacy.content).unwrap_or_else(|e| {
        warn!(block_id = %legacy.id, error = %e, "Legacy content unreadable, using defaults");
        BlockContent::default_for(block_type)
    });

    Some(Block {
        id: legacy.id,
        content,
        settings: legacy.settings,
        children: None,
    })
}
