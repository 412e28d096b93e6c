//! # Blocks
//!
//! A block is the unit of page content. Every block shares the same envelope
//! (id, settings, optional children); the payload is a typed [`BlockContent`]
//! whose variant determines the block's type.
//!
//! On the wire a block keeps the flat persisted shape:
//!
//! ```json
//! { "id": "text-1", "type": "text", "content": { "text": "Hi" }, "settings": {}, "children": [] }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::content::BlockContent;
use crate::error::ModelError;

/// Fixed enumeration of block types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Text,
    Image,
    Button,
    Form,
    Video,
    Code,
    Map,
    Testimonial,
    Calendar,
    Ecommerce,
    Team,
    Chart,
    Audio,
    Countdown,
    Social,
    Spacer,
    Container,
    Grid,
    Tabs,
    Accordion,
}

impl BlockType {
    /// Every block type, in library order
    pub const ALL: [BlockType; 20] = [
        BlockType::Text,
        BlockType::Image,
        BlockType::Button,
        BlockType::Form,
        BlockType::Video,
        BlockType::Code,
        BlockType::Map,
        BlockType::Testimonial,
        BlockType::Calendar,
        BlockType::Ecommerce,
        BlockType::Team,
        BlockType::Chart,
        BlockType::Audio,
        BlockType::Countdown,
        BlockType::Social,
        BlockType::Spacer,
        BlockType::Container,
        BlockType::Grid,
        BlockType::Tabs,
        BlockType::Accordion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Text => "text",
            BlockType::Image => "image",
            BlockType::Button => "button",
            BlockType::Form => "form",
            BlockType::Video => "video",
            BlockType::Code => "code",
            BlockType::Map => "map",
            BlockType::Testimonial => "testimonial",
            BlockType::Calendar => "calendar",
            BlockType::Ecommerce => "ecommerce",
            BlockType::Team => "team",
            BlockType::Chart => "chart",
            BlockType::Audio => "audio",
            BlockType::Countdown => "countdown",
            BlockType::Social => "social",
            BlockType::Spacer => "spacer",
            BlockType::Container => "container",
            BlockType::Grid => "grid",
            BlockType::Tabs => "tabs",
            BlockType::Accordion => "accordion",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ModelError::UnknownBlockType(s.to_string()))
    }
}

/// Entrance animation applied to a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Animation {
    FadeIn,
    SlideUp,
    SlideLeft,
    SlideRight,
    ZoomIn,
    Bounce,
}

/// Presentation settings shared by every block type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlockSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation: Option<Animation>,

    /// Settings this model does not know about, kept for round-trips
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A content block, possibly holding nested child blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBlock", into = "RawBlock")]
pub struct Block {
    pub id: String,
    pub content: BlockContent,
    pub settings: BlockSettings,
    pub children: Option<Vec<Block>>,
}

impl Block {
    /// Create a block of the given type with its library default content
    pub fn new(id: impl Into<String>, block_type: BlockType) -> Self {
        Self {
            id: id.into(),
            content: BlockContent::default_for(block_type),
            settings: BlockSettings::default(),
            children: None,
        }
    }

    pub fn with_content(id: impl Into<String>, content: BlockContent) -> Self {
        Self {
            id: id.into(),
            content,
            settings: BlockSettings::default(),
            children: None,
        }
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = Some(children);
        self
    }

    pub fn block_type(&self) -> BlockType {
        self.content.block_type()
    }

    /// Children as a slice (empty when absent)
    pub fn children(&self) -> &[Block] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Types of the direct children, in order
    pub fn child_types(&self) -> Vec<BlockType> {
        self.children().iter().map(Block::block_type).collect()
    }

    /// Number of blocks in this subtree, including this one
    pub fn subtree_len(&self) -> usize {
        1 + self.children().iter().map(Block::subtree_len).sum::<usize>()
    }

    /// Every id in this subtree, pre-order
    pub fn subtree_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids(&self, out: &mut Vec<String>) {
        out.push(self.id.clone());
        for child in self.children() {
            child.collect_ids(out);
        }
    }
}

/// Persisted block shape
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawBlock {
    id: String,

    #[serde(rename = "type")]
    block_type: BlockType,

    #[serde(default)]
    content: Value,

    #[serde(default)]
    settings: BlockSettings,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<Block>>,
}

impl From<RawBlock> for Block {
    fn from(raw: RawBlock) -> Self {
        let content = BlockContent::from_json(raw.block_type, raw.content).unwrap_or_else(|e| {
            warn!(block_id = %raw.id, error = %e, "Block content unreadable, using defaults");
            BlockContent::default_for(raw.block_type)
        });

        Self {
            id: raw.id,
            content,
            settings: raw.settings,
            children: raw.children,
        }
    }
}

impl From<Block> for RawBlock {
    fn from(block: Block) -> Self {
        Self {
            id: block.id,
            block_type: block.content.block_type(),
            content: block.content.to_json(),
            settings: block.settings,
            children: block.children,
        }
    }
}
