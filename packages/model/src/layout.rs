//! # Sections and Columns
//!
//! A section is a horizontal band of the page; its columns hold the block
//! forests. Sections are created from a [`SectionLayout`] template that
//! fixes the initial column count and widths.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::block::Block;

/// Column template of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionLayout {
    #[serde(rename = "single")]
    Single,
    #[serde(rename = "two-column")]
    TwoColumn,
    #[serde(rename = "three-column")]
    ThreeColumn,
    #[serde(rename = "two-column-66-33")]
    TwoColumn66_33,
    #[serde(rename = "two-column-33-66")]
    TwoColumn33_66,
    #[serde(rename = "four-column")]
    FourColumn,
    #[serde(rename = "custom")]
    Custom,
}

impl SectionLayout {
    pub const ALL: [SectionLayout; 7] = [
        SectionLayout::Single,
        SectionLayout::TwoColumn,
        SectionLayout::ThreeColumn,
        SectionLayout::TwoColumn66_33,
        SectionLayout::TwoColumn33_66,
        SectionLayout::FourColumn,
        SectionLayout::Custom,
    ];

    /// Column widths (percent of the section) for this template
    pub fn column_widths(&self) -> Vec<f64> {
        match self {
            SectionLayout::Single | SectionLayout::Custom => vec![100.0],
            SectionLayout::TwoColumn => vec![50.0, 50.0],
            SectionLayout::ThreeColumn => vec![33.33, 33.33, 33.34],
            SectionLayout::TwoColumn66_33 => vec![66.67, 33.33],
            SectionLayout::TwoColumn33_66 => vec![33.33, 66.67],
            SectionLayout::FourColumn => vec![25.0, 25.0, 25.0, 25.0],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionLayout::Single => "single",
            SectionLayout::TwoColumn => "two-column",
            SectionLayout::ThreeColumn => "three-column",
            SectionLayout::TwoColumn66_33 => "two-column-66-33",
            SectionLayout::TwoColumn33_66 => "two-column-33-66",
            SectionLayout::FourColumn => "four-column",
            SectionLayout::Custom => "custom",
        }
    }
}

impl fmt::Display for SectionLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SectionLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionLayout::ALL
            .iter()
            .copied()
            .find(|layout| layout.as_str() == s)
            .ok_or_else(|| format!("Unknown section layout: {}", s))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SectionSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_height: Option<String>,

    pub full_width: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,

    pub vertical_align: VerticalAlign,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Vertical slot of a section holding a forest of blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "column")]
pub struct Column {
    pub id: String,

    /// Percentage of the parent section (0-100)
    pub width: f64,

    #[serde(default)]
    pub settings: ColumnSettings,

    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Column {
    pub fn new(id: impl Into<String>, width: f64) -> Self {
        Self {
            id: id.into(),
            width: width.clamp(0.0, 100.0),
            settings: ColumnSettings::default(),
            blocks: Vec::new(),
        }
    }

    /// Blocks in this column, nested ones included
    pub fn block_count(&self) -> usize {
        self.blocks.iter().map(Block::subtree_len).sum()
    }
}

/// Horizontal page band made of columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "section")]
pub struct Section {
    pub id: String,

    pub layout: SectionLayout,

    #[serde(default)]
    pub settings: SectionSettings,

    #[serde(default)]
    pub columns: Vec<Column>,
}

impl Section {
    pub fn new(id: impl Into<String>, layout: SectionLayout) -> Self {
        Self {
            id: id.into(),
            layout,
            settings: SectionSettings::default(),
            columns: Vec::new(),
        }
    }

    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    /// Sum of column widths
    pub fn total_width(&self) -> f64 {
        self.columns.iter().map(|c| c.width).sum()
    }

    pub fn block_count(&self) -> usize {
        self.columns.iter().map(Column::block_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_layout_templates_fill_the_section() {
        for layout in SectionLayout::ALL {
            let total: f64 = layout.column_widths().iter().sum();
            assert!((total - 100.0).abs() < 0.01, "{} sums to {}", layout, total);
        }
        assert_eq!(SectionLayout::FourColumn.column_widths().len(), 4);
    }

    #[test]
    fn test_layout_tags_use_kebab_names() {
        let value = serde_json::to_value(SectionLayout::TwoColumn66_33).unwrap();
        assert_eq!(value, json!("two-column-66-33"));
        assert_eq!(
            "two-column-33-66".parse::<SectionLayout>().unwrap(),
            SectionLayout::TwoColumn33_66
        );
    }

    #[test]
    fn test_section_serializes_with_type_tags() {
        let mut section = Section::new("section-1", SectionLayout::Single);
        section.columns.push(Column::new("column-1", 100.0));

        let value = serde_json::to_value(&section).unwrap();
        assert_eq!(value["type"], "section");
        assert_eq!(value["layout"], "single");
        assert_eq!(value["columns"][0]["type"], "column");
        assert_eq!(value["columns"][0]["width"], 100.0);
        assert_eq!(value["columns"][0]["settings"]["verticalAlign"], "top");
    }

    #[test]
    fn test_column_width_is_clamped() {
        assert_eq!(Column::new("c", 140.0).width, 100.0);
        assert_eq!(Column::new("c", -5.0).width, 0.0);
    }
}
