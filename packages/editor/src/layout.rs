//! # Section, Column and Block Operations
//!
//! Sections and columns are not blocks, so they get their own pure
//! operations over the section list. Block operations address a block by
//! id anywhere in the document; the column holding it is located first and
//! its block forest goes through the [`crate::tree`] engine.
//!
//! Same conventions as the tree engine: inputs are never modified, unknown
//! ids leave the document unchanged, and a rule-table refusal comes back as
//! `Err(Rejection)` with the document untouched.

use std::collections::HashSet;

use funnel_model::{Block, Column, ColumnSettings, IdGenerator, Section, SectionLayout, SectionSettings};
use funnel_rules::{can_add_child, ParentKind, Rejection};
use tracing::debug;

use crate::tree::{self, BlockPatch, MoveSkip};

/// Where a block lives in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLocation {
    pub section_id: String,
    pub column_id: String,

    /// Parent block, `None` when the block sits directly in the column
    pub parent_id: Option<String>,

    /// Position among its siblings
    pub index: usize,
}

/// Partial update for a column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnPatch {
    pub width: Option<f64>,
    pub settings: Option<ColumnSettings>,
}

/// Every section, column and block id in the document
pub fn document_ids(sections: &[Section]) -> HashSet<String> {
    let mut ids = HashSet::new();
    for section in sections {
        ids.insert(section.id.clone());
        for column in &section.columns {
            ids.insert(column.id.clone());
            ids.extend(tree::collect_ids(&column.blocks));
        }
    }
    ids
}

/// Build a section with the columns of its layout template
pub fn create_section(layout: SectionLayout, ids: &mut IdGenerator) -> Section {
    let mut section = Section::new(ids.new_id("section"), layout);
    section.columns = layout
        .column_widths()
        .into_iter()
        .map(|width| Column::new(ids.new_id("column"), width))
        .collect();
    section
}

/// Insert a section at `index`, or append when `None` or out of range
pub fn add_section(sections: &[Section], section: Section, index: Option<usize>) -> Vec<Section> {
    let mut next = sections.to_vec();
    let index = index.unwrap_or(next.len()).min(next.len());
    next.insert(index, section);
    next
}

pub fn delete_section(sections: &[Section], section_id: &str) -> Vec<Section> {
    sections
        .iter()
        .filter(|section| section.id != section_id)
        .cloned()
        .collect()
}

pub fn update_section(sections: &[Section], section_id: &str, settings: SectionSettings) -> Vec<Section> {
    let mut next = sections.to_vec();
    match next.iter_mut().find(|section| section.id == section_id) {
        Some(section) => section.settings = settings,
        None => debug!(section_id = %section_id, "Section not found, update skipped"),
    }
    next
}

/// Deep-copy a section with fresh ids everywhere and splice it after the original
pub fn duplicate_section(
    sections: &[Section],
    section_id: &str,
    ids: &mut IdGenerator,
) -> (Vec<Section>, Option<String>) {
    let Some(index) = sections.iter().position(|section| section.id == section_id) else {
        debug!(section_id = %section_id, "Section not found, duplicate skipped");
        return (sections.to_vec(), None);
    };

    let mut taken = document_ids(sections);
    let original = &sections[index];

    let copy = Section {
        id: ids.new_unique_id("section", &mut taken),
        layout: original.layout,
        settings: original.settings.clone(),
        columns: original
            .columns
            .iter()
            .map(|column| Column {
                id: ids.new_unique_id("column", &mut taken),
                width: column.width,
                settings: column.settings.clone(),
                blocks: column
                    .blocks
                    .iter()
                    .map(|block| tree::clone_with_fresh_ids(block, ids, &mut taken))
                    .collect(),
            })
            .collect(),
    };
    let new_id = copy.id.clone();

    let mut next = sections.to_vec();
    next.insert(index + 1, copy);
    (next, Some(new_id))
}

/// Reorder sections. An out-of-range `from` is a no-op; `to` is clamped.
pub fn move_section(sections: &[Section], from: usize, to: usize) -> Vec<Section> {
    let mut next = sections.to_vec();
    if from >= next.len() {
        debug!(from, len = next.len(), "Section index out of range, move skipped");
        return next;
    }

    let section = next.remove(from);
    let to = to.min(next.len());
    next.insert(to, section);
    next
}

/// Re-template a section's columns.
///
/// Existing columns are kept in order and resized; missing ones are
/// created. Blocks of columns beyond the new count go to the end of the
/// last remaining column.
pub fn set_section_layout(
    sections: &[Section],
    section_id: &str,
    layout: SectionLayout,
    ids: &mut IdGenerator,
) -> Vec<Section> {
    let mut next = sections.to_vec();
    let Some(section) = next.iter_mut().find(|section| section.id == section_id) else {
        debug!(section_id = %section_id, "Section not found, layout change skipped");
        return next;
    };

    let widths = layout.column_widths();
    let mut columns = std::mem::take(&mut section.columns);
    let overflow: Vec<Column> = if columns.len() > widths.len() {
        columns.split_off(widths.len())
    } else {
        Vec::new()
    };

    for (i, width) in widths.iter().enumerate() {
        match columns.get_mut(i) {
            Some(column) => column.width = *width,
            None => columns.push(Column::new(ids.new_id("column"), *width)),
        }
    }

    if let Some(last) = columns.last_mut() {
        for column in overflow {
            last.blocks.extend(column.blocks);
        }
    }

    section.layout = layout;
    section.columns = columns;
    next
}

/// Append a column to a section. Returns the new column id.
pub fn add_column(
    sections: &[Section],
    section_id: &str,
    width: f64,
    ids: &mut IdGenerator,
) -> (Vec<Section>, Option<String>) {
    let mut next = sections.to_vec();
    let Some(section) = next.iter_mut().find(|section| section.id == section_id) else {
        debug!(section_id = %section_id, "Section not found, column not added");
        return (next, None);
    };

    let column = Column::new(ids.new_id("column"), width);
    let column_id = column.id.clone();
    section.columns.push(column);
    (next, Some(column_id))
}

/// Remove a column and its blocks
pub fn delete_column(sections: &[Section], column_id: &str) -> Vec<Section> {
    let mut next = sections.to_vec();
    for section in &mut next {
        section.columns.retain(|column| column.id != column_id);
    }
    next
}

pub fn update_column(sections: &[Section], column_id: &str, patch: &ColumnPatch) -> Vec<Section> {
    edit_column(sections, column_id, |column| {
        if let Some(width) = patch.width {
            column.width = width.clamp(0.0, 100.0);
        }
        if let Some(settings) = &patch.settings {
            column.settings = settings.clone();
        }
    })
}

/// Insert a block into a column at `index` (appended when `None` or out of range)
pub fn add_block(
    sections: &[Section],
    column_id: &str,
    block: Block,
    index: Option<usize>,
) -> Result<Vec<Section>, Rejection> {
    let Some((s, c)) = locate_column(sections, column_id) else {
        debug!(column_id = %column_id, "Column not found, block not added");
        return Ok(sections.to_vec());
    };

    let column = &sections[s].columns[c];
    let siblings: Vec<_> = column.blocks.iter().map(Block::block_type).collect();
    can_add_child(ParentKind::Column, block.block_type(), &siblings)?;

    let mut next = sections.to_vec();
    let blocks = &mut next[s].columns[c].blocks;
    let index = index.unwrap_or(blocks.len()).min(blocks.len());
    blocks.insert(index, block);
    Ok(next)
}

/// Append a block to the children of another block
pub fn add_child_block(
    sections: &[Section],
    parent_id: &str,
    block: Block,
) -> Result<Vec<Section>, Rejection> {
    let Some(location) = locate_block(sections, parent_id) else {
        debug!(parent_id = %parent_id, "Parent block not found, child not added");
        return Ok(sections.to_vec());
    };
    let Some(parent) = block_ref(sections, &location.column_id, parent_id) else {
        return Ok(sections.to_vec());
    };

    can_add_child(
        ParentKind::Block(parent.block_type()),
        block.block_type(),
        &parent.child_types(),
    )?;

    Ok(edit_column(sections, &location.column_id, |column| {
        column.blocks = tree::insert_under_parent(&column.blocks, parent_id, block);
    }))
}

pub fn update_block(sections: &[Section], block_id: &str, patch: &BlockPatch) -> Vec<Section> {
    let Some(location) = locate_block(sections, block_id) else {
        debug!(block_id = %block_id, "Block not found, update skipped");
        return sections.to_vec();
    };

    edit_column(sections, &location.column_id, |column| {
        column.blocks = tree::update_by_id(&column.blocks, block_id, patch);
    })
}

pub fn delete_block(sections: &[Section], block_id: &str) -> Vec<Section> {
    let Some(location) = locate_block(sections, block_id) else {
        debug!(block_id = %block_id, "Block not found, delete skipped");
        return sections.to_vec();
    };

    edit_column(sections, &location.column_id, |column| {
        column.blocks = tree::delete_by_id(&column.blocks, block_id);
    })
}

/// Duplicate a block with fresh ids on its whole subtree.
///
/// The copy lands right after the original, both for blocks directly in
/// a column and for nested ones. The copy is one more child of the same
/// parent, so it goes through the rule table like any other insert.
pub fn duplicate_block(
    sections: &[Section],
    block_id: &str,
    ids: &mut IdGenerator,
) -> Result<(Vec<Section>, Option<String>), Rejection> {
    let Some(location) = locate_block(sections, block_id) else {
        debug!(block_id = %block_id, "Block not found, duplicate skipped");
        return Ok((sections.to_vec(), None));
    };
    let Some(original) = block_ref(sections, &location.column_id, block_id) else {
        return Ok((sections.to_vec(), None));
    };

    let (parent_kind, sibling_types) = match &location.parent_id {
        Some(parent_id) => match block_ref(sections, &location.column_id, parent_id) {
            Some(parent) => (ParentKind::Block(parent.block_type()), parent.child_types()),
            None => return Ok((sections.to_vec(), None)),
        },
        None => match locate_column(sections, &location.column_id) {
            Some((s, c)) => (
                ParentKind::Column,
                sections[s].columns[c].blocks.iter().map(Block::block_type).collect(),
            ),
            None => return Ok((sections.to_vec(), None)),
        },
    };
    can_add_child(parent_kind, original.block_type(), &sibling_types)?;

    let original = original.clone();
    let mut taken = document_ids(sections);
    let mut new_id = None;
    let next = edit_column(sections, &location.column_id, |column| {
        let copy = tree::clone_with_fresh_ids(&original, ids, &mut taken);
        let copy_id = copy.id.clone();

        let siblings = match &location.parent_id {
            Some(parent_id) => match tree::find_mut(&mut column.blocks, parent_id) {
                Some(parent) => parent.children.get_or_insert_with(Vec::new),
                None => return,
            },
            None => &mut column.blocks,
        };
        siblings.insert((location.index + 1).min(siblings.len()), copy);
        new_id = Some(copy_id);
    });
    Ok((next, new_id))
}

/// Move any block, top-level or nested, into a column at `index`
/// (appended when `None` or out of range).
pub fn move_block(
    sections: &[Section],
    block_id: &str,
    to_column_id: &str,
    index: Option<usize>,
) -> Vec<Section> {
    let Some(location) = locate_block(sections, block_id) else {
        debug!(block_id = %block_id, "Block not found, move skipped");
        return sections.to_vec();
    };
    let Some((ts, tc)) = locate_column(sections, to_column_id) else {
        debug!(column_id = %to_column_id, "Target column not found, move skipped");
        return sections.to_vec();
    };
    let Some(moving) = block_ref(sections, &location.column_id, block_id).cloned() else {
        return sections.to_vec();
    };

    let mut next = edit_column(sections, &location.column_id, |column| {
        column.blocks = tree::delete_by_id(&column.blocks, block_id);
    });

    let blocks = &mut next[ts].columns[tc].blocks;
    let index = index.unwrap_or(blocks.len()).min(blocks.len());
    blocks.insert(index, moving);
    next
}

/// Check whether [`move_block_to_parent`] would apply, and why not
pub fn check_move_to_parent(
    sections: &[Section],
    block_id: &str,
    target_parent_id: &str,
) -> Result<(), MoveSkip> {
    let source = locate_block(sections, block_id).ok_or(MoveSkip::BlockNotFound)?;
    let target = locate_block(sections, target_parent_id).ok_or(MoveSkip::TargetNotFound)?;

    if source.column_id == target.column_id {
        let (s, c) = locate_column(sections, &source.column_id).ok_or(MoveSkip::BlockNotFound)?;
        return tree::check_move(
            &sections[s].columns[c].blocks,
            block_id,
            source.parent_id.as_deref(),
            target_parent_id,
        );
    }

    let moving = block_ref(sections, &source.column_id, block_id).ok_or(MoveSkip::BlockNotFound)?;
    let parent = block_ref(sections, &target.column_id, target_parent_id).ok_or(MoveSkip::TargetNotFound)?;

    can_add_child(
        ParentKind::Block(parent.block_type()),
        moving.block_type(),
        &parent.child_types(),
    )
    .map_err(MoveSkip::Rejected)
}

/// Move a block under another block, possibly in a different column.
/// Refused or impossible moves leave the document unchanged.
pub fn move_block_to_parent(sections: &[Section], block_id: &str, target_parent_id: &str) -> Vec<Section> {
    if let Err(skip) = check_move_to_parent(sections, block_id, target_parent_id) {
        debug!(block_id = %block_id, target = %target_parent_id, reason = ?skip, "Move skipped");
        return sections.to_vec();
    }

    let (Some(source), Some(target)) = (
        locate_block(sections, block_id),
        locate_block(sections, target_parent_id),
    ) else {
        return sections.to_vec();
    };

    if source.column_id == target.column_id {
        return edit_column(sections, &source.column_id, |column| {
            column.blocks = tree::move_between_parents(
                &column.blocks,
                block_id,
                source.parent_id.as_deref(),
                target_parent_id,
            );
        });
    }

    let Some(moving) = block_ref(sections, &source.column_id, block_id).cloned() else {
        return sections.to_vec();
    };

    let next = edit_column(sections, &source.column_id, |column| {
        column.blocks = tree::delete_by_id(&column.blocks, block_id);
    });
    edit_column(&next, &target.column_id, |column| {
        column.blocks = tree::insert_under_parent(&column.blocks, target_parent_id, moving);
    })
}

/// (section index, column index) of a column
pub fn locate_column(sections: &[Section], column_id: &str) -> Option<(usize, usize)> {
    sections.iter().enumerate().find_map(|(s, section)| {
        section
            .columns
            .iter()
            .position(|column| column.id == column_id)
            .map(|c| (s, c))
    })
}

pub fn locate_block(sections: &[Section], block_id: &str) -> Option<BlockLocation> {
    for section in sections {
        for column in &section.columns {
            let Some(found) = tree::find_by_id(&column.blocks, block_id) else {
                continue;
            };
            let siblings = match found.parent {
                Some(parent) => parent.children(),
                None => column.blocks.as_slice(),
            };
            let index = siblings.iter().position(|b| b.id == block_id).unwrap_or(0);

            return Some(BlockLocation {
                section_id: section.id.clone(),
                column_id: column.id.clone(),
                parent_id: found.parent.map(|p| p.id.clone()),
                index,
            });
        }
    }
    None
}

/// Find a block by id
pub fn find_block<'a>(sections: &'a [Section], block_id: &str) -> Option<&'a Block> {
    sections
        .iter()
        .flat_map(|section| &section.columns)
        .find_map(|column| tree::find_by_id(&column.blocks, block_id).map(|found| found.node))
}

fn block_ref<'a>(sections: &'a [Section], column_id: &str, block_id: &str) -> Option<&'a Block> {
    let (s, c) = locate_column(sections, column_id)?;
    tree::find_by_id(&sections[s].columns[c].blocks, block_id).map(|found| found.node)
}

fn edit_column(sections: &[Section], column_id: &str, edit: impl FnOnce(&mut Column)) -> Vec<Section> {
    let mut next = sections.to_vec();
    match locate_column(&next, column_id) {
        Some((s, c)) => edit(&mut next[s].columns[c]),
        None => debug!(column_id = %column_id, "Column not found, edit skipped"),
    }
    next
}
