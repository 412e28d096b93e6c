//! # Tree Mutation Engine
//!
//! Pure operations over a forest of nested blocks.
//!
//! ## Semantics
//!
//! - Inputs are never modified; each operation returns a new forest.
//! - Unknown ids are not errors. Operations on a missing block, parent or
//!   target return the forest unchanged.
//! - [`insert_under_parent`] does not consult the rule table; callers check
//!   [`funnel_rules::can_add_child`] first. [`move_between_parents`] checks it
//!   itself and treats a refusal as a no-op.
//! - Duplicates get fresh ids on every node of the cloned subtree.

use std::collections::HashSet;

use funnel_model::{Block, BlockContent, BlockSettings, IdGenerator};
use funnel_rules::{can_add_child, ParentKind, Rejection};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Result of [`find_by_id`]
#[derive(Debug, Clone, PartialEq)]
pub struct Found<'a> {
    pub node: &'a Block,

    /// Immediate parent, `None` for top-level blocks
    pub parent: Option<&'a Block>,

    /// Ids from the root down to the node, inclusive
    pub path: Vec<String>,
}

/// How a patch changes a block's content
#[derive(Debug, Clone, PartialEq)]
pub enum ContentUpdate {
    /// Replace the content. Must keep the block's type.
    Replace(BlockContent),

    /// Shallow-merge JSON fields into the current content
    Merge(Map<String, Value>),
}

/// Partial update for [`update_by_id`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockPatch {
    pub content: Option<ContentUpdate>,
    pub settings: Option<BlockSettings>,

    /// Replaces the children when set; otherwise children are kept
    pub children: Option<Vec<Block>>,
}

impl BlockPatch {
    pub fn replace_content(content: impl Into<BlockContent>) -> Self {
        Self {
            content: Some(ContentUpdate::Replace(content.into())),
            ..Default::default()
        }
    }

    pub fn merge_content(fields: Map<String, Value>) -> Self {
        Self {
            content: Some(ContentUpdate::Merge(fields)),
            ..Default::default()
        }
    }

    /// Merge a single content field
    pub fn field(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut fields = Map::new();
        fields.insert(key.into(), value.into());
        Self::merge_content(fields)
    }

    pub fn settings(settings: BlockSettings) -> Self {
        Self {
            settings: Some(settings),
            ..Default::default()
        }
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = Some(children);
        self
    }

    /// Apply to a block in place
    pub(crate) fn apply_to(&self, block: &mut Block) {
        match &self.content {
            Some(ContentUpdate::Replace(content)) => {
                if content.block_type() == block.block_type() {
                    block.content = content.clone();
                } else {
                    warn!(
                        block_id = %block.id,
                        from = %block.block_type(),
                        to = %content.block_type(),
                        "Content replacement would change block type, ignored"
                    );
                }
            }
            Some(ContentUpdate::Merge(fields)) => block.content = block.content.merged(fields),
            None => {}
        }

        if let Some(settings) = &self.settings {
            block.settings = settings.clone();
        }

        if let Some(children) = &self.children {
            block.children = Some(children.clone());
        }
    }
}

/// Why a move was skipped
#[derive(Debug, Clone, PartialEq)]
pub enum MoveSkip {
    BlockNotFound,
    TargetNotFound,
    /// Declared source parent does not hold the block
    SourceMismatch,
    /// Target is the block itself or one of its descendants
    Cycle,
    Rejected(Rejection),
}

/// Depth-first search for a block by id
pub fn find_by_id<'a>(forest: &'a [Block], id: &str) -> Option<Found<'a>> {
    fn walk<'a>(
        nodes: &'a [Block],
        parent: Option<&'a Block>,
        id: &str,
        path: &mut Vec<String>,
    ) -> Option<Found<'a>> {
        for node in nodes {
            path.push(node.id.clone());

            if node.id == id {
                return Some(Found {
                    node,
                    parent,
                    path: path.clone(),
                });
            }

            if let Some(found) = walk(node.children(), Some(node), id, path) {
                return Some(found);
            }

            path.pop();
        }
        None
    }

    walk(forest, None, id, &mut Vec::new())
}

/// Mutable lookup used by the copy-then-edit operations
pub(crate) fn find_mut<'a>(nodes: &'a mut [Block], id: &str) -> Option<&'a mut Block> {
    for node in nodes.iter_mut() {
        if node.id == id {
            return Some(node);
        }
        if let Some(children) = node.children.as_mut() {
            if let Some(found) = find_mut(children, id) {
                return Some(found);
            }
        }
    }
    None
}

/// Append `new_node` to the children of `parent_id`
pub fn insert_under_parent(forest: &[Block], parent_id: &str, new_node: Block) -> Vec<Block> {
    let mut next = forest.to_vec();

    match find_mut(&mut next, parent_id) {
        Some(parent) => {
            parent.children.get_or_insert_with(Vec::new).push(new_node);
            next
        }
        None => {
            debug!(parent_id = %parent_id, "Parent not found, insert skipped");
            forest.to_vec()
        }
    }
}

/// Shallow-merge `patch` into the block with the given id
pub fn update_by_id(forest: &[Block], id: &str, patch: &BlockPatch) -> Vec<Block> {
    let mut next = forest.to_vec();

    match find_mut(&mut next, id) {
        Some(block) => patch.apply_to(block),
        None => debug!(block_id = %id, "Block not found, update skipped"),
    }

    next
}

/// Remove the block and its subtree wherever it appears
pub fn delete_by_id(forest: &[Block], id: &str) -> Vec<Block> {
    forest
        .iter()
        .filter(|block| block.id != id)
        .map(|block| Block {
            id: block.id.clone(),
            content: block.content.clone(),
            settings: block.settings.clone(),
            children: block.children.as_ref().map(|children| delete_by_id(children, id)),
        })
        .collect()
}

/// Check whether a move would be applied, and why not
pub fn check_move(
    forest: &[Block],
    block_id: &str,
    source_parent_id: Option<&str>,
    target_parent_id: &str,
) -> Result<(), MoveSkip> {
    let found = find_by_id(forest, block_id).ok_or(MoveSkip::BlockNotFound)?;
    let target = find_by_id(forest, target_parent_id).ok_or(MoveSkip::TargetNotFound)?;

    if found.parent.map(|p| p.id.as_str()) != source_parent_id {
        return Err(MoveSkip::SourceMismatch);
    }

    if target.path.iter().any(|id| id == block_id) {
        return Err(MoveSkip::Cycle);
    }

    let current: Vec<_> = target
        .node
        .children()
        .iter()
        .filter(|child| child.id != block_id)
        .map(Block::block_type)
        .collect();

    can_add_child(
        ParentKind::Block(target.node.block_type()),
        found.node.block_type(),
        &current,
    )
    .map_err(MoveSkip::Rejected)
}

/// Move a block from its source parent (or the top level when
/// `source_parent_id` is `None`) to the end of the target's children.
pub fn move_between_parents(
    forest: &[Block],
    block_id: &str,
    source_parent_id: Option<&str>,
    target_parent_id: &str,
) -> Vec<Block> {
    if let Err(skip) = check_move(forest, block_id, source_parent_id, target_parent_id) {
        debug!(block_id = %block_id, target = %target_parent_id, reason = ?skip, "Move skipped");
        return forest.to_vec();
    }

    let Some(moving) = find_by_id(forest, block_id).map(|found| found.node.clone()) else {
        return forest.to_vec();
    };

    let mut next = forest.to_vec();
    match source_parent_id {
        None => next.retain(|block| block.id != block_id),
        Some(source_id) => {
            if let Some(children) = find_mut(&mut next, source_id).and_then(|p| p.children.as_mut()) {
                children.retain(|block| block.id != block_id);
            }
        }
    }

    if let Some(target) = find_mut(&mut next, target_parent_id) {
        target.children.get_or_insert_with(Vec::new).push(moving);
    }

    next
}

/// Every id in the forest
pub fn collect_ids(forest: &[Block]) -> HashSet<String> {
    forest.iter().flat_map(Block::subtree_ids).collect()
}

/// Deep clone with a fresh id on every node; new ids are added to `taken`
pub fn clone_with_fresh_ids(
    block: &Block,
    ids: &mut IdGenerator,
    taken: &mut HashSet<String>,
) -> Block {
    Block {
        id: ids.new_unique_id(block.block_type().as_str(), taken),
        content: block.content.clone(),
        settings: block.settings.clone(),
        children: block.children.as_ref().map(|children| {
            children
                .iter()
                .map(|child| clone_with_fresh_ids(child, ids, taken))
                .collect()
        }),
    }
}

/// Duplicate a block's subtree.
///
/// A nested block's copy is placed right after it among its siblings; a
/// top-level block's copy is appended to the forest. Returns the new
/// forest and the copy's id (`None` when the block does not exist).
pub fn duplicate_block(
    forest: &[Block],
    block_id: &str,
    ids: &mut IdGenerator,
) -> (Vec<Block>, Option<String>) {
    let Some(found) = find_by_id(forest, block_id) else {
        debug!(block_id = %block_id, "Block not found, duplicate skipped");
        return (forest.to_vec(), None);
    };

    let mut taken = collect_ids(forest);
    let copy = clone_with_fresh_ids(found.node, ids, &mut taken);
    let new_id = copy.id.clone();
    let parent_id = found.parent.map(|p| p.id.clone());

    let mut next = forest.to_vec();
    match parent_id {
        None => next.push(copy),
        Some(parent_id) => {
            if let Some(parent) = find_mut(&mut next, &parent_id) {
                let children = parent.children.get_or_insert_with(Vec::new);
                let position = children
                    .iter()
                    .position(|child| child.id == block_id)
                    .map(|i| i + 1)
                    .unwrap_or(children.len());
                children.insert(position, copy);
            }
        }
    }

    (next, Some(new_id))
}

/// Number of nodes in the forest
pub fn count_nodes(forest: &[Block]) -> usize {
    forest.iter().map(Block::subtree_len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use funnel_model::BlockType;

    fn forest() -> Vec<Block> {
        vec![
            Block::new("c1", BlockType::Container).with_children(vec![
                Block::new("t1", BlockType::Text),
                Block::new("b1", BlockType::Button),
            ]),
            Block::new("t2", BlockType::Text),
        ]
    }

    #[test]
    fn test_find_reports_parent_and_path() {
        let forest = forest();
        let found = find_by_id(&forest, "b1").unwrap();

        assert_eq!(found.node.id, "b1");
        assert_eq!(found.parent.map(|p| p.id.as_str()), Some("c1"));
        assert_eq!(found.path, vec!["c1", "b1"]);

        let root = find_by_id(&forest, "t2").unwrap();
        assert!(root.parent.is_none());
        assert_eq!(root.path, vec!["t2"]);

        assert!(find_by_id(&forest, "nope").is_none());
    }

    #[test]
    fn test_insert_creates_child_list() {
        let forest = vec![Block::new("c", BlockType::Container)];
        let next = insert_under_parent(&forest, "c", Block::new("t", BlockType::Text));

        assert_eq!(next[0].children().len(), 1);
        assert!(forest[0].children.is_none());
    }

    #[test]
    fn test_update_keeps_children() {
        let forest = forest();
        let settings = BlockSettings {
            padding: Some("8px".to_string()),
            ..Default::default()
        };

        let next = update_by_id(&forest, "c1", &BlockPatch::settings(settings));
        assert_eq!(next[0].settings.padding.as_deref(), Some("8px"));
        assert_eq!(next[0].children().len(), 2);
    }

    #[test]
    fn test_update_rejects_type_change() {
        let forest = forest();
        let patch = BlockPatch::replace_content(BlockContent::default_for(BlockType::Image));

        let next = update_by_id(&forest, "t2", &patch);
        assert_eq!(next[1].block_type(), BlockType::Text);
    }

    #[test]
    fn test_merge_keeps_string_typed_numbers() {
        let forest = vec![Block::new("m", BlockType::Map)];

        let next = update_by_id(&forest, "m", &BlockPatch::field("zoom", "15"));
        assert_ne!(next, forest);
        assert_eq!(next[0].content.to_json()["zoom"], "15");
        assert_eq!(next[0].block_type(), BlockType::Map);
    }

    #[test]
    fn test_delete_removes_subtree() {
        let next = delete_by_id(&forest(), "c1");
        assert_eq!(count_nodes(&next), 1);
        assert!(find_by_id(&next, "t1").is_none());
    }

    #[test]
    fn test_move_refuses_cycles() {
        let forest = vec![Block::new("outer", BlockType::Tabs).with_children(vec![Block::new(
            "inner",
            BlockType::Container,
        )])];

        assert_eq!(
            check_move(&forest, "outer", None, "inner"),
            Err(MoveSkip::Cycle)
        );
        assert_eq!(move_between_parents(&forest, "outer", None, "inner"), forest);
    }

    #[test]
    fn test_move_requires_matching_source() {
        let forest = forest();
        assert_eq!(
            check_move(&forest, "t1", None, "c1"),
            Err(MoveSkip::SourceMismatch)
        );
    }
}
