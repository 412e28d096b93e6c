use super::StructureRule;
use crate::diagnostic::Diagnostic;
use crate::rule_table::{can_add_child, ParentKind};
use funnel_model::{Block, Column};

/// Every block must be a permitted child of its parent.
///
/// Sibling counts are ignored; this is a type audit, not a capacity check.
pub struct AllowedChildrenRule;

impl AllowedChildrenRule {
    fn check(&self, parent: ParentKind, parent_id: &str, block: &Block) -> Option<Diagnostic> {
        can_add_child(parent, block.block_type(), &[]).err().map(|rejection| {
            Diagnostic::error(
                self.name(),
                format!(
                    "Block '{}' ({}) cannot be placed in '{}' ({}): {}",
                    block.id,
                    block.block_type(),
                    parent_id,
                    parent,
                    rejection
                ),
            )
            .with_target(block.id.clone())
        })
    }
}

impl StructureRule for AllowedChildrenRule {
    fn name(&self) -> &'static str {
        "allowed-children"
    }

    fn description(&self) -> &'static str {
        "Blocks may only be nested inside parents that accept their type"
    }

    fn check_block(&self, parent: Option<&Block>, block: &Block) -> Vec<Diagnostic> {
        match parent {
            Some(parent) => self
                .check(ParentKind::Block(parent.block_type()), &parent.id, block)
                .into_iter()
                .collect(),
            None => Vec::new(),
        }
    }

    fn check_column(&self, column: &Column) -> Vec<Diagnostic> {
        column
            .blocks
            .iter()
            .filter_map(|block| self.check(ParentKind::Column, &column.id, block))
            .collect()
    }
}
