use super::StructureRule;
use crate::diagnostic::Diagnostic;
use crate::rule_table::{validate_min_children, ParentKind};
use funnel_model::Block;

/// Warn when a container holds fewer children than its rule asks for
pub struct MinChildrenRule;

impl StructureRule for MinChildrenRule {
    fn name(&self) -> &'static str {
        "min-children"
    }

    fn description(&self) -> &'static str {
        "Containers with a minimum child count should meet it"
    }

    fn check_block(&self, _parent: Option<&Block>, block: &Block) -> Vec<Diagnostic> {
        match validate_min_children(ParentKind::Block(block.block_type()), &block.child_types()) {
            Ok(()) => Vec::new(),
            Err(rejection) => vec![Diagnostic::warning(
                self.name(),
                format!("Block '{}': {}", block.id, rejection),
            )
            .with_target(block.id.clone())
            .with_suggestion(format!("Add content to the {}", block.block_type()))],
        }
    }
}
