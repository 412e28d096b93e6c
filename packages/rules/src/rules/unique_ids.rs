use std::collections::HashSet;

use super::StructureRule;
use crate::diagnostic::Diagnostic;
use funnel_model::{Block, FunnelContent};

/// Ids must be unique within a document
pub struct UniqueIdsRule;

impl UniqueIdsRule {
    fn report<I>(&self, ids: I) -> Vec<Diagnostic>
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut diagnostics = Vec::new();

        for id in ids {
            if !seen.insert(id.clone()) && reported.insert(id.clone()) {
                diagnostics.push(
                    Diagnostic::error(self.name(), format!("Id '{}' is used more than once", id))
                        .with_target(id)
                        .with_suggestion("Duplicate the element again to regenerate its ids"),
                );
            }
        }

        diagnostics
    }
}

impl StructureRule for UniqueIdsRule {
    fn name(&self) -> &'static str {
        "unique-ids"
    }

    fn description(&self) -> &'static str {
        "Section, column and block ids must not repeat"
    }

    fn check_forest(&self, forest: &[Block]) -> Vec<Diagnostic> {
        self.report(forest.iter().flat_map(Block::subtree_ids))
    }

    fn check_document(&self, content: &FunnelContent) -> Vec<Diagnostic> {
        self.report(content.all_ids())
    }
}
