mod allowed_children;
mod column_widths;
mod min_children;
mod unique_ids;

pub use allowed_children::AllowedChildrenRule;
pub use column_widths::ColumnWidthsRule;
pub use min_children::MinChildrenRule;
pub use unique_ids::UniqueIdsRule;

use crate::diagnostic::Diagnostic;
use funnel_model::{Block, Column, FunnelContent, Section};

/// Trait for implementing structure audit rules
pub trait StructureRule {
    /// Unique identifier for this rule
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// Check one block. `parent` is `None` for the roots of a forest.
    fn check_block(&self, _parent: Option<&Block>, _block: &Block) -> Vec<Diagnostic> {
        Vec::new()
    }

    /// Check a column and its top-level blocks
    fn check_column(&self, _column: &Column) -> Vec<Diagnostic> {
        Vec::new()
    }

    /// Check a section and its columns
    fn check_section(&self, _section: &Section) -> Vec<Diagnostic> {
        Vec::new()
    }

    /// Check a bare block forest as a whole
    fn check_forest(&self, _forest: &[Block]) -> Vec<Diagnostic> {
        Vec::new()
    }

    /// Check a whole document
    fn check_document(&self, _content: &FunnelContent) -> Vec<Diagnostic> {
        Vec::new()
    }
}

/// Registry of structure rules
pub struct RuleRegistry {
    rules: Vec<Box<dyn StructureRule>>,
}

impl RuleRegistry {
    /// Create a registry with the default rule set (nesting rules only)
    pub fn new() -> Self {
        Self {
            rules: vec![Box::new(AllowedChildrenRule)],
        }
    }

    /// Create a registry with every built-in rule
    pub fn strict() -> Self {
        Self {
            rules: vec![
                Box::new(AllowedChildrenRule),
                Box::new(MinChildrenRule),
                Box::new(UniqueIdsRule),
                Box::new(ColumnWidthsRule::default()),
            ],
        }
    }

    /// Get all registered rules
    pub fn rules(&self) -> &[Box<dyn StructureRule>] {
        &self.rules
    }

    /// Create an empty registry
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a custom rule to the registry
    pub fn add_rule(&mut self, rule: Box<dyn StructureRule>) {
        self.rules.push(rule);
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &format!("{} rules", self.rules.len()))
            .finish()
    }
}
