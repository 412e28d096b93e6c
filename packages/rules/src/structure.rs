use tracing::debug;

use crate::diagnostic::{Diagnostic, DiagnosticLevel};
use crate::rules::RuleRegistry;
use funnel_model::{Block, FunnelContent};

/// Options for configuring the structural validator
#[derive(Debug, Default)]
pub struct ValidateOptions {
    /// Custom rule registry (uses default if None)
    pub registry: Option<RuleRegistry>,
}

impl ValidateOptions {
    /// Every built-in rule, including the advisory ones
    pub fn strict() -> Self {
        Self {
            registry: Some(RuleRegistry::strict()),
        }
    }
}

/// Outcome of a structural audit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureReport {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl StructureReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error messages, in discovery order
    pub fn error_messages(&self) -> Vec<&str> {
        self.errors.iter().map(|d| d.message.as_str()).collect()
    }

    fn extend(&mut self, diagnostics: Vec<Diagnostic>) {
        for diagnostic in diagnostics {
            match diagnostic.level {
                DiagnosticLevel::Error => self.errors.push(diagnostic),
                DiagnosticLevel::Warning => self.warnings.push(diagnostic),
            }
        }
    }
}

/// Audit a block forest with the default rules.
///
/// Every node with a parent is checked against the parent's allow-list;
/// sibling counts are ignored. The default rules produce no warnings.
pub fn validate_block_structure(forest: &[Block]) -> StructureReport {
    validate_block_structure_with(forest, ValidateOptions::default())
}

/// Audit a block forest with a custom rule set
pub fn validate_block_structure_with(forest: &[Block], options: ValidateOptions) -> StructureReport {
    let registry = options.registry.unwrap_or_default();
    let mut report = StructureReport::default();

    for rule in registry.rules() {
        report.extend(rule.check_forest(forest));
    }

    for block in forest {
        walk_block(None, block, &registry, &mut report);
    }

    debug!(
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "Block structure validated"
    );
    report
}

/// Audit a whole document: sections, columns and every nested block
pub fn validate_funnel(content: &FunnelContent, options: ValidateOptions) -> StructureReport {
    let registry = options.registry.unwrap_or_default();
    let mut report = StructureReport::default();

    for rule in registry.rules() {
        report.extend(rule.check_document(content));
    }

    for section in &content.sections {
        for rule in registry.rules() {
            report.extend(rule.check_section(section));
        }

        for column in &section.columns {
            for rule in registry.rules() {
                report.extend(rule.check_column(column));
            }

            for block in &column.blocks {
                walk_block(None, block, &registry, &mut report);
            }
        }
    }

    debug!(
        sections = content.sections.len(),
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "Funnel structure validated"
    );
    report
}

/// Recursively check a block and its children
fn walk_block(
    parent: Option<&Block>,
    block: &Block,
    registry: &RuleRegistry,
    report: &mut StructureReport,
) {
    for rule in registry.rules() {
        report.extend(rule.check_block(parent, block));
    }

    for child in block.children() {
        walk_block(Some(block), child, registry, report);
    }
}
