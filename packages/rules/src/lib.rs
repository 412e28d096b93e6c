//! # Funnel Rules
//!
//! Nesting rules for funnel content and the structural validator built on
//! them.
//!
//! - [`can_add_child`] is the gate every edit passes through before the tree
//!   is touched. It never panics; a refused edit comes back as a typed
//!   [`Rejection`] whose message is meant for the user.
//! - [`validate_block_structure`] and [`validate_funnel`] audit a whole forest
//!   or document with a [`RuleRegistry`].

mod diagnostic;
mod rule_table;
mod rules;
mod structure;

pub use diagnostic::{Diagnostic, DiagnosticLevel};
pub use rule_table::{
    can_add_child, can_add_child_named, get_allowed_children, get_rule, validate_min_children,
    ContainerRule, ParentKind, Rejection,
};
pub use rules::{
    AllowedChildrenRule, ColumnWidthsRule, MinChildrenRule, RuleRegistry, StructureRule,
    UniqueIdsRule,
};
pub use structure::{
    validate_block_structure, validate_block_structure_with, validate_funnel, StructureReport,
    ValidateOptions,
};
