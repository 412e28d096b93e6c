//! Rule table and structural validator tests

use funnel_model::{Block, BlockType, Column, FunnelContent, Section, SectionLayout};
use funnel_rules::{
    can_add_child, get_allowed_children, get_rule, validate_block_structure,
    validate_block_structure_with, validate_funnel, ParentKind, Rejection, RuleRegistry,
    ValidateOptions,
};

fn parents() -> Vec<ParentKind> {
    let mut parents = vec![ParentKind::Section, ParentKind::Column];
    parents.extend(BlockType::ALL.iter().copied().map(ParentKind::Block));
    parents
}

#[test]
fn test_every_pair_outside_the_allow_list_is_refused() {
    for parent in parents() {
        let allowed = get_allowed_children(parent);
        for child in BlockType::ALL {
            let verdict = can_add_child(parent, child, &[]);
            if allowed.contains(&child) {
                assert!(verdict.is_ok(), "{} should accept {}", parent, child);
            } else {
                assert!(verdict.is_err(), "{} should refuse {}", parent, child);
            }
        }
    }
}

#[test]
fn test_every_allowed_pair_under_the_cap_is_accepted() {
    for parent in parents() {
        let Some(rule) = get_rule(parent) else {
            continue;
        };
        let below_cap = rule.max_children.map(|max| max - 1).unwrap_or(5);

        for &child in rule.allowed_children {
            let siblings: Vec<BlockType> = std::iter::repeat(BlockType::Text)
                .take(below_cap)
                .collect();
            assert!(
                can_add_child(parent, child, &siblings).is_ok(),
                "{} with {} children should accept {}",
                parent,
                below_cap,
                child
            );
        }
    }
}

#[test]
fn test_capped_parents_refuse_at_the_cap() {
    for parent in parents() {
        let Some(rule) = get_rule(parent) else {
            continue;
        };
        let (Some(max), Some(&child)) = (rule.max_children, rule.allowed_children.first()) else {
            continue;
        };

        let siblings = vec![BlockType::Image; max];
        let verdict = can_add_child(parent, child, &siblings);
        assert!(
            matches!(verdict, Err(Rejection::MaxChildren { .. })),
            "{} at {} children gave {:?}",
            parent,
            max,
            verdict
        );
    }
}

#[test]
fn test_spec_examples() {
    assert!(can_add_child(ParentKind::Block(BlockType::Form), BlockType::Button, &[]).is_ok());
    assert!(can_add_child(ParentKind::Block(BlockType::Tabs), BlockType::Text, &[]).is_ok());
    assert!(can_add_child(ParentKind::Block(BlockType::Spacer), BlockType::Text, &[]).is_err());

    let reason = can_add_child(
        ParentKind::Block(BlockType::Form),
        BlockType::Button,
        &[BlockType::Button],
    )
    .unwrap_err()
    .to_string();
    assert!(reason.contains("only have one button"));
}

fn nested_forest() -> Vec<Block> {
    vec![
        Block::new("container", BlockType::Container).with_children(vec![
            Block::new("text", BlockType::Text),
            Block::new("grid", BlockType::Grid),
        ]),
        Block::new("tabs", BlockType::Tabs),
        Block::new("spacer", BlockType::Spacer).with_children(vec![Block::new("img", BlockType::Image)]),
    ]
}

#[test]
fn test_block_structure_reports_each_violation() {
    let report = validate_block_structure(&nested_forest());

    assert!(!report.is_valid());
    assert_eq!(report.errors.len(), 2);
    assert!(report.warnings.is_empty());

    let targets: Vec<&str> = report
        .errors
        .iter()
        .filter_map(|d| d.target_id.as_deref())
        .collect();
    assert_eq!(targets, vec!["grid", "img"]);
}

#[test]
fn test_valid_forest_passes() {
    let forest = vec![Block::new("tabs", BlockType::Tabs).with_children(vec![
        Block::new("text", BlockType::Text),
        Block::new("c", BlockType::Container).with_children(vec![Block::new("b", BlockType::Button)]),
    ])];

    let report = validate_block_structure(&forest);
    assert!(report.is_valid());
    assert!(report.warnings.is_empty());
}

#[test]
fn test_sibling_counts_are_ignored_by_the_audit() {
    let children = (0..15)
        .map(|i| Block::new(format!("t{}", i), BlockType::Text))
        .collect();
    let forest = vec![Block::new("c", BlockType::Container).with_children(children)];

    assert!(validate_block_structure(&forest).is_valid());
}

#[test]
fn test_strict_rules_add_warnings() {
    let report = validate_block_structure_with(&nested_forest(), ValidateOptions::strict());

    assert_eq!(report.errors.len(), 2);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].target_id.as_deref(), Some("tabs"));
}

#[test]
fn test_empty_registry_reports_nothing() {
    let options = ValidateOptions {
        registry: Some(RuleRegistry::empty()),
    };
    assert!(validate_block_structure_with(&nested_forest(), options).is_valid());
}

#[test]
fn test_funnel_audit_covers_columns_and_widths() {
    let mut section = Section::new("s1", SectionLayout::TwoColumn);
    let mut left = Column::new("left", 50.0);
    left.blocks = nested_forest();
    section.columns.push(left);
    section.columns.push(Column::new("right", 30.0));

    let content = FunnelContent {
        sections: vec![section],
    };

    let report = validate_funnel(&content, ValidateOptions::default());
    assert_eq!(report.errors.len(), 2);
    assert!(report.warnings.is_empty());

    let strict = validate_funnel(&content, ValidateOptions::strict());
    assert_eq!(strict.errors.len(), 2);
    // Tabs without children plus the 80% section
    assert_eq!(strict.warnings.len(), 2);
}
