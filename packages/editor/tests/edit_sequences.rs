//! Tests for longer edit sequences through a session
//!
//! This tests:
//! - Move + delete chains with undo
//! - Branch discard after undo
//! - Batched edits
//! - Document integrity after operations

use funnel_editor::{BlockPatch, ColumnPatch, EditSession, EditorConfig, ValidateOptions};
use funnel_model::{BlockType, Funnel, SectionLayout};
use funnel_rules::Rejection;

fn session() -> EditSession {
    EditSession::new(Funnel::new("Sequence"), EditorConfig::default())
}

fn column_ids(session: &EditSession, section: usize) -> Vec<String> {
    session.sections()[section]
        .columns
        .iter()
        .map(|column| column.id.clone())
        .collect()
}

#[test]
fn test_move_then_delete_sequence() -> anyhow::Result<()> {
    let mut session = session();
    session.add_section(SectionLayout::TwoColumn, None);
    let columns = column_ids(&session, 0);

    let container = session.add_block(&columns[0], BlockType::Container, None)?.unwrap();
    let button = session.add_block(&columns[1], BlockType::Button, None)?.unwrap();

    // Move the button from the right column into the container
    assert!(session.move_block_to_parent(&button, &container)?);
    assert_eq!(session.find_block(&container).unwrap().children().len(), 1);
    assert!(session.sections()[0].columns[1].blocks.is_empty());

    // Deleting the container takes the button with it
    assert!(session.delete_block(&container));
    assert!(session.find_block(&button).is_none());

    // Undo delete restores both
    assert!(session.undo());
    assert!(session.find_block(&container).is_some());
    assert!(session.find_block(&button).is_some());

    // Undo move puts the button back in its column
    assert!(session.undo());
    assert_eq!(session.sections()[0].columns[1].blocks[0].id, button);
    Ok(())
}

#[test]
fn test_branch_discard() {
    let mut session = session();
    session.add_section(SectionLayout::Single, None);
    session.add_section(SectionLayout::TwoColumn, None);
    session.add_section(SectionLayout::ThreeColumn, None);

    assert!(session.undo());
    assert!(session.undo());
    assert!(session.can_redo());

    session.add_section(SectionLayout::FourColumn, None);
    assert!(!session.can_redo());
    assert!(!session.redo());

    let layouts: Vec<SectionLayout> = session.sections().iter().map(|s| s.layout).collect();
    assert_eq!(layouts, vec![SectionLayout::Single, SectionLayout::FourColumn]);
}

#[test]
fn test_undo_redo_boundaries() {
    let mut session = session();
    assert!(!session.can_undo());
    assert!(!session.undo());
    assert!(!session.can_redo());
    assert!(!session.redo());

    session.add_section(SectionLayout::Single, None);
    assert!(session.can_undo());
    assert!(!session.can_redo());

    session.undo();
    assert!(!session.can_undo());
    assert!(session.can_redo());
}

#[test]
fn test_batched_cosmetic_edits() -> anyhow::Result<()> {
    let mut session = session();
    session.add_section(SectionLayout::Single, None);
    let column = column_ids(&session, 0).remove(0);
    let text = session.add_block(&column, BlockType::Text, None)?.unwrap();
    let before = session.history().len();

    session.begin_edit();
    for word in ["H", "He", "Hel", "Hell", "Hello"] {
        session.update_block(&text, &BlockPatch::field("text", word));
    }
    assert_eq!(session.history().len(), before);
    assert!(session.commit_edit());
    assert_eq!(session.history().len(), before + 1);

    // One undo reverts the whole batch
    session.undo();
    let block = session.find_block(&text).unwrap();
    assert_eq!(block.content.to_json()["text"], "Enter your text here");
    Ok(())
}

#[test]
fn test_nested_batches_commit_at_outermost() {
    let mut session = session();
    let before = session.history().len();

    session.begin_edit();
    session.add_section(SectionLayout::Single, None);
    session.begin_edit();
    session.add_section(SectionLayout::Single, None);
    assert!(!session.commit_edit());
    assert_eq!(session.history().len(), before);

    assert!(session.commit_edit());
    assert_eq!(session.history().len(), before + 1);
}

#[test]
fn test_layout_change_and_column_edits() {
    let mut session = session();
    let section = session.add_section(SectionLayout::ThreeColumn, None);
    let columns = column_ids(&session, 0);
    session.add_block(&columns[2], BlockType::Image, None).unwrap();

    assert!(session.set_section_layout(&section, SectionLayout::TwoColumn66_33));
    let widths: Vec<f64> = session.sections()[0].columns.iter().map(|c| c.width).collect();
    assert_eq!(widths, vec![66.67, 33.33]);
    assert_eq!(session.sections()[0].columns[1].blocks.len(), 1);

    let added = session.add_column(&section, 10.0).unwrap();
    assert!(session.update_column(
        &added,
        &ColumnPatch {
            width: Some(15.0),
            ..Default::default()
        }
    ));
    let report = session.validate(ValidateOptions::strict());
    assert_eq!(report.warnings.len(), 1, "widths no longer add up to 100");

    assert!(session.delete_column(&added));
    assert!(session.validate(ValidateOptions::strict()).warnings.is_empty());
}

#[test]
fn test_selection_follows_moved_block() -> anyhow::Result<()> {
    let mut session = session();
    session.add_section(SectionLayout::Single, None);
    let lower = session.add_section(SectionLayout::Single, None);
    let top_column = column_ids(&session, 0).remove(0);
    let bottom_column = column_ids(&session, 1).remove(0);

    let text = session.add_block(&top_column, BlockType::Text, None)?.unwrap();
    assert!(session.move_block(&text, &bottom_column, Some(0)));

    let selection = session.selection();
    assert_eq!(selection.block_id.as_deref(), Some(text.as_str()));
    assert_eq!(selection.column_id.as_deref(), Some(bottom_column.as_str()));
    assert_eq!(selection.section_id.as_deref(), Some(lower.as_str()));

    assert!(session.delete_section(&lower));
    assert!(session.selection().is_empty());
    Ok(())
}

#[test]
fn test_document_integrity_after_complex_sequence() -> anyhow::Result<()> {
    let mut session = session();
    let first = session.add_section(SectionLayout::TwoColumn, None);
    let columns = column_ids(&session, 0);

    let tabs = session.add_block(&columns[0], BlockType::Tabs, None)?.unwrap();
    session.add_child_block(&tabs, BlockType::Text)?;
    let form = session.add_child_block(&tabs, BlockType::Form)?.unwrap();
    session.add_child_block(&form, BlockType::Button)?;
    session.add_block(&columns[1], BlockType::Video, None)?;

    let copy = session.duplicate_section(&first).unwrap();
    assert!(session.move_section(1, 0));
    assert_eq!(session.sections()[0].id, copy);

    let report = session.validate(ValidateOptions::strict());
    assert!(report.is_valid(), "{:?}", report.error_messages());
    assert!(report.warnings.is_empty());

    let ids = session.funnel().content.all_ids();
    let unique: std::collections::HashSet<_> = ids.iter().collect();
    assert_eq!(ids.len(), unique.len());
    Ok(())
}

#[test]
fn test_duplicating_a_form_button_is_refused() -> anyhow::Result<()> {
    let mut session = session();
    session.add_section(SectionLayout::Single, None);
    let column = column_ids(&session, 0).remove(0);
    let form = session.add_block(&column, BlockType::Form, None)?.unwrap();
    let button = session.add_child_block(&form, BlockType::Button)?.unwrap();
    let before = session.history().len();

    let refused = session.duplicate_block(&button);
    assert_eq!(refused, Err(Rejection::DuplicateFormButton));
    assert_eq!(session.find_block(&form).unwrap().child_types(), vec![BlockType::Button]);
    assert_eq!(session.history().len(), before);

    let notice = session.notice().unwrap();
    assert!(notice.message.contains("only have one button"));
    Ok(())
}

#[test]
fn test_duplicating_into_a_full_container_is_refused() -> anyhow::Result<()> {
    let mut session = session();
    session.add_section(SectionLayout::Single, None);
    let column = column_ids(&session, 0).remove(0);
    let container = session.add_block(&column, BlockType::Container, None)?.unwrap();

    let mut last = None;
    for _ in 0..9 {
        last = session.add_child_block(&container, BlockType::Text)?;
    }
    let last = last.unwrap();

    // Ninth child can still be copied, the tenth copy cannot
    let copy = session.duplicate_block(&last)?.unwrap();
    assert_eq!(session.find_block(&container).unwrap().children().len(), 10);

    assert!(matches!(
        session.duplicate_block(&copy),
        Err(Rejection::MaxChildren { max: 10, .. })
    ));
    assert_eq!(session.find_block(&container).unwrap().children().len(), 10);
    Ok(())
}

#[test]
fn test_string_typed_field_edit_is_applied() -> anyhow::Result<()> {
    let mut session = session();
    session.add_section(SectionLayout::Single, None);
    let column = column_ids(&session, 0).remove(0);
    let map = session.add_block(&column, BlockType::Map, None)?.unwrap();
    let before = session.history().len();

    assert!(session.update_block(&map, &BlockPatch::field("zoom", "15")));
    assert_eq!(session.find_block(&map).unwrap().content.to_json()["zoom"], "15");
    assert_eq!(session.history().len(), before + 1);
    Ok(())
}
