//! Integration tests for editor crate

use std::sync::Arc;
use std::time::Duration;

use funnel_editor::{
    save_now, AutoSaver, EditSession, EditorConfig, FunnelStore, JsonFileStore, MemoryStore,
    SaveOutcome, StoredFunnel, ValidateOptions,
};
use funnel_model::{BlockType, Funnel, FunnelStatus, SectionLayout};
use funnel_rules::Rejection;
use tokio::sync::Mutex;

#[test]
fn test_two_column_scenario() {
    let mut session = EditSession::new(Funnel::new("Scenario"), EditorConfig::default());

    session.add_section(SectionLayout::TwoColumn, None);
    let section = &session.sections()[0];
    assert_eq!(section.columns.len(), 2);
    assert_eq!(section.columns[0].width, 50.0);
    assert_eq!(section.columns[1].width, 50.0);

    let left = section.columns[0].id.clone();
    let right = section.columns[1].id.clone();

    session.add_block(&left, BlockType::Text, None).unwrap();
    let container = session
        .add_block(&right, BlockType::Container, None)
        .unwrap()
        .unwrap();

    let refused = session.add_child_block(&container, BlockType::Grid);
    assert!(matches!(refused, Err(Rejection::NotAllowed { .. })));

    session.add_child_block(&container, BlockType::Text).unwrap().unwrap();

    let sections = session.sections();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].columns.len(), 2);
    assert_eq!(sections[0].columns[0].blocks.len(), 1);
    assert_eq!(sections[0].columns[1].blocks.len(), 1);
    assert_eq!(sections[0].columns[1].blocks[0].children().len(), 1);

    assert!(session.validate(ValidateOptions::default()).is_valid());
}

#[test]
fn test_history_is_bounded() {
    let mut session = EditSession::new(Funnel::new("Bounded"), EditorConfig::default());

    for _ in 0..60 {
        session.add_section(SectionLayout::Single, None);
    }

    let history = session.history();
    assert_eq!(history.len(), 50);
    assert_eq!(history.current_index(), 49);
    assert_eq!(history.current().sections().len(), 60);

    // The ten oldest states are gone
    while session.undo() {}
    assert_eq!(session.sections().len(), 11);
    assert!(!session.can_undo());
}

#[test]
fn test_history_limit_comes_from_config() {
    let config = EditorConfig {
        history_limit: 5,
        ..Default::default()
    };
    let mut session = EditSession::new(Funnel::new("Small"), config);

    for _ in 0..10 {
        session.add_section(SectionLayout::Single, None);
    }

    assert_eq!(session.history().len(), 5);
    while session.undo() {}
    assert_eq!(session.sections().len(), 6);
}

#[test]
fn test_duplicate_keeps_structure_with_fresh_ids() {
    let mut session = EditSession::new(Funnel::new("Copy"), EditorConfig::default());
    session.add_section(SectionLayout::Single, None);
    let column = session.sections()[0].columns[0].id.clone();
    let tabs = session.add_block(&column, BlockType::Tabs, None).unwrap().unwrap();
    session.add_child_block(&tabs, BlockType::Text).unwrap();
    session.add_child_block(&tabs, BlockType::Image).unwrap();

    let copy = session.duplicate_block(&tabs).unwrap().unwrap();

    let original = session.find_block(&tabs).unwrap().clone();
    let duplicate = session.find_block(&copy).unwrap().clone();
    assert_eq!(original.child_types(), duplicate.child_types());
    assert_eq!(original.content, duplicate.content);

    let original_ids = original.subtree_ids();
    assert!(duplicate.subtree_ids().iter().all(|id| !original_ids.contains(id)));

    let blocks = &session.sections()[0].columns[0].blocks;
    assert_eq!(blocks[0].id, tabs);
    assert_eq!(blocks[1].id, copy);
    assert_eq!(session.selection().block_id.as_deref(), Some(copy.as_str()));
}

#[test]
fn test_legacy_record_opens_as_single_section() {
    let record = StoredFunnel {
        id: Some(9),
        name: "Old page".to_string(),
        description: None,
        content: r#"{"blocks":[
            {"id":"b","type":"button","content":{"text":"Go","url":"/"},"position":{"x":0,"y":200}},
            {"id":"a","type":"text","content":{"text":"Hello"},"position":{"x":0,"y":10}}
        ]}"#
        .to_string(),
        settings: String::new(),
        status: FunnelStatus::Draft,
        is_published: false,
        updated_at: None,
    };

    let session = EditSession::from_stored(&record, EditorConfig::default());
    let sections = session.sections();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].layout, SectionLayout::Single);

    let order: Vec<&str> = sections[0].columns[0]
        .blocks
        .iter()
        .map(|block| block.id.as_str())
        .collect();
    assert_eq!(order, vec!["a", "b"]);
    assert_eq!(session.funnel().id, Some(9));
    assert!(!session.is_dirty());
}

#[tokio::test]
async fn test_save_and_reopen_through_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::open(dir.path()).await.unwrap();

    let mut session = EditSession::new(Funnel::new("Persisted"), EditorConfig::default());
    session.add_section(SectionLayout::ThreeColumn, None);
    let column = session.sections()[0].columns[2].id.clone();
    session.add_block(&column, BlockType::Countdown, None).unwrap();

    let id = session.save(&store).await.unwrap().unwrap();
    assert!(!session.is_dirty());

    let reopened = EditSession::open(&store, id, EditorConfig::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reopened.funnel().content, session.funnel().content);
    assert_eq!(reopened.funnel().name, "Persisted");

    assert!(EditSession::open(&store, 404, EditorConfig::default())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_publish_keeps_status_and_flag_together() {
    let store = MemoryStore::new();
    let mut session = EditSession::new(Funnel::new("Launch"), EditorConfig::default());
    session.add_section(SectionLayout::Single, None);

    session.publish(&store).await.unwrap();
    assert_eq!(session.funnel().status, FunnelStatus::Published);
    assert!(session.funnel().is_published);
    assert!(session.funnel().is_consistent());

    // Undo does not roll back publication
    session.undo();
    assert!(session.funnel().is_published);

    session.unpublish(&store).await.unwrap();
    let id = session.funnel().id.unwrap();
    let stored = store.load(id).await.unwrap().unwrap();
    assert_eq!(stored.status, FunnelStatus::Draft);
    assert!(!stored.is_published);
}

#[tokio::test(start_paused = true)]
async fn test_autosave_after_idle_period() {
    let config = EditorConfig::default();
    let session = Arc::new(Mutex::new(EditSession::new(Funnel::new("Auto"), config.clone())));
    let store = Arc::new(MemoryStore::new());
    let saver = AutoSaver::spawn(Arc::clone(&session), Arc::clone(&store), &config);

    session.lock().await.add_section(SectionLayout::Single, None);
    saver.touch();

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(store.is_empty().await, "debounce has not elapsed yet");

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(store.len().await, 1);
    assert!(!session.lock().await.is_dirty());

    assert_eq!(saver.shutdown().await.unwrap(), SaveOutcome::Clean);
}

#[tokio::test(start_paused = true)]
async fn test_autosave_periodic_tick() {
    let session = Arc::new(Mutex::new(EditSession::new(Funnel::new("Tick"), EditorConfig::default())));
    let store = Arc::new(MemoryStore::new());
    let saver = AutoSaver::spawn_with(
        Arc::clone(&session),
        Arc::clone(&store),
        Duration::from_secs(30),
        Duration::from_secs(2),
    );

    // Edit without reporting it: only the periodic save picks it up
    session.lock().await.rename("Ticked");
    tokio::time::sleep(Duration::from_secs(31)).await;

    assert_eq!(store.len().await, 1);
    saver.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_saves_dirty_document() {
    let session = Arc::new(Mutex::new(EditSession::new(Funnel::new("Bye"), EditorConfig::default())));
    let store = Arc::new(MemoryStore::new());
    let saver = AutoSaver::spawn(Arc::clone(&session), Arc::clone(&store), &EditorConfig::default());

    session.lock().await.rename("Unsaved");
    let outcome = saver.shutdown().await.unwrap();

    assert!(matches!(outcome, SaveOutcome::Saved(_)));
    assert_eq!(store.list().await.unwrap()[0].name, "Unsaved");
}

#[tokio::test]
async fn test_failed_autosave_is_retried() {
    let session = Mutex::new(EditSession::new(Funnel::new("Retry"), EditorConfig::default()));
    let store = MemoryStore::new();
    session.lock().await.rename("Pending");

    store.set_failing(true);
    assert!(save_now(&session, &store).await.is_err());
    assert!(session.lock().await.is_dirty());

    store.set_failing(false);
    assert!(matches!(save_now(&session, &store).await.unwrap(), SaveOutcome::Saved(_)));
    assert!(!session.lock().await.is_dirty());
}
