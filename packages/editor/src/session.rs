//! # Edit Session
//!
//! One user's editing context for one funnel: the document, its undo
//! history, the selection, drag state and the last rejection notice.
//! Constructed once per editing session and passed by reference to
//! whatever needs it.
//!
//! Every structural operation records exactly one history entry. Groups of
//! edits can be coalesced into one entry with [`EditSession::begin_edit`]
//! and [`EditSession::commit_edit`].

use chrono::{DateTime, Utc};
use funnel_model::{Block, BlockType, Funnel, FunnelSettings, IdGenerator, Section, SectionLayout, SectionSettings};
use funnel_rules::{validate_funnel, Rejection, StructureReport, ValidateOptions};
use tracing::{debug, info, warn};

use crate::config::EditorConfig;
use crate::document::Document;
use crate::history::History;
use crate::layout::{self, ColumnPatch};
use crate::persistence::{FunnelStore, StoreError, StoredFunnel};
use crate::tree::{BlockPatch, MoveSkip};
use crate::EditorError;

/// Selected section, column and block
///
/// Selecting an entity selects exactly its path: a block selects its
/// column and section, a column its section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub section_id: Option<String>,
    pub column_id: Option<String>,
    pub block_id: Option<String>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.section_id.is_none() && self.column_id.is_none() && self.block_id.is_none()
    }
}

/// Block currently being dragged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragState {
    pub block_id: String,

    /// Column the drag started from
    pub source_column_id: Option<String>,
}

/// Transient message shown after a refused edit
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

impl Notice {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Snapshot handed out by [`EditSession::begin_save`]
#[derive(Debug, Clone)]
pub struct SaveTicket {
    /// Document version the record was taken at
    pub version: u64,
    pub record: StoredFunnel,
}

pub struct EditSession {
    id: String,
    document: Document,
    history: History,
    selection: Selection,
    drag: Option<DragState>,
    ids: IdGenerator,
    config: EditorConfig,

    /// Open `begin_edit` calls
    batch_depth: usize,

    /// Document version captured by the newest history entry
    history_version: u64,

    notice: Option<Notice>,
}

impl EditSession {
    pub fn new(funnel: Funnel, config: EditorConfig) -> Self {
        let mut ids = IdGenerator::new(&funnel.name);
        if let Some(prefix) = &config.id_prefix {
            ids = ids.with_prefix(prefix.clone());
        }

        let id = ids.new_id("session");
        let history = History::with_limit(funnel.clone(), config.history_limit);
        debug!(session_id = %id, funnel = %funnel.name, "Edit session opened");

        Self {
            id,
            document: Document::new(funnel),
            history,
            selection: Selection::default(),
            drag: None,
            ids,
            config,
            batch_depth: 0,
            history_version: 0,
            notice: None,
        }
    }

    /// Open a persisted funnel; unreadable content gives an empty page
    pub fn from_stored(record: &StoredFunnel, config: EditorConfig) -> Self {
        let mut ids = IdGenerator::new(&record.name);
        let document = Document::from_stored(record, &mut ids);
        Self::new(document.funnel().clone(), config)
    }

    /// Load a funnel from a store. `None` when it does not exist.
    pub async fn open<S: FunnelStore + ?Sized>(
        store: &S,
        id: u64,
        config: EditorConfig,
    ) -> Result<Option<Self>, EditorError> {
        Ok(store
            .load(id)
            .await?
            .map(|record| Self::from_stored(&record, config)))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn funnel(&self) -> &Funnel {
        self.document.funnel()
    }

    pub fn sections(&self) -> &[Section] {
        self.document.sections()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn is_dirty(&self) -> bool {
        self.document.is_dirty()
    }

    pub fn find_block(&self, block_id: &str) -> Option<&Block> {
        layout::find_block(self.sections(), block_id)
    }

    // ── Sections and columns ──

    /// Add a section built from a layout template. Returns its id.
    pub fn add_section(&mut self, template: SectionLayout, index: Option<usize>) -> String {
        let section = layout::create_section(template, &mut self.ids);
        let section_id = section.id.clone();
        let next = layout::add_section(self.sections(), section, index);
        self.apply(next);
        self.select_section(&section_id);
        section_id
    }

    pub fn delete_section(&mut self, section_id: &str) -> bool {
        let next = layout::delete_section(self.sections(), section_id);
        self.apply(next)
    }

    pub fn update_section(&mut self, section_id: &str, settings: SectionSettings) -> bool {
        let next = layout::update_section(self.sections(), section_id, settings);
        self.apply(next)
    }

    /// Duplicate a section and select the copy
    pub fn duplicate_section(&mut self, section_id: &str) -> Option<String> {
        let (next, new_id) = layout::duplicate_section(self.document.sections(), section_id, &mut self.ids);
        let new_id = new_id?;
        self.apply(next);
        self.select_section(&new_id);
        Some(new_id)
    }

    pub fn move_section(&mut self, from: usize, to: usize) -> bool {
        let next = layout::move_section(self.sections(), from, to);
        self.apply(next)
    }

    pub fn set_section_layout(&mut self, section_id: &str, template: SectionLayout) -> bool {
        let next = layout::set_section_layout(self.document.sections(), section_id, template, &mut self.ids);
        self.apply(next)
    }

    pub fn add_column(&mut self, section_id: &str, width: f64) -> Option<String> {
        let (next, column_id) = layout::add_column(self.document.sections(), section_id, width, &mut self.ids);
        self.apply(next);
        column_id
    }

    pub fn delete_column(&mut self, column_id: &str) -> bool {
        let next = layout::delete_column(self.sections(), column_id);
        self.apply(next)
    }

    pub fn update_column(&mut self, column_id: &str, patch: &ColumnPatch) -> bool {
        let next = layout::update_column(self.sections(), column_id, patch);
        self.apply(next)
    }

    // ── Blocks ──

    /// Add a new block with default content to a column and select it.
    /// `Ok(None)` when the column does not exist.
    pub fn add_block(
        &mut self,
        column_id: &str,
        block_type: BlockType,
        index: Option<usize>,
    ) -> Result<Option<String>, Rejection> {
        let block = Block::new(self.ids.new_id(block_type.as_str()), block_type);
        let block_id = block.id.clone();

        if self.insert_block(column_id, block, index)? {
            self.select_block(&block_id);
            Ok(Some(block_id))
        } else {
            Ok(None)
        }
    }

    /// Add a prepared block to a column
    pub fn insert_block(&mut self, column_id: &str, block: Block, index: Option<usize>) -> Result<bool, Rejection> {
        match layout::add_block(self.sections(), column_id, block, index) {
            Ok(next) => Ok(self.apply(next)),
            Err(rejection) => Err(self.reject(rejection)),
        }
    }

    /// Add a new block with default content inside another block.
    /// `Ok(None)` when the parent does not exist.
    pub fn add_child_block(&mut self, parent_id: &str, block_type: BlockType) -> Result<Option<String>, Rejection> {
        let block = Block::new(self.ids.new_id(block_type.as_str()), block_type);
        let block_id = block.id.clone();

        let next = match layout::add_child_block(self.sections(), parent_id, block) {
            Ok(next) => next,
            Err(rejection) => return Err(self.reject(rejection)),
        };

        if self.apply(next) {
            self.select_block(&block_id);
            Ok(Some(block_id))
        } else {
            Ok(None)
        }
    }

    pub fn update_block(&mut self, block_id: &str, patch: &BlockPatch) -> bool {
        let next = layout::update_block(self.sections(), block_id, patch);
        self.apply(next)
    }

    pub fn delete_block(&mut self, block_id: &str) -> bool {
        let next = layout::delete_block(self.sections(), block_id);
        self.apply(next)
    }

    /// Duplicate a block's subtree and select the copy. `Ok(None)` when
    /// the block does not exist; a parent that cannot take another child
    /// of this type refuses.
    pub fn duplicate_block(&mut self, block_id: &str) -> Result<Option<String>, Rejection> {
        let (next, new_id) = match layout::duplicate_block(self.document.sections(), block_id, &mut self.ids) {
            Ok(duplicated) => duplicated,
            Err(rejection) => return Err(self.reject(rejection)),
        };
        let Some(new_id) = new_id else {
            return Ok(None);
        };
        self.apply(next);
        self.select_block(&new_id);
        Ok(Some(new_id))
    }

    /// Move a block into a column at `index`
    pub fn move_block(&mut self, block_id: &str, to_column_id: &str, index: Option<usize>) -> bool {
        let next = layout::move_block(self.sections(), block_id, to_column_id, index);
        self.apply(next)
    }

    /// Move a block under another block. Missing blocks and cycles are
    /// no-ops; a rule-table refusal is returned.
    pub fn move_block_to_parent(&mut self, block_id: &str, target_parent_id: &str) -> Result<bool, Rejection> {
        match layout::check_move_to_parent(self.sections(), block_id, target_parent_id) {
            Ok(()) => {
                let next = layout::move_block_to_parent(self.sections(), block_id, target_parent_id);
                Ok(self.apply(next))
            }
            Err(MoveSkip::Rejected(rejection)) => Err(self.reject(rejection)),
            Err(skip) => {
                debug!(block_id = %block_id, target = %target_parent_id, reason = ?skip, "Move skipped");
                Ok(false)
            }
        }
    }

    // ── Funnel fields ──

    pub fn rename(&mut self, name: &str) -> bool {
        let changed = self.document.set_name(name);
        self.after_edit(changed)
    }

    pub fn set_description(&mut self, description: Option<String>) -> bool {
        let changed = self.document.set_description(description);
        self.after_edit(changed)
    }

    pub fn set_settings(&mut self, settings: FunnelSettings) -> bool {
        let changed = self.document.set_settings(settings);
        self.after_edit(changed)
    }

    // ── History ──

    /// Open a batch; history entries are deferred until the matching
    /// [`EditSession::commit_edit`].
    pub fn begin_edit(&mut self) {
        self.batch_depth += 1;
    }

    /// Close a batch. Returns true if a history entry was recorded.
    pub fn commit_edit(&mut self) -> bool {
        self.batch_depth = self.batch_depth.saturating_sub(1);
        self.commit()
    }

    pub fn undo(&mut self) -> bool {
        self.close_batch();
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        self.restore(&snapshot);
        true
    }

    pub fn redo(&mut self) -> bool {
        self.close_batch();
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        self.restore(&snapshot);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ── Selection ──

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn select_section(&mut self, section_id: &str) -> bool {
        if !self.sections().iter().any(|s| s.id == section_id) {
            return false;
        }
        self.selection = Selection {
            section_id: Some(section_id.to_string()),
            column_id: None,
            block_id: None,
        };
        true
    }

    pub fn select_column(&mut self, column_id: &str) -> bool {
        let Some((s, _)) = layout::locate_column(self.sections(), column_id) else {
            return false;
        };
        self.selection = Selection {
            section_id: Some(self.sections()[s].id.clone()),
            column_id: Some(column_id.to_string()),
            block_id: None,
        };
        true
    }

    pub fn select_block(&mut self, block_id: &str) -> bool {
        let Some(location) = layout::locate_block(self.sections(), block_id) else {
            return false;
        };
        self.selection = Selection {
            section_id: Some(location.section_id),
            column_id: Some(location.column_id),
            block_id: Some(block_id.to_string()),
        };
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::default();
    }

    // ── Drag ──

    pub fn start_drag(&mut self, block_id: &str) -> bool {
        let Some(location) = layout::locate_block(self.sections(), block_id) else {
            return false;
        };
        self.drag = Some(DragState {
            block_id: block_id.to_string(),
            source_column_id: Some(location.column_id),
        });
        true
    }

    pub fn end_drag(&mut self) -> Option<DragState> {
        self.drag.take()
    }

    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    // ── Notices ──

    /// Current notice, unless it has expired
    pub fn notice(&self) -> Option<&Notice> {
        self.notice_at(Utc::now())
    }

    pub fn notice_at(&self, now: DateTime<Utc>) -> Option<&Notice> {
        self.notice.as_ref().filter(|notice| !notice.is_expired_at(now))
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    // ── Validation ──

    pub fn validate(&self, options: ValidateOptions) -> StructureReport {
        validate_funnel(&self.funnel().content, options)
    }

    // ── Saving ──

    pub fn to_stored(&self) -> Result<StoredFunnel, StoreError> {
        StoredFunnel::from_funnel(self.funnel())
    }

    /// Start a save. `None` while another save is still outstanding.
    pub fn begin_save(&mut self) -> Result<Option<SaveTicket>, StoreError> {
        if !self.document.start_save() {
            debug!(session_id = %self.id, "Save already in flight, skipped");
            return Ok(None);
        }

        match self.to_stored() {
            Ok(record) => Ok(Some(SaveTicket {
                version: self.document.version(),
                record,
            })),
            Err(e) => {
                self.document.fail_save();
                Err(e)
            }
        }
    }

    /// Record a successful save. The document is clean only if nothing
    /// changed since the ticket was taken.
    pub fn finish_save(&mut self, ticket: &SaveTicket, id: u64) {
        self.document.finish_save(ticket.version, id);
        info!(funnel_id = id, dirty = self.is_dirty(), "Funnel saved");
    }

    pub fn fail_save(&mut self, error: &StoreError) {
        self.document.fail_save();
        warn!(session_id = %self.id, error = %error, "Save failed, changes kept");
    }

    /// Save through `store`. `Ok(None)` when skipped because a save is in flight.
    pub async fn save<S: FunnelStore + ?Sized>(&mut self, store: &S) -> Result<Option<u64>, EditorError> {
        let Some(ticket) = self.begin_save()? else {
            return Ok(None);
        };

        match store.save(&ticket.record).await {
            Ok(id) => {
                self.finish_save(&ticket, id);
                Ok(Some(id))
            }
            Err(e) => {
                self.fail_save(&e);
                Err(e.into())
            }
        }
    }

    /// Save if needed, then publish through the store
    pub async fn publish<S: FunnelStore + ?Sized>(&mut self, store: &S) -> Result<(), EditorError> {
        self.set_published(store, true).await
    }

    pub async fn unpublish<S: FunnelStore + ?Sized>(&mut self, store: &S) -> Result<(), EditorError> {
        self.set_published(store, false).await
    }

    async fn set_published<S: FunnelStore + ?Sized>(&mut self, store: &S, published: bool) -> Result<(), EditorError> {
        if self.is_dirty() || self.funnel().id.is_none() {
            self.save(store).await?;
        }

        let id = self
            .funnel()
            .id
            .ok_or_else(|| StoreError::Unavailable("funnel has not been saved yet".to_string()))?;

        let record = if published {
            store.publish(id).await?
        } else {
            store.unpublish(id).await?
        };
        self.document.sync_publication(&record);
        info!(funnel_id = id, published, "Publication state updated");
        Ok(())
    }

    // ── Internals ──

    /// Swap in new sections and record history. Returns false when nothing changed.
    fn apply(&mut self, sections: Vec<Section>) -> bool {
        let changed = self.document.replace_sections(sections);
        self.after_edit(changed)
    }

    fn after_edit(&mut self, changed: bool) -> bool {
        if changed {
            self.refresh_selection();
            self.commit();
        }
        changed
    }

    /// Push a history entry unless a batch is open or nothing changed
    fn commit(&mut self) -> bool {
        if self.batch_depth > 0 || self.document.version() == self.history_version {
            return false;
        }
        self.history.push(self.document.funnel().clone());
        self.history_version = self.document.version();
        true
    }

    fn close_batch(&mut self) {
        if self.batch_depth > 0 {
            self.batch_depth = 0;
            self.commit();
        }
    }

    fn restore(&mut self, snapshot: &Funnel) {
        self.document.restore(snapshot);
        self.history_version = self.document.version();
        self.clear_selection();
        self.drag = None;
        debug!(index = self.history.current_index(), "History entry restored");
    }

    /// Drop selections of entities that no longer exist and re-derive the
    /// path of a selected block that moved
    fn refresh_selection(&mut self) {
        if let Some(block_id) = self.selection.block_id.clone() {
            if !self.select_block(&block_id) {
                self.selection.block_id = None;
            } else {
                return;
            }
        }

        if let Some(column_id) = self.selection.column_id.clone() {
            if !self.select_column(&column_id) {
                self.selection.column_id = None;
            } else {
                return;
            }
        }

        if let Some(section_id) = self.selection.section_id.clone() {
            if !self.select_section(&section_id) {
                self.selection.section_id = None;
            }
        }
    }

    fn reject(&mut self, rejection: Rejection) -> Rejection {
        debug!(session_id = %self.id, reason = %rejection, "Edit rejected");
        self.notice = Some(Notice {
            message: rejection.to_string(),
            expires_at: Utc::now() + self.config.notice_timeout(),
        });
        rejection
    }
}
